//! Mock implementations for unit testing without Telegram or MongoDB.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use teloxide::types::{ChatId, MessageId, Recipient, UserId};

use crate::errors::PlatformError;
use crate::platform::{ChatPlatform, MemberStatus, OutboundMedia, Reply};
use crate::store::{UserRecord, UserStore};

// ── MockPlatform ──────────────────────────────────────────────────────────────

/// One recorded Telegram call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformCall {
    MemberStatus { chat: String, user_id: UserId },
    SendDocument { chat: String, file_id: String, caption: String },
    SendMediaGroup { chat: String, items: Vec<OutboundMedia> },
    EditCaption { chat_id: ChatId, message_id: MessageId, caption: String },
    ApproveJoinRequest { chat: String, user_id: UserId },
    SendReply { chat_id: ChatId, reply_to: MessageId, reply: Reply },
}

struct MockPlatformState {
    calls: Vec<PlatformCall>,
    statuses: HashMap<(String, UserId), MemberStatus>,
    status_errors: HashMap<String, PlatformError>,
    approval_errors: HashMap<String, PlatformError>,
    send_error: Option<PlatformError>,
    edit_error: Option<PlatformError>,
    next_message_id: i32,
}

/// Records every call; unknown memberships answer `NotParticipant`.
#[derive(Clone)]
pub struct MockPlatform {
    state: Arc<Mutex<MockPlatformState>>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockPlatformState {
                calls: Vec::new(),
                statuses: HashMap::new(),
                status_errors: HashMap::new(),
                approval_errors: HashMap::new(),
                send_error: None,
                edit_error: None,
                next_message_id: 100,
            })),
        }
    }
}

pub fn recipient_key(chat: &Recipient) -> String {
    match chat {
        Recipient::Id(id) => id.0.to_string(),
        Recipient::ChannelUsername(name) => name.clone(),
    }
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn replies(&self) -> Vec<Reply> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                PlatformCall::SendReply { reply, .. } => Some(reply),
                _ => None,
            })
            .collect()
    }

    pub fn reply_texts(&self) -> Vec<String> {
        self.replies().into_iter().map(|r| r.text).collect()
    }

    /// Calls that publish to any chat other than a reply
    pub fn republish_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    PlatformCall::SendDocument { .. } | PlatformCall::SendMediaGroup { .. }
                )
            })
            .count()
    }

    pub fn set_status(&self, chat: &str, user_id: UserId, status: MemberStatus) {
        self.state
            .lock()
            .unwrap()
            .statuses
            .insert((chat.to_string(), user_id), status);
    }

    /// Every membership lookup in `chat` fails with `err`.
    pub fn fail_status(&self, chat: &str, err: PlatformError) {
        self.state
            .lock()
            .unwrap()
            .status_errors
            .insert(chat.to_string(), err);
    }

    pub fn fail_approval(&self, chat: &str, err: PlatformError) {
        self.state
            .lock()
            .unwrap()
            .approval_errors
            .insert(chat.to_string(), err);
    }

    /// Document and album sends fail with `err`.
    pub fn fail_sends(&self, err: PlatformError) {
        self.state.lock().unwrap().send_error = Some(err);
    }

    pub fn fail_edits(&self, err: PlatformError) {
        self.state.lock().unwrap().edit_error = Some(err);
    }

    pub fn set_next_message_id(&self, id: i32) {
        self.state.lock().unwrap().next_message_id = id;
    }

    fn record(&self, call: PlatformCall) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn next_id(&self) -> MessageId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_message_id;
        state.next_message_id += 1;
        MessageId(id)
    }
}

impl ChatPlatform for MockPlatform {
    async fn member_status(
        &self,
        chat: &Recipient,
        user_id: UserId,
    ) -> Result<MemberStatus, PlatformError> {
        let key = recipient_key(chat);
        self.record(PlatformCall::MemberStatus {
            chat: key.clone(),
            user_id,
        });

        let state = self.state.lock().unwrap();
        if let Some(err) = state.status_errors.get(&key) {
            return Err(err.clone());
        }
        state
            .statuses
            .get(&(key, user_id))
            .copied()
            .ok_or(PlatformError::NotParticipant)
    }

    async fn send_document(
        &self,
        chat: &Recipient,
        file_id: &str,
        caption: &str,
    ) -> Result<MessageId, PlatformError> {
        self.record(PlatformCall::SendDocument {
            chat: recipient_key(chat),
            file_id: file_id.to_string(),
            caption: caption.to_string(),
        });

        if let Some(err) = self.state.lock().unwrap().send_error.clone() {
            return Err(err);
        }
        Ok(self.next_id())
    }

    async fn send_media_group(
        &self,
        chat: &Recipient,
        items: &[OutboundMedia],
    ) -> Result<Vec<MessageId>, PlatformError> {
        self.record(PlatformCall::SendMediaGroup {
            chat: recipient_key(chat),
            items: items.to_vec(),
        });

        if let Some(err) = self.state.lock().unwrap().send_error.clone() {
            return Err(err);
        }
        Ok(items.iter().map(|_| self.next_id()).collect())
    }

    async fn edit_caption(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        caption: &str,
    ) -> Result<(), PlatformError> {
        self.record(PlatformCall::EditCaption {
            chat_id,
            message_id,
            caption: caption.to_string(),
        });

        match self.state.lock().unwrap().edit_error.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn approve_join_request(
        &self,
        chat: &Recipient,
        user_id: UserId,
    ) -> Result<(), PlatformError> {
        let key = recipient_key(chat);
        self.record(PlatformCall::ApproveJoinRequest {
            chat: key.clone(),
            user_id,
        });

        match self.state.lock().unwrap().approval_errors.get(&key) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn send_reply(
        &self,
        chat_id: ChatId,
        reply_to: MessageId,
        reply: &Reply,
    ) -> Result<(), PlatformError> {
        self.record(PlatformCall::SendReply {
            chat_id,
            reply_to,
            reply: reply.clone(),
        });
        Ok(())
    }
}

// ── InMemoryUserStore ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct MockStoreError(pub &'static str);

impl std::fmt::Display for MockStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for MockStoreError {}

/// Won't touch MongoDB; keyed by user id like the real collection.
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    records: Arc<Mutex<HashMap<i64, UserRecord>>>,
    fail_writes: Arc<Mutex<bool>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn record(&self, user_id: i64) -> Option<UserRecord> {
        self.records.lock().unwrap().get(&user_id).cloned()
    }

    pub fn fail_writes(&self) {
        *self.fail_writes.lock().unwrap() = true;
    }
}

impl UserStore for InMemoryUserStore {
    type Error = MockStoreError;

    async fn upsert(&self, record: &UserRecord) -> Result<(), MockStoreError> {
        if *self.fail_writes.lock().unwrap() {
            return Err(MockStoreError("write refused"));
        }
        self.records
            .lock()
            .unwrap()
            .insert(record.user_id, record.clone());
        Ok(())
    }
}

// ── Message fixtures ──────────────────────────────────────────────────────────

pub mod fixtures {
    use teloxide::types::{ChatId, MessageId, UserId};

    use crate::inbound::{IncomingMessage, Media, Sender};

    pub fn sender(user: u64) -> Sender {
        Sender {
            id: UserId(user),
            username: Some(format!("user{}", user)),
            first_name: format!("User {}", user),
            last_name: None,
        }
    }

    fn private(user: u64, message_id: i32, text: Option<&str>, media: Media) -> IncomingMessage {
        IncomingMessage {
            chat_id: ChatId(user as i64),
            message_id: MessageId(message_id),
            is_private: true,
            sender: Some(sender(user)),
            text: text.map(|t| t.to_string()),
            media,
            media_group_id: None,
            reply_to: None,
        }
    }

    pub fn private_text(user: u64, message_id: i32, text: &str) -> IncomingMessage {
        private(user, message_id, Some(text), Media::None)
    }

    pub fn document(user: u64, message_id: i32, file_id: &str) -> IncomingMessage {
        private(
            user,
            message_id,
            None,
            Media::Document {
                file_id: file_id.to_string(),
            },
        )
    }

    pub fn photo(user: u64, message_id: i32, file_id: &str) -> IncomingMessage {
        private(
            user,
            message_id,
            None,
            Media::Photo {
                file_id: file_id.to_string(),
            },
        )
    }

    pub fn in_group(mut msg: IncomingMessage, group_id: &str) -> IncomingMessage {
        msg.media_group_id = Some(group_id.to_string());
        msg
    }

    pub fn group_document(
        user: u64,
        message_id: i32,
        group_id: &str,
        file_id: &str,
    ) -> IncomingMessage {
        in_group(document(user, message_id, file_id), group_id)
    }

    pub fn group_photo(
        user: u64,
        message_id: i32,
        group_id: &str,
        file_id: &str,
    ) -> IncomingMessage {
        in_group(photo(user, message_id, file_id), group_id)
    }

    pub fn reply(mut msg: IncomingMessage, replied: IncomingMessage) -> IncomingMessage {
        msg.reply_to = Some(Box::new(replied));
        msg
    }

    /// Message from `user` in a non-private chat
    pub fn group_chat_text(
        chat_id: i64,
        user: u64,
        message_id: i32,
        text: &str,
    ) -> IncomingMessage {
        let mut msg = private_text(user, message_id, text);
        msg.chat_id = ChatId(chat_id);
        msg.is_private = false;
        msg
    }
}
