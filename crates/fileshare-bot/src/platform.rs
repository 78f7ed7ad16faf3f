//! Telegram calls the bot makes, behind a trait
//!
//! Handlers only see [`ChatPlatform`]; production wraps `teloxide::Bot`,
//! tests substitute the recording mock in `mocks.rs`.

use std::future::Future;

use teloxide::payloads::setters::*;
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, ChatMemberKind, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, InputMedia,
    InputMediaDocument, InputMediaPhoto, MessageId, Recipient, ReplyMarkup, ReplyParameters,
    UserId,
};
use tracing::{debug, warn};

use crate::errors::PlatformError;

/// Membership status of a user in a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Owner,
    Administrator,
    Member,
    Restricted { is_member: bool },
    Left,
    Banned,
}

impl MemberStatus {
    /// Owner, administrator, member, or restricted while still a member
    pub fn is_member(&self) -> bool {
        match self {
            MemberStatus::Owner | MemberStatus::Administrator | MemberStatus::Member => true,
            MemberStatus::Restricted { is_member } => *is_member,
            MemberStatus::Left | MemberStatus::Banned => false,
        }
    }
}

impl From<&ChatMemberKind> for MemberStatus {
    fn from(kind: &ChatMemberKind) -> Self {
        match kind {
            ChatMemberKind::Owner(_) => MemberStatus::Owner,
            ChatMemberKind::Administrator(_) => MemberStatus::Administrator,
            ChatMemberKind::Member => MemberStatus::Member,
            ChatMemberKind::Restricted(r) => MemberStatus::Restricted {
                is_member: r.is_member,
            },
            ChatMemberKind::Left => MemberStatus::Left,
            ChatMemberKind::Banned(_) => MemberStatus::Banned,
        }
    }
}

/// Item of a grouped send, caption included
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMedia {
    Document { file_id: String, caption: String },
    Photo { file_id: String, caption: String },
}

/// URL button attached under a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkButton {
    pub label: String,
    pub url: String,
}

/// Text reply, optionally with one URL button per row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub buttons: Vec<LinkButton>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            buttons: Vec::new(),
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<LinkButton>) -> Self {
        self.buttons = buttons;
        self
    }
}

/// Every Telegram call the bot depends on.
pub trait ChatPlatform: Send + Sync + 'static {
    /// Look up the status of `user_id` in `chat`.
    fn member_status(
        &self,
        chat: &Recipient,
        user_id: UserId,
    ) -> impl Future<Output = Result<MemberStatus, PlatformError>> + Send;

    /// Send a document by file id; returns the id of the new message.
    fn send_document(
        &self,
        chat: &Recipient,
        file_id: &str,
        caption: &str,
    ) -> impl Future<Output = Result<MessageId, PlatformError>> + Send;

    /// Send several items as one album; returns the new ids in album order.
    fn send_media_group(
        &self,
        chat: &Recipient,
        items: &[OutboundMedia],
    ) -> impl Future<Output = Result<Vec<MessageId>, PlatformError>> + Send;

    fn edit_caption(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        caption: &str,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    fn approve_join_request(
        &self,
        chat: &Recipient,
        user_id: UserId,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;

    /// Reply to `reply_to` in `chat_id`.
    fn send_reply(
        &self,
        chat_id: ChatId,
        reply_to: MessageId,
        reply: &Reply,
    ) -> impl Future<Output = Result<(), PlatformError>> + Send;
}

/// [`ChatPlatform`] backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramPlatform {
    bot: Bot,
}

impl TelegramPlatform {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

impl ChatPlatform for TelegramPlatform {
    async fn member_status(
        &self,
        chat: &Recipient,
        user_id: UserId,
    ) -> Result<MemberStatus, PlatformError> {
        let member = self.bot.get_chat_member(chat.clone(), user_id).await?;
        let status = MemberStatus::from(&member.kind);
        debug!("User {} in {:?}: {:?}", user_id, chat, status);
        Ok(status)
    }

    async fn send_document(
        &self,
        chat: &Recipient,
        file_id: &str,
        caption: &str,
    ) -> Result<MessageId, PlatformError> {
        let mut req = self
            .bot
            .send_document(chat.clone(), InputFile::file_id(file_id.to_string()));

        if !caption.is_empty() {
            req = req.caption(caption.to_string());
        }

        let sent = req.await?;
        Ok(sent.id)
    }

    async fn send_media_group(
        &self,
        chat: &Recipient,
        items: &[OutboundMedia],
    ) -> Result<Vec<MessageId>, PlatformError> {
        let media: Vec<InputMedia> = items.iter().map(to_input_media).collect();

        let sent = self.bot.send_media_group(chat.clone(), media).await?;
        Ok(sent.into_iter().map(|m| m.id).collect())
    }

    async fn edit_caption(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        caption: &str,
    ) -> Result<(), PlatformError> {
        self.bot
            .edit_message_caption(chat_id, message_id)
            .caption(caption.to_string())
            .await?;
        Ok(())
    }

    async fn approve_join_request(
        &self,
        chat: &Recipient,
        user_id: UserId,
    ) -> Result<(), PlatformError> {
        self.bot
            .approve_chat_join_request(chat.clone(), user_id)
            .await?;
        Ok(())
    }

    async fn send_reply(
        &self,
        chat_id: ChatId,
        reply_to: MessageId,
        reply: &Reply,
    ) -> Result<(), PlatformError> {
        let mut req = self
            .bot
            .send_message(chat_id, reply.text.clone())
            .reply_parameters(ReplyParameters::new(reply_to));

        if let Some(markup) = keyboard(&reply.buttons) {
            req = req.reply_markup(ReplyMarkup::InlineKeyboard(markup));
        }

        req.await?;
        Ok(())
    }
}

fn to_input_media(item: &OutboundMedia) -> InputMedia {
    match item {
        OutboundMedia::Document { file_id, caption } => {
            let mut m = InputMediaDocument::new(InputFile::file_id(file_id.clone()));
            if !caption.is_empty() {
                m.caption = Some(caption.clone());
            }
            InputMedia::Document(m)
        }
        OutboundMedia::Photo { file_id, caption } => {
            let mut m = InputMediaPhoto::new(InputFile::file_id(file_id.clone()));
            if !caption.is_empty() {
                m.caption = Some(caption.clone());
            }
            InputMedia::Photo(m)
        }
    }
}

/// One URL button per row; buttons with unparsable links are left out.
fn keyboard(buttons: &[LinkButton]) -> Option<InlineKeyboardMarkup> {
    if buttons.is_empty() {
        return None;
    }

    let rows: Vec<Vec<InlineKeyboardButton>> = buttons
        .iter()
        .filter_map(|b| match url::Url::parse(&b.url) {
            Ok(url) => Some(vec![InlineKeyboardButton::url(b.label.clone(), url)]),
            Err(e) => {
                warn!("Skipping button '{}' with invalid link '{}': {}", b.label, b.url, e);
                None
            }
        })
        .collect();

    Some(InlineKeyboardMarkup::new(rows))
}
