//! Inbound message view
//!
//! Converts teloxide messages into the small, owned shape the rest of the
//! bot works on, so handlers and tests never touch `teloxide::types::Message`.

#[cfg(test)]
#[path = "inbound_tests.rs"]
mod inbound_tests;

use teloxide::types::{ChatId, Message, MessageId, UserId};

/// Sender identity fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: UserId,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

/// Attachment carried by a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Media {
    /// Plain message without an attachment
    None,
    Document { file_id: String },
    /// Photo, referenced by its largest size
    Photo { file_id: String },
    /// Video, audio, voice, sticker and the other kinds the bot never republishes
    Other,
}

impl Media {
    /// Document or photo
    pub fn is_document_or_photo(&self) -> bool {
        matches!(self, Media::Document { .. } | Media::Photo { .. })
    }
}

/// A message as seen by the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub is_private: bool,
    pub sender: Option<Sender>,
    pub text: Option<String>,
    pub media: Media,
    pub media_group_id: Option<String>,
    /// Replied-to message, one level deep
    pub reply_to: Option<Box<IncomingMessage>>,
}

impl IncomingMessage {
    /// Replied-to message when it carries a document
    pub fn replied_document(&self) -> Option<(&IncomingMessage, &str)> {
        let reply = self.reply_to.as_deref()?;
        match &reply.media {
            Media::Document { file_id } => Some((reply, file_id.as_str())),
            _ => None,
        }
    }

    /// Replied-to message when it belongs to a media group
    pub fn replied_media_group(&self) -> Option<(&IncomingMessage, &str)> {
        let reply = self.reply_to.as_deref()?;
        reply
            .media_group_id
            .as_deref()
            .map(|group_id| (reply, group_id))
    }
}

impl From<&Message> for IncomingMessage {
    fn from(msg: &Message) -> Self {
        convert_message(msg, true)
    }
}

fn convert_message(msg: &Message, with_reply: bool) -> IncomingMessage {
    let reply_to = if with_reply {
        msg.reply_to_message()
            .map(|reply| Box::new(convert_message(reply, false)))
    } else {
        None
    };

    IncomingMessage {
        chat_id: msg.chat.id,
        message_id: msg.id,
        is_private: msg.chat.is_private(),
        sender: msg.from.as_ref().map(tg_user_to_sender),
        text: msg.text().map(|t| t.to_string()),
        media: convert_media(msg),
        media_group_id: msg.media_group_id().map(|id| id.to_string()),
        reply_to,
    }
}

fn convert_media(msg: &Message) -> Media {
    if let Some(document) = msg.document() {
        return Media::Document {
            file_id: document.file.id.to_string(),
        };
    }

    if let Some(largest) = msg.photo().and_then(|sizes| sizes.last()) {
        return Media::Photo {
            file_id: largest.file.id.to_string(),
        };
    }

    if msg.video().is_some()
        || msg.audio().is_some()
        || msg.animation().is_some()
        || msg.voice().is_some()
        || msg.video_note().is_some()
        || msg.sticker().is_some()
    {
        return Media::Other;
    }

    Media::None
}

/// Convert teloxide User to our Sender type
pub(crate) fn tg_user_to_sender(user: &teloxide::types::User) -> Sender {
    Sender {
        id: user.id,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    }
}
