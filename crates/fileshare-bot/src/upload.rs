//! Owner uploads to the log channel
//!
//! `/upload` republishes one replied document, `/batch` republishes a whole
//! album. Both answer with `https://t.me/<log channel>/<message id>` links.

#[cfg(test)]
#[path = "upload_tests.rs"]
mod upload_tests;

use teloxide::types::{MessageId, Recipient};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::access::AccessEvaluation;
use crate::commands::command_argument;
use crate::config::chat_recipient;
use crate::errors::PlatformError;
use crate::inbound::{IncomingMessage, Media};
use crate::media_group::{GroupedMessage, MediaGroupIndex};
use crate::platform::{ChatPlatform, OutboundMedia, Reply};

pub const UPLOAD_DENIED: &str = "You are not authorized to upload files.";
pub const UPLOAD_USAGE: &str = "Please reply to a document with /upload to upload it.";
pub const BATCH_USAGE: &str = "Please reply to a media group with /batch to upload it.";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Failed to republish to log channel: {0}")]
    Republish(#[from] PlatformError),

    #[error("Media group {0} has no documents or photos")]
    EmptyBatch(String),

    #[error("Media group {0} is no longer indexed, its other messages are unknown")]
    UnknownGroup(String),
}

/// Channel that backs uploaded files
#[derive(Debug, Clone)]
pub struct LogChannel {
    /// Configured identifier, reproduced verbatim in links
    name: String,
    recipient: Recipient,
}

impl LogChannel {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let recipient = chat_recipient(&name);
        Self { name, recipient }
    }

    pub fn recipient(&self) -> &Recipient {
        &self.recipient
    }

    pub fn link(&self, message_id: MessageId) -> String {
        shareable_link(&self.name, message_id)
    }
}

pub fn shareable_link(log_channel: &str, message_id: MessageId) -> String {
    format!("https://t.me/{}/{}", log_channel, message_id.0)
}

/// Handle `/upload`. Denials and usage errors come back as replies; a failed
/// republish comes back as `Err` and the caller sends nothing.
pub async fn upload_document<P: ChatPlatform>(
    platform: &P,
    access: &AccessEvaluation,
    log_channel: &LogChannel,
    msg: &IncomingMessage,
) -> Result<Reply, UploadError> {
    if !access.is_owner {
        warn!("User {} tried /upload", access.user_id);
        return Ok(Reply::text(UPLOAD_DENIED));
    }

    let Some((source, file_id)) = msg.replied_document() else {
        return Ok(Reply::text(UPLOAD_USAGE));
    };

    let caption = command_argument(msg.text.as_deref().unwrap_or_default());
    debug!(
        "Republishing document from message {} with caption {:?}",
        source.message_id.0, caption
    );

    let sent = platform
        .send_document(log_channel.recipient(), file_id, &caption)
        .await?;
    let link = log_channel.link(sent);

    info!("Uploaded document as {}", link);
    Ok(Reply::text(format!("File uploaded successfully! Shareable link: {}", link)))
}

/// Handle `/batch` against the album the command replies to.
pub async fn upload_batch<P: ChatPlatform>(
    platform: &P,
    access: &AccessEvaluation,
    log_channel: &LogChannel,
    media_groups: &MediaGroupIndex,
    msg: &IncomingMessage,
) -> Result<Reply, UploadError> {
    if !access.is_owner {
        warn!("User {} tried /batch", access.user_id);
        return Ok(Reply::text(UPLOAD_DENIED));
    }

    let Some((source, group_id)) = msg.replied_media_group() else {
        return Ok(Reply::text(BATCH_USAGE));
    };

    let caption = command_argument(msg.text.as_deref().unwrap_or_default());
    let Some(messages) = media_groups.resolve_including(source).await else {
        return Err(UploadError::UnknownGroup(group_id.to_string()));
    };
    let items = build_batch(&messages, &caption);

    if items.is_empty() {
        return Err(UploadError::EmptyBatch(group_id.to_string()));
    }

    debug!(
        "Republishing {} of {} messages from media group {}",
        items.len(),
        messages.len(),
        group_id
    );

    let sent = platform
        .send_media_group(log_channel.recipient(), &items)
        .await?;
    let links: Vec<String> = sent.into_iter().map(|id| log_channel.link(id)).collect();

    info!("Uploaded media group {} as {} files", group_id, links.len());
    Ok(Reply::text(format!(
        "Files uploaded successfully! Shareable links: {}",
        links.join(", ")
    )))
}

/// Documents and photos of an album, each carrying `caption`
pub fn build_batch(messages: &[GroupedMessage], caption: &str) -> Vec<OutboundMedia> {
    messages
        .iter()
        .filter_map(|m| match &m.media {
            Media::Document { file_id } => Some(OutboundMedia::Document {
                file_id: file_id.clone(),
                caption: caption.to_string(),
            }),
            Media::Photo { file_id } => Some(OutboundMedia::Photo {
                file_id: file_id.clone(),
                caption: caption.to_string(),
            }),
            Media::None | Media::Other => None,
        })
        .collect()
}
