//! `/caption`: owner edits the caption of a replied message

use thiserror::Error;
use tracing::{info, warn};

use crate::access::AccessEvaluation;
use crate::commands::command_argument;
use crate::errors::PlatformError;
use crate::inbound::IncomingMessage;
use crate::platform::{ChatPlatform, Reply};

pub const CAPTION_DENIED: &str = "You are not authorized to set custom captions.";
pub const CAPTION_USAGE: &str = "Please reply to a message to set a custom caption.";
pub const CAPTION_UPDATED: &str = "Caption updated successfully!";

#[derive(Debug, Error)]
pub enum CaptionError {
    #[error("Failed to edit caption: {0}")]
    Edit(#[from] PlatformError),
}

pub async fn set_caption<P: ChatPlatform>(
    platform: &P,
    access: &AccessEvaluation,
    msg: &IncomingMessage,
) -> Result<Reply, CaptionError> {
    if !access.is_owner {
        warn!("User {} tried /caption", access.user_id);
        return Ok(Reply::text(CAPTION_DENIED));
    }

    let Some(target) = msg.reply_to.as_deref() else {
        return Ok(Reply::text(CAPTION_USAGE));
    };

    let caption = command_argument(msg.text.as_deref().unwrap_or_default());
    platform
        .edit_caption(target.chat_id, target.message_id, &caption)
        .await?;

    info!("Caption of message {} updated", target.message_id.0);
    Ok(Reply::text(CAPTION_UPDATED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::fixtures::{document, private_text, reply};
    use crate::mocks::{MockPlatform, PlatformCall};
    use teloxide::types::{ChatId, MessageId, UserId};

    fn access(user: u64, is_owner: bool) -> AccessEvaluation {
        AccessEvaluation {
            user_id: UserId(user),
            is_owner,
            subscription: Ok(true),
        }
    }

    #[tokio::test]
    async fn test_denied_for_non_owner() {
        let platform = MockPlatform::new();
        let msg = reply(private_text(2, 5, "/caption hi"), document(2, 4, "doc"));

        let reply = set_caption(&platform, &access(2, false), &msg).await.expect("reply");
        assert_eq!(reply.text, CAPTION_DENIED);
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_requires_reply() {
        let platform = MockPlatform::new();
        let msg = private_text(1, 5, "/caption hi");

        let reply = set_caption(&platform, &access(1, true), &msg).await.expect("reply");
        assert_eq!(reply.text, CAPTION_USAGE);
        assert!(platform.calls().is_empty());
    }

    #[tokio::test]
    async fn test_edits_replied_message() {
        let platform = MockPlatform::new();
        let msg = reply(private_text(1, 5, "/caption new words "), document(1, 4, "doc"));

        let reply = set_caption(&platform, &access(1, true), &msg).await.expect("reply");
        assert_eq!(reply.text, CAPTION_UPDATED);
        assert_eq!(
            platform.calls(),
            vec![PlatformCall::EditCaption {
                chat_id: ChatId(1),
                message_id: MessageId(4),
                caption: "new words ".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_edit_failure_is_an_error() {
        let platform = MockPlatform::new();
        platform.fail_edits(PlatformError::Api("MESSAGE_NOT_MODIFIED".to_string()));
        let msg = reply(private_text(1, 5, "/caption x"), document(1, 4, "doc"));

        let result = set_caption(&platform, &access(1, true), &msg).await;
        assert!(matches!(result, Err(CaptionError::Edit(PlatformError::Api(_)))));
    }
}
