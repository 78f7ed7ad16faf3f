//! Join-request auto-approval for subscribed users

use teloxide::types::UserId;
use tracing::{debug, info, warn};

use crate::config::ChannelRequirement;
use crate::errors::PlatformError;
use crate::platform::ChatPlatform;

/// Result of approving one pending join request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    Approved,
    /// Nothing pending, or the user is already in the channel
    AlreadyApproved,
    Denied(String),
    TransientError(String),
}

impl From<Result<(), PlatformError>> for ApprovalOutcome {
    fn from(result: Result<(), PlatformError>) -> Self {
        match result {
            Ok(()) => ApprovalOutcome::Approved,
            Err(PlatformError::NoJoinRequest | PlatformError::AlreadyParticipant) => {
                ApprovalOutcome::AlreadyApproved
            }
            Err(PlatformError::Transient(reason)) => ApprovalOutcome::TransientError(reason),
            Err(other) => ApprovalOutcome::Denied(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelApproval {
    pub chat: String,
    pub outcome: ApprovalOutcome,
}

/// Approve `user_id` on every channel in order. A failure on one channel is
/// recorded and the next channel is still attempted.
pub async fn approve_all<P: ChatPlatform>(
    platform: &P,
    channels: &[ChannelRequirement],
    user_id: UserId,
) -> Vec<ChannelApproval> {
    let mut approvals = Vec::with_capacity(channels.len());

    for channel in channels {
        let result = platform
            .approve_join_request(&channel.recipient(), user_id)
            .await;
        let outcome = ApprovalOutcome::from(result);

        match &outcome {
            ApprovalOutcome::Approved => {
                info!("Approved join request of user {} in {}", user_id, channel.chat)
            }
            ApprovalOutcome::AlreadyApproved => {
                debug!("No pending join request of user {} in {}", user_id, channel.chat)
            }
            ApprovalOutcome::Denied(reason) => {
                warn!("Cannot approve user {} in {}: {}", user_id, channel.chat, reason)
            }
            ApprovalOutcome::TransientError(reason) => {
                warn!(
                    "Approval of user {} in {} failed, will retry on next message: {}",
                    user_id, channel.chat, reason
                )
            }
        }

        approvals.push(ChannelApproval {
            chat: channel.chat.clone(),
            outcome,
        });
    }

    approvals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockPlatform, PlatformCall};

    fn channels(chats: &[&str]) -> Vec<ChannelRequirement> {
        chats
            .iter()
            .map(|c| ChannelRequirement {
                chat: c.to_string(),
                invite_link: "https://t.me/+invite".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_outcome_mapping() {
        assert_eq!(ApprovalOutcome::from(Ok(())), ApprovalOutcome::Approved);
        assert_eq!(
            ApprovalOutcome::from(Err(PlatformError::NoJoinRequest)),
            ApprovalOutcome::AlreadyApproved
        );
        assert_eq!(
            ApprovalOutcome::from(Err(PlatformError::AlreadyParticipant)),
            ApprovalOutcome::AlreadyApproved
        );
        assert_eq!(
            ApprovalOutcome::from(Err(PlatformError::Transient("timeout".to_string()))),
            ApprovalOutcome::TransientError("timeout".to_string())
        );
        assert!(matches!(
            ApprovalOutcome::from(Err(PlatformError::Forbidden("admin required".to_string()))),
            ApprovalOutcome::Denied(_)
        ));
    }

    #[tokio::test]
    async fn test_failure_does_not_block_later_channels() {
        let platform = MockPlatform::new();
        platform.fail_approval("@a", PlatformError::Forbidden("admin required".to_string()));
        platform.fail_approval("@b", PlatformError::NoJoinRequest);

        let approvals = approve_all(&platform, &channels(&["@a", "@b", "@c"]), UserId(7)).await;

        let outcomes: Vec<&ApprovalOutcome> = approvals.iter().map(|a| &a.outcome).collect();
        assert!(matches!(outcomes[0], ApprovalOutcome::Denied(_)));
        assert_eq!(outcomes[1], &ApprovalOutcome::AlreadyApproved);
        assert_eq!(outcomes[2], &ApprovalOutcome::Approved);

        let attempted: Vec<String> = platform
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                PlatformCall::ApproveJoinRequest { chat, .. } => Some(chat),
                _ => None,
            })
            .collect();
        assert_eq!(attempted, vec!["@a", "@b", "@c"]);
    }

    #[tokio::test]
    async fn test_no_channels_no_calls() {
        let platform = MockPlatform::new();
        assert!(approve_all(&platform, &[], UserId(7)).await.is_empty());
        assert!(platform.calls().is_empty());
    }
}
