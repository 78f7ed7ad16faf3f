//! Owner and force-subscription checks

use teloxide::types::UserId;
use tracing::{debug, warn};

use crate::config::ChannelRequirement;
use crate::errors::PlatformError;
use crate::platform::{ChatPlatform, LinkButton, Reply};

pub const SUBSCRIBE_PROMPT: &str = "You need to subscribe to our channels to use this bot.";

/// Owner identity plus the ordered channel requirements
#[derive(Debug, Clone)]
pub struct AccessGate {
    owner: UserId,
    channels: Vec<ChannelRequirement>,
}

/// Result of checking one sender, computed once per message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEvaluation {
    pub user_id: UserId,
    pub is_owner: bool,
    /// `Err` when a membership lookup failed for a reason other than
    /// "not a participant"
    pub subscription: Result<bool, PlatformError>,
}

impl AccessEvaluation {
    /// `None` when the subscription state could not be determined
    pub fn is_subscribed(&self) -> Option<bool> {
        self.subscription.as_ref().ok().copied()
    }
}

impl AccessGate {
    pub fn new(owner: UserId, channels: Vec<ChannelRequirement>) -> Self {
        Self { owner, channels }
    }

    pub fn is_owner(&self, user_id: UserId) -> bool {
        user_id == self.owner
    }

    pub fn channels(&self) -> &[ChannelRequirement] {
        &self.channels
    }

    /// `true` only when the user is a member of every channel.
    ///
    /// Stops at the first channel where the user is not a member; later
    /// channels are not queried.
    pub async fn check_subscription<P: ChatPlatform>(
        &self,
        platform: &P,
        user_id: UserId,
    ) -> Result<bool, PlatformError> {
        for channel in &self.channels {
            match platform.member_status(&channel.recipient(), user_id).await {
                Ok(status) if status.is_member() => {}
                Ok(status) => {
                    debug!("User {} not subscribed to {}: {:?}", user_id, channel.chat, status);
                    return Ok(false);
                }
                Err(PlatformError::NotParticipant) => {
                    debug!("User {} is not a participant of {}", user_id, channel.chat);
                    return Ok(false);
                }
                Err(e) => {
                    warn!(
                        "Membership lookup for user {} in {} failed: {}",
                        user_id, channel.chat, e
                    );
                    return Err(e);
                }
            }
        }
        Ok(true)
    }

    pub async fn evaluate<P: ChatPlatform>(
        &self,
        platform: &P,
        user_id: UserId,
    ) -> AccessEvaluation {
        AccessEvaluation {
            user_id,
            is_owner: self.is_owner(user_id),
            subscription: self.check_subscription(platform, user_id).await,
        }
    }

    /// Prompt with one "Subscribe to Channel N" button per requirement
    pub fn subscribe_prompt(&self) -> Reply {
        let buttons = self
            .channels
            .iter()
            .enumerate()
            .map(|(i, channel)| LinkButton {
                label: format!("Subscribe to Channel {}", i + 1),
                url: channel.invite_link.clone(),
            })
            .collect();

        Reply::text(SUBSCRIBE_PROMPT).with_buttons(buttons)
    }
}
