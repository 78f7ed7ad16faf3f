//! Message handlers for Telegram updates
//!
//! Every private message goes through [`MessagePipeline::handle_private`],
//! which evaluates the sender once and then runs each matching stage in
//! order: album recording, commands, subscription prompt, join approval and
//! the user record upsert. A failing stage is logged and the next one still
//! runs.


use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::Message;
use tracing::{debug, error, warn};

use crate::access::{AccessEvaluation, AccessGate};
use crate::approval::{approve_all, ApprovalOutcome, ChannelApproval};
use crate::caption::set_caption;
use crate::commands::Command;
use crate::health::AppState;
use crate::inbound::IncomingMessage;
use crate::media_group::MediaGroupIndex;
use crate::platform::{ChatPlatform, Reply, TelegramPlatform};
use crate::store::{MongoUserStore, UserRecord, UserStore};
use crate::upload::{upload_batch, upload_document, LogChannel};

pub const PRIVATE_ONLY: &str = "This bot only works in private messages.";
pub const CONTENT_RESTRICTED: &str = "You cannot save or forward this content.";

pub const OWNER_HELP: &str = "Owner Commands:\n\
/upload - Upload a file (reply to a document)\n\
/batch - Upload multiple files (reply to a media group)\n\
/caption - Set a custom caption (reply to a message)\n\
/help - Show this help message\n\
\n\
Note: Only you can upload and manage files.";

pub const USER_HELP: &str = "User Commands:\n\
/help - Show this help message\n\
To access files, you need to subscribe to our channels.";

/// What the pipeline did with one message
#[derive(Debug, Default)]
pub struct MessageReport {
    pub access: Option<AccessEvaluation>,
    pub approvals: Vec<ChannelApproval>,
    pub user_saved: bool,
}

pub struct MessagePipeline<P, S> {
    platform: P,
    store: S,
    gate: AccessGate,
    log_channel: LogChannel,
    media_groups: MediaGroupIndex,
    health: AppState,
}

/// Pipeline wired to Telegram and MongoDB
pub type BotPipeline = MessagePipeline<TelegramPlatform, MongoUserStore>;

impl<P: ChatPlatform, S: UserStore> MessagePipeline<P, S> {
    pub fn new(
        platform: P,
        store: S,
        gate: AccessGate,
        log_channel: LogChannel,
        media_groups: MediaGroupIndex,
        health: AppState,
    ) -> Self {
        Self {
            platform,
            store,
            gate,
            log_channel,
            media_groups,
            health,
        }
    }

    pub async fn handle_private(&self, msg: &IncomingMessage) -> MessageReport {
        self.health.increment_messages_received().await;

        let Some(sender) = msg.sender.as_ref() else {
            debug!("Ignoring message {} without sender", msg.message_id.0);
            return MessageReport::default();
        };

        self.media_groups.record(msg).await;

        let access = self.gate.evaluate(&self.platform, sender.id).await;

        if let Some(command) = msg.text.as_deref().and_then(Command::parse) {
            debug!("User {} sent {:?}", sender.id, command);
            self.run_command(command, &access, msg).await;
        }

        let subscribed = match access.is_subscribed() {
            Some(subscribed) => subscribed,
            None => {
                warn!(
                    "Subscription state of user {} unknown, skipping gate, approval and save",
                    sender.id
                );
                self.health.increment_errors().await;
                return MessageReport {
                    access: Some(access),
                    ..MessageReport::default()
                };
            }
        };

        self.restrict(subscribed, msg).await;

        let approvals = if subscribed {
            self.approve(&access).await
        } else {
            Vec::new()
        };

        let record = UserRecord::from_sender(sender, subscribed);
        let user_saved = match self.store.upsert(&record).await {
            Ok(()) => {
                self.health.increment_users_saved().await;
                self.health.set_store_connected(true).await;
                true
            }
            Err(e) => {
                error!("Failed to save user {}: {}", record.user_id, e);
                self.health.increment_errors().await;
                self.health.set_store_connected(false).await;
                false
            }
        };

        MessageReport {
            access: Some(access),
            approvals,
            user_saved,
        }
    }

    /// Refuse a bot command sent outside a private chat
    pub async fn handle_group_command(&self, msg: &IncomingMessage) {
        debug!("Refusing command in non-private chat {}", msg.chat_id);
        self.reply(msg, &Reply::text(PRIVATE_ONLY)).await;
    }

    async fn run_command(
        &self,
        command: Command,
        access: &AccessEvaluation,
        msg: &IncomingMessage,
    ) {
        match command {
            Command::Help => {
                let text = if access.is_owner { OWNER_HELP } else { USER_HELP };
                self.reply(msg, &Reply::text(text)).await;
            }
            Command::Upload => {
                match upload_document(&self.platform, access, &self.log_channel, msg).await {
                    Ok(reply) => {
                        self.health.increment_uploads().await;
                        self.reply(msg, &reply).await;
                    }
                    Err(e) => {
                        error!("Upload failed: {}", e);
                        self.health.increment_errors().await;
                    }
                }
            }
            Command::Batch => {
                match upload_batch(
                    &self.platform,
                    access,
                    &self.log_channel,
                    &self.media_groups,
                    msg,
                )
                .await
                {
                    Ok(reply) => {
                        self.health.increment_batches().await;
                        self.reply(msg, &reply).await;
                    }
                    Err(e) => {
                        error!("Batch upload failed: {}", e);
                        self.health.increment_errors().await;
                    }
                }
            }
            Command::Caption => match set_caption(&self.platform, access, msg).await {
                Ok(reply) => {
                    self.health.increment_captions().await;
                    self.reply(msg, &reply).await;
                }
                Err(e) => {
                    error!("Caption edit failed: {}", e);
                    self.health.increment_errors().await;
                }
            },
        }
    }

    /// Subscription prompt, or the advisory on media for subscribed users
    async fn restrict(&self, subscribed: bool, msg: &IncomingMessage) {
        if !subscribed {
            self.health.increment_subscription_prompts().await;
            self.reply(msg, &self.gate.subscribe_prompt()).await;
        } else if msg.media.is_document_or_photo() {
            self.reply(msg, &Reply::text(CONTENT_RESTRICTED)).await;
        }
    }

    async fn approve(&self, access: &AccessEvaluation) -> Vec<ChannelApproval> {
        let approvals = approve_all(&self.platform, self.gate.channels(), access.user_id).await;

        let approved = approvals
            .iter()
            .filter(|a| a.outcome == ApprovalOutcome::Approved)
            .count();
        if approved > 0 {
            self.health.add_approvals(approved as u64).await;
        }
        approvals
    }

    async fn reply(&self, msg: &IncomingMessage, reply: &Reply) {
        if let Err(e) = self
            .platform
            .send_reply(msg.chat_id, msg.message_id, reply)
            .await
        {
            error!("Failed to reply in chat {}: {}", msg.chat_id, e);
            self.health.increment_errors().await;
        }
    }
}

/// Handle any message in a private chat
pub async fn handle_private_message(
    msg: Message,
    pipeline: Arc<BotPipeline>,
) -> ResponseResult<()> {
    let incoming = IncomingMessage::from(&msg);
    let report = pipeline.handle_private(&incoming).await;

    debug!(
        "Message {} handled (subscribed: {:?}, saved: {}, approvals: {})",
        incoming.message_id.0,
        report.access.as_ref().and_then(|a| a.is_subscribed()),
        report.user_saved,
        report.approvals.len()
    );
    Ok(())
}

/// Handle a bot command in a group, supergroup or channel
pub async fn handle_group_command(msg: Message, pipeline: Arc<BotPipeline>) -> ResponseResult<()> {
    let incoming = IncomingMessage::from(&msg);
    pipeline.handle_group_command(&incoming).await;
    Ok(())
}

/// Bot command sent outside a private chat
pub fn is_group_command(msg: &Message) -> bool {
    !msg.chat.is_private() && msg.text().and_then(Command::parse).is_some()
}
