//! Telegram-specific error handling
//!
//! Converts teloxide errors into the small set of outcomes the bot
//! actually branches on: membership lookups, join-request approval and
//! everything else.

use teloxide::{ApiError, RequestError};
use thiserror::Error;
use tracing::debug;

/// Classified failure of a Telegram Bot API call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlatformError {
    /// The user has no membership record in the chat
    #[error("user is not a participant of the chat")]
    NotParticipant,
    /// There is no pending join request to approve
    #[error("no pending join request")]
    NoJoinRequest,
    /// The user is already a member of the chat
    #[error("user is already a participant of the chat")]
    AlreadyParticipant,
    /// The bot lacks the rights for the call, or cannot see the chat
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Network, I/O or flood-control failure
    #[error("transient failure: {0}")]
    Transient(String),
    /// Any other API error
    #[error("telegram API error: {0}")]
    Api(String),
}

impl From<RequestError> for PlatformError {
    fn from(err: RequestError) -> Self {
        classify(&err)
    }
}

/// Classify a `RequestError` into a [`PlatformError`].
pub fn classify(err: &RequestError) -> PlatformError {
    match err {
        // ── Flood control ────────────────────────────────────────────────────
        RequestError::RetryAfter(secs) => PlatformError::Transient(format!(
            "flood control, retry after {}s",
            secs.duration().as_secs().max(1)
        )),

        // ── Chat migration ───────────────────────────────────────────────────
        RequestError::MigrateToChatId(new_id) => {
            PlatformError::Api(format!("chat migrated to {}", new_id.0))
        }

        // ── Network / I/O ────────────────────────────────────────────────────
        RequestError::Network(_) | RequestError::Io(_) => {
            debug!("Transport error: {}", err);
            PlatformError::Transient(err.to_string())
        }

        // ── Invalid JSON ─────────────────────────────────────────────────────
        RequestError::InvalidJson { raw, .. } => {
            PlatformError::Transient(format!("invalid JSON response: {}", raw))
        }

        // ── Telegram API errors ──────────────────────────────────────────────
        RequestError::Api(api_err) => classify_api(api_err),

        #[allow(unreachable_patterns)]
        _ => PlatformError::Api(err.to_string()),
    }
}

/// Classify the API error part of a failed request.
pub fn classify_api(api_err: &ApiError) -> PlatformError {
    match api_err {
        ApiError::UserNotFound => PlatformError::NotParticipant,

        ApiError::ChatNotFound
        | ApiError::BotBlocked
        | ApiError::BotKicked
        | ApiError::BotKickedFromSupergroup
        | ApiError::NotEnoughRightsToRestrict
        | ApiError::NotEnoughRightsToPostMessages
        | ApiError::MethodNotAvailableInPrivateChats => {
            PlatformError::Forbidden(api_err.to_string())
        }

        ApiError::Unknown(raw) => classify_description(raw),

        _ => PlatformError::Api(api_err.to_string()),
    }
}

/// Errors teloxide has no dedicated variant for arrive as raw descriptions.
fn classify_description(raw: &str) -> PlatformError {
    let upper = raw.to_ascii_uppercase();

    if upper.contains("USER_NOT_PARTICIPANT") || upper.contains("PARTICIPANT_ID_INVALID") {
        PlatformError::NotParticipant
    } else if upper.contains("HIDE_REQUESTER_MISSING") {
        PlatformError::NoJoinRequest
    } else if upper.contains("USER_ALREADY_PARTICIPANT") {
        PlatformError::AlreadyParticipant
    } else if upper.contains("CHAT_ADMIN_REQUIRED")
        || upper.contains("NOT ENOUGH RIGHTS")
        || upper.contains("BOT WAS KICKED")
    {
        PlatformError::Forbidden(raw.to_string())
    } else {
        PlatformError::Api(raw.to_string())
    }
}
