//! User record storage
//!
//! One record per user, keyed by Telegram user id and fully replaced on
//! every write.

mod mongo;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::inbound::Sender;

pub use mongo::MongoUserStore;

/// Stored snapshot of a user and their subscription state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub is_subscribed: bool,
}

impl UserRecord {
    pub fn from_sender(sender: &Sender, is_subscribed: bool) -> Self {
        Self {
            user_id: sender.id.0 as i64,
            username: sender.username.clone(),
            first_name: sender.first_name.clone(),
            last_name: sender.last_name.clone(),
            is_subscribed,
        }
    }
}

/// Persistence of user records.
pub trait UserStore: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Insert the record, or replace every field of the existing one.
    fn upsert(
        &self,
        record: &UserRecord,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
