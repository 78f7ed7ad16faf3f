//! MongoDB-backed user store

use mongodb::bson::doc;
use mongodb::options::{IndexOptions, ReplaceOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use thiserror::Error;
use tracing::{debug, info};

use super::{UserRecord, UserStore};
use crate::config::StoreConfig;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

/// User records in one MongoDB collection
#[derive(Clone)]
pub struct MongoUserStore {
    db: Database,
    users: Collection<UserRecord>,
}

impl MongoUserStore {
    /// Connect and make sure `user_id` is uniquely indexed
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(&config.uri).await?;
        let db = client.database(&config.database);
        let users = db.collection::<UserRecord>(&config.collection);

        let store = Self { db, users };
        store.ensure_indexes().await?;

        info!(
            "User store ready: {}.{}",
            config.database, config.collection
        );
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users.create_index(index, None).await?;
        Ok(())
    }

    /// Round-trip to the server
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}

impl UserStore for MongoUserStore {
    type Error = StoreError;

    async fn upsert(&self, record: &UserRecord) -> Result<(), StoreError> {
        let options = ReplaceOptions::builder().upsert(true).build();
        let result = self
            .users
            .replace_one(doc! { "user_id": record.user_id }, record, options)
            .await?;

        debug!(
            "Saved user {} (matched: {}, upserted: {})",
            record.user_id,
            result.matched_count,
            result.upserted_id.is_some()
        );
        Ok(())
    }
}
