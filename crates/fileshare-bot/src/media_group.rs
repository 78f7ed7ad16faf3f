//! Media group index
//!
//! The Bot API delivers an album as separate messages sharing a
//! `media_group_id` and offers no call to fetch the album later, so the bot
//! remembers the grouped messages it receives in each chat.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use teloxide::types::{ChatId, MessageId};
use tokio::sync::RwLock;
use tracing::debug;

use crate::inbound::{IncomingMessage, Media};

/// One message of an album
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedMessage {
    pub message_id: MessageId,
    pub media: Media,
}

#[derive(Debug)]
struct GroupEntry {
    messages: Vec<GroupedMessage>,
    last_seen: Instant,
}

type GroupKey = (ChatId, String);

/// Albums seen per chat, pruned by age and capped in count
#[derive(Clone)]
pub struct MediaGroupIndex {
    groups: Arc<RwLock<HashMap<GroupKey, GroupEntry>>>,
    ttl: Duration,
    capacity: usize,
}

impl MediaGroupIndex {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            groups: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Remember `msg` when it belongs to a media group. Returns `false` for
    /// messages outside any group and for ids already recorded.
    pub async fn record(&self, msg: &IncomingMessage) -> bool {
        self.record_at(msg, Instant::now()).await
    }

    pub(crate) async fn record_at(&self, msg: &IncomingMessage, now: Instant) -> bool {
        let Some(group_id) = msg.media_group_id.as_ref() else {
            return false;
        };

        let mut groups = self.groups.write().await;
        let ttl = self.ttl;
        groups.retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= ttl);

        let key = (msg.chat_id, group_id.clone());
        if !groups.contains_key(&key) && groups.len() >= self.capacity {
            let oldest = groups
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                debug!("Evicting media group {} from chat {}", oldest.1, oldest.0);
                groups.remove(&oldest);
            }
        }

        let entry = groups.entry(key).or_insert_with(|| GroupEntry {
            messages: Vec::new(),
            last_seen: now,
        });
        entry.last_seen = now;

        if entry.messages.iter().any(|m| m.message_id == msg.message_id) {
            return false;
        }

        entry.messages.push(GroupedMessage {
            message_id: msg.message_id,
            media: msg.media.clone(),
        });
        entry.messages.sort_by_key(|m| m.message_id.0);

        debug!(
            "Recorded message {} in media group {} ({} so far)",
            msg.message_id.0,
            group_id,
            entry.messages.len()
        );
        true
    }

    /// Messages of an album in message-id order, `None` when not indexed
    pub async fn resolve(&self, chat_id: ChatId, group_id: &str) -> Option<Vec<GroupedMessage>> {
        let groups = self.groups.read().await;
        groups
            .get(&(chat_id, group_id.to_string()))
            .map(|entry| entry.messages.clone())
    }

    /// Album of `source`, always containing `source` itself.
    ///
    /// `None` when the group is not indexed (expired, evicted, or seen before
    /// a restart); the rest of the album cannot be recovered then.
    pub async fn resolve_including(
        &self,
        source: &IncomingMessage,
    ) -> Option<Vec<GroupedMessage>> {
        let group_id = source.media_group_id.as_deref()?;
        let mut messages = self.resolve(source.chat_id, group_id).await?;

        if !messages.iter().any(|m| m.message_id == source.message_id) {
            messages.push(GroupedMessage {
                message_id: source.message_id,
                media: source.media.clone(),
            });
            messages.sort_by_key(|m| m.message_id.0);
        }
        Some(messages)
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.groups.read().await.len()
    }
}
