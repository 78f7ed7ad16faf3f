//! Configuration management for fileshare-bot

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use teloxide::types::{ChatId, Recipient, UserId};

/// Complete bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub telegram: TelegramBotConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Telegram bot specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramBotConfig {
    /// Bot token from BotFather
    #[serde(default = "default_bot_token")]
    pub bot_token: String,
    /// The only user allowed to run management commands
    pub owner_id: u64,
    /// Channel uploads are republished to; used verbatim in shareable links
    pub log_channel: String,
    /// Channels a user must be a member of, in check order
    #[serde(default)]
    pub force_sub_channels: Vec<ChannelRequirement>,
    /// How long an unused media group is remembered
    #[serde(default = "default_media_group_ttl_secs")]
    pub media_group_ttl_secs: u64,
    /// Maximum number of media groups remembered at once
    #[serde(default = "default_media_group_capacity")]
    pub media_group_capacity: usize,
}

/// Force-subscription requirement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelRequirement {
    /// Numeric chat id or public username
    pub chat: String,
    /// Link shown on the "Subscribe to Channel N" button
    pub invite_link: String,
}

/// MongoDB user store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_uri")]
    pub uri: String,
    #[serde(default = "default_store_database")]
    pub database: String,
    #[serde(default = "default_store_collection")]
    pub collection: String,
}

impl ChannelRequirement {
    pub fn recipient(&self) -> Recipient {
        chat_recipient(&self.chat)
    }
}

impl TelegramBotConfig {
    pub fn owner(&self) -> UserId {
        UserId(self.owner_id)
    }

    pub fn media_group_ttl(&self) -> Duration {
        Duration::from_secs(self.media_group_ttl_secs)
    }
}

/// Turn a configured chat identifier into a request target.
///
/// Numeric identifiers address the chat directly, anything else is treated
/// as a public username with or without the leading `@`.
pub fn chat_recipient(identifier: &str) -> Recipient {
    let identifier = identifier.trim();
    match identifier.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(format!("@{}", identifier.trim_start_matches('@'))),
    }
}

impl Config {
    /// Load configuration from a TOML file. Not validated, so CLI
    /// overrides can still fill in missing values.
    pub fn from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup, environment style
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN not set")?;

        let owner_id = lookup("OWNER_ID")
            .context("OWNER_ID not set")?
            .trim()
            .parse::<u64>()
            .context("OWNER_ID must be a numeric user id")?;

        let log_channel = lookup("LOG_CHANNEL").context("LOG_CHANNEL not set")?;

        let force_sub_channels = match lookup("FORCE_SUB_CHANNELS") {
            Some(raw) => parse_channel_list(&raw)?,
            None => Vec::new(),
        };

        let media_group_ttl_secs = match lookup("MEDIA_GROUP_TTL_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .context("MEDIA_GROUP_TTL_SECS must be a number of seconds")?,
            None => default_media_group_ttl_secs(),
        };

        let media_group_capacity = match lookup("MEDIA_GROUP_CAPACITY") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .context("MEDIA_GROUP_CAPACITY must be a positive number")?,
            None => default_media_group_capacity(),
        };

        let store = StoreConfig {
            uri: lookup("MONGO_URI").unwrap_or_else(default_store_uri),
            database: lookup("MONGO_DATABASE").unwrap_or_else(default_store_database),
            collection: lookup("MONGO_COLLECTION").unwrap_or_else(default_store_collection),
        };

        let config = Config {
            telegram: TelegramBotConfig {
                bot_token,
                owner_id,
                log_channel,
                force_sub_channels,
                media_group_ttl_secs,
                media_group_capacity,
            },
            store,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the bot cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            bail!("telegram.bot_token must not be empty");
        }
        if self.telegram.log_channel.trim().is_empty() {
            bail!("telegram.log_channel must not be empty");
        }
        if self.telegram.media_group_capacity == 0 {
            bail!("telegram.media_group_capacity must be at least 1");
        }
        for (i, channel) in self.telegram.force_sub_channels.iter().enumerate() {
            if channel.chat.trim().is_empty() {
                bail!("force_sub_channels[{}]: chat must not be empty", i);
            }
            url::Url::parse(&channel.invite_link).with_context(|| {
                format!(
                    "force_sub_channels[{}]: invalid invite link '{}'",
                    i, channel.invite_link
                )
            })?;
        }
        Ok(())
    }
}

/// Parse `chat|invite_link` entries separated by commas.
fn parse_channel_list(raw: &str) -> Result<Vec<ChannelRequirement>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (chat, invite_link) = entry
                .split_once('|')
                .with_context(|| format!("Expected 'chat|invite_link', got '{}'", entry))?;
            Ok(ChannelRequirement {
                chat: chat.trim().to_string(),
                invite_link: invite_link.trim().to_string(),
            })
        })
        .collect()
}

fn default_bot_token() -> String {
    std::env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default()
}

fn default_media_group_ttl_secs() -> u64 {
    3600
}

fn default_media_group_capacity() -> usize {
    1024
}

fn default_store_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_store_database() -> String {
    "bot_db".to_string()
}

fn default_store_collection() -> String {
    "users".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: default_store_uri(),
            database: default_store_database(),
            collection: default_store_collection(),
        }
    }
}
