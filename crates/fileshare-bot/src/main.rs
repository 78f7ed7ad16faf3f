//! File-share bot for Telegram
//!
//! The owner republishes documents and albums to a log channel and gets
//! shareable links back. Every other user is held to a list of
//! force-subscription channels, has pending join requests approved once
//! subscribed, and is recorded in MongoDB.

mod access;
mod approval;
mod caption;
mod commands;
mod config;
mod errors;
mod handlers;
mod health;
mod inbound;
mod media_group;
#[cfg(test)]
mod mocks;
mod platform;
mod store;
mod upload;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use teloxide::prelude::*;
use teloxide::types::Message;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::access::AccessGate;
use crate::config::Config;
use crate::handlers::MessagePipeline;
use crate::media_group::MediaGroupIndex;
use crate::platform::TelegramPlatform;
use crate::store::MongoUserStore;
use crate::upload::LogChannel;

/// File-share bot CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/fileshare-bot.toml")]
    config: String,

    /// Telegram bot token (overrides config file)
    #[arg(long, env = "TELEGRAM_BOT_TOKEN")]
    bot_token: Option<String>,

    /// MongoDB connection string (overrides config file)
    #[arg(long, env = "MONGO_URI")]
    mongo_uri: Option<String>,

    /// Health check server port
    #[arg(long, env = "HEALTH_CHECK_PORT", default_value = "3000")]
    health_port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fileshare_bot=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting file-share bot");

    let args = Args::parse();

    // Load configuration
    let config = if std::path::Path::new(&args.config).exists() {
        info!("Loading config from file: {}", args.config);
        let mut config = Config::from_file(&args.config)?;

        if let Some(bot_token) = args.bot_token {
            config.telegram.bot_token = bot_token;
        }
        if let Some(mongo_uri) = args.mongo_uri {
            config.store.uri = mongo_uri;
        }
        config.validate()?;

        config
    } else {
        info!("Config file not found, using environment variables");
        Config::from_env()?
    };

    info!("Configuration loaded successfully");
    info!("Log channel: {}", config.telegram.log_channel);
    info!(
        "Force-subscription channels: {}",
        config.telegram.force_sub_channels.len()
    );

    // Connect to MongoDB
    info!("Connecting to MongoDB...");
    let store = MongoUserStore::connect(&config.store)
        .await
        .context("Failed to connect to MongoDB")?;
    store.ping().await.context("MongoDB did not answer ping")?;
    info!("Connected to MongoDB successfully");

    // Create Telegram bot
    info!("Initializing Telegram bot...");
    let bot = Bot::new(&config.telegram.bot_token);

    // Verify bot token
    let bot_username = match bot.get_me().await {
        Ok(me) => {
            let username = me.username().to_string();
            info!("Bot authenticated as: @{}", username);
            Some(username)
        }
        Err(e) => {
            error!("Failed to authenticate bot: {}", e);
            return Err(e.into());
        }
    };

    let health_state = health::AppState::new(bot_username);
    health_state.set_store_connected(true).await;

    let health_state_clone = health_state.clone();
    let health_port = args.health_port;
    tokio::spawn(async move {
        if let Err(e) = health::start_health_server(health_state_clone, health_port).await {
            error!("Health check server error: {}", e);
        }
    });

    let pipeline = Arc::new(MessagePipeline::new(
        TelegramPlatform::new(bot.clone()),
        store,
        AccessGate::new(
            config.telegram.owner(),
            config.telegram.force_sub_channels.clone(),
        ),
        LogChannel::new(config.telegram.log_channel.clone()),
        MediaGroupIndex::new(
            config.telegram.media_group_ttl(),
            config.telegram.media_group_capacity,
        ),
        health_state,
    ));

    info!("Bot initialized, starting message dispatcher...");

    let handler = Update::filter_message()
        .branch(
            dptree::filter(|msg: Message| handlers::is_group_command(&msg))
                .endpoint(handlers::handle_group_command),
        )
        .branch(
            dptree::filter(|msg: Message| msg.chat.is_private())
                .endpoint(handlers::handle_private_message),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![pipeline])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("File-share bot stopped");
    Ok(())
}
