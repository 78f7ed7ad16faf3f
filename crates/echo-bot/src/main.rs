//! Echo bot for Telegram
//!
//! Copies every private message back to the chat it came from.

use anyhow::Result;
use clap::Parser;
use teloxide::prelude::*;
use teloxide::types::{ChatId, Message, MessageId};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Echo bot CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN")]
    bot_token: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "echo_bot=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let bot = Bot::new(args.bot_token);

    match bot.get_me().await {
        Ok(me) => info!("Echo bot authenticated as: @{}", me.username()),
        Err(e) => {
            error!("Failed to authenticate bot: {}", e);
            return Err(e.into());
        }
    }

    let handler = Update::filter_message()
        .branch(dptree::filter_map(|msg: Message| echo_target(&msg)).endpoint(echo));

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Echo bot stopped");
    Ok(())
}

/// Chat and message to copy back, only for private chats
fn echo_target(msg: &Message) -> Option<(ChatId, MessageId)> {
    msg.chat.is_private().then_some((msg.chat.id, msg.id))
}

/// Copy the message back; a failed copy is logged and the bot keeps running.
async fn echo(bot: Bot, target: (ChatId, MessageId)) -> ResponseResult<()> {
    let (chat_id, message_id) = target;
    debug!("Echoing message {} in chat {}", message_id.0, chat_id);

    if let Err(e) = bot.copy_message(chat_id, chat_id, message_id).await {
        error!("Failed to echo message {} in chat {}: {}", message_id.0, chat_id, e);
    }
    Ok(())
}
