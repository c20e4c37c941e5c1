//! Echo Bot Example
//!
//! Replies to every text message with the same text.
//!
//! Handlers are arranged in two groups:
//!
//! ```text
//! group 0: /ping command ─┐
//!          text echo      ├─ EndGroups once a reply is sent
//! group 1: activity log   (sees everything else)
//! ```
//!
//! # Usage
//!
//! ```bash
//! GOTT_BOT__TOKEN=... cargo run --package echo-bot
//! ```

use anyhow::Result;
use gott::prelude::*;
use tracing::{error, info};

/// Replies to `/ping`.
async fn ping(bot: BoxedBot, ctx: Arc<Context>) -> HandlerResult {
    if let Some(chat_id) = ctx.effective_chat_id() {
        bot.send_message(chat_id, "pong").await?;
    }
    Ok(Outcome::EndGroups)
}

/// Sends the message text back to its chat.
async fn echo(bot: BoxedBot, ctx: Arc<Context>) -> HandlerResult {
    let Some(message) = ctx.effective_message() else {
        return Ok(Outcome::ContinueGroup);
    };
    let Some(chat_id) = message.chat_id() else {
        return Ok(Outcome::ContinueGroup);
    };

    bot.send_message(chat_id, message.text()).await?;
    Ok(Outcome::EndGroups)
}

/// Logs updates no earlier group handled.
async fn log_activity(_bot: BoxedBot, ctx: Arc<Context>) -> HandlerResult {
    let user = ctx.effective_user().map(|u| u.user_id);
    info!(
        update_type = %ctx.update().update_type(),
        chat_id = ?ctx.effective_chat_id(),
        user_id = ?user,
        "Unhandled update"
    );
    Ok(Outcome::Handled)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    logging::init_from_config(&config.logging);

    let updater = Updater::from_config(&config)?;
    let dispatcher = updater.dispatcher();

    dispatcher.set_error_handler(|bot, update, err| {
        error!(
            bot_id = bot.id(),
            update_type = %update.update_type(),
            "Reply failed: {err:#}"
        );
    });

    dispatcher.add_handler(CommandHandler::new("ping", ping));
    dispatcher.add_handler(on_message(filters::message::text(), echo));
    dispatcher.add_handler_to_group(1, any(log_activity));

    updater.start(&config).await?;
    updater.idle().await;
    Ok(())
}
