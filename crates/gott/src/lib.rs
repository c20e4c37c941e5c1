//! # gott
//!
//! An update dispatch framework for TamTam bots.
//!
//! ## Overview
//!
//! Updates arrive from the platform by long-polling or through a webhook,
//! are decoded into the [`Update`](core::Update) sum type and handed one by
//! one to a [`Dispatcher`](framework::Dispatcher). The dispatcher walks its
//! handler groups in ascending order; each handler steers the walk with the
//! [`Outcome`](framework::Outcome) it returns.
//!
//! ```text
//! ┌──────────────────┐     ┌─────────┐     ┌────────────┐     ┌─────────────────┐
//! │ Updater          │────▶│ channel │────▶│ Dispatcher │────▶│ group 0 handlers│
//! │ (poll / webhook) │     └─────────┘     │            │────▶│ group 1 handlers│
//! └──────────────────┘                     └────────────┘────▶│ ...             │
//!                                                              └─────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gott::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let updater = Updater::from_config(&config)?;
//!     updater.dispatcher().add_handler(CommandHandler::new("start", |bot: BoxedBot, ctx: Arc<Context>| async move {
//!         if let Some(chat_id) = ctx.effective_chat_id() {
//!             bot.send_message(chat_id, "hello").await?;
//!         }
//!         Ok(Outcome::EndGroups)
//!     }));
//!
//!     updater.start(&config).await?;
//!     updater.idle().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` *(default)*: `gott.toml` configuration files
//! - `yaml-config`: `gott.yaml` configuration files
//! - `json-log`: JSON log output

pub use gott_core as core;
pub use gott_framework as framework;
pub use gott_runtime as runtime;
pub use gott_transport as transport;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use gott::prelude::*;
/// ```
pub mod prelude {
    pub use std::sync::Arc;

    // Runtime
    pub use gott_runtime::config::{GottConfig, load_config, load_config_from_file};
    pub use gott_runtime::{RetryPolicy, Updater, logging};

    // Dispatch
    pub use gott_framework::filters;
    pub use gott_framework::{
        CommandHandler, Dispatcher, FnHandler, Handler, HandlerId, HandlerResult, Outcome, any,
        command_args, on_bot_added, on_bot_started, on_callback, on_edited_message, on_message,
        on_update,
    };

    // Data model
    pub use gott_core::{Bot, BoxedBot, Context, Message, Update, UpdateType};

    pub use gott_transport::HttpBot;
}
