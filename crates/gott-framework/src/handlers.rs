//! Built-in handler builders.
//!
//! Each builder pairs an update predicate with an async callback:
//!
//! ```rust,ignore
//! dispatcher.add_handler(CommandHandler::new("start", |bot, ctx| async move {
//!     if let Some(chat_id) = ctx.effective_chat_id() {
//!         bot.send_message(chat_id, "Hello!").await?;
//!     }
//!     Ok(Outcome::EndGroups)
//! }));
//!
//! dispatcher.add_handler_to_group(1, on_message(filters::message::text(), echo));
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use gott_core::{BoxedBot, Context, Update, UpdateType};

use crate::filters::{CallbackFilter, MessageFilter};
use crate::handler::{CallbackFn, FnHandler, Handler, HandlerId, HandlerResult};

/// Matches every update.
pub fn any<F, Fut>(callback: F) -> FnHandler
where
    F: Fn(BoxedBot, Arc<Context>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    FnHandler::new("any", |_| true, callback)
}

/// Matches updates of one type.
pub fn on_update<F, Fut>(update_type: UpdateType, callback: F) -> FnHandler
where
    F: Fn(BoxedBot, Arc<Context>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    FnHandler::new(
        update_type.as_str(),
        move |update| update.update_type() == update_type,
        callback,
    )
}

/// Matches new messages accepted by `filter`.
pub fn on_message<F, Fut>(filter: MessageFilter, callback: F) -> FnHandler
where
    F: Fn(BoxedBot, Arc<Context>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    FnHandler::new(
        "message",
        move |update| matches!(update, Update::MessageCreated(u) if filter(&u.message)),
        callback,
    )
}

/// Matches edited messages accepted by `filter`.
pub fn on_edited_message<F, Fut>(filter: MessageFilter, callback: F) -> FnHandler
where
    F: Fn(BoxedBot, Arc<Context>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    FnHandler::new(
        "edited_message",
        move |update| matches!(update, Update::MessageEdited(u) if filter(&u.message)),
        callback,
    )
}

/// Matches button presses accepted by `filter`.
pub fn on_callback<F, Fut>(filter: CallbackFilter, callback: F) -> FnHandler
where
    F: Fn(BoxedBot, Arc<Context>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    FnHandler::new(
        "callback",
        move |update| matches!(update, Update::MessageCallback(u) if filter(&u.callback)),
        callback,
    )
}

pub fn on_bot_added<F, Fut>(callback: F) -> FnHandler
where
    F: Fn(BoxedBot, Arc<Context>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    on_update(UpdateType::BotAdded, callback)
}

pub fn on_bot_started<F, Fut>(callback: F) -> FnHandler
where
    F: Fn(BoxedBot, Arc<Context>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    on_update(UpdateType::BotStarted, callback)
}

// ============================================================================
// CommandHandler
// ============================================================================

/// Matches new messages whose first word is a command such as `/start`.
///
/// The comparison ignores case. The prefix defaults to `/`.
#[derive(Clone)]
pub struct CommandHandler {
    id: HandlerId,
    command: String,
    prefixes: Vec<char>,
    filter: Option<MessageFilter>,
    callback: CallbackFn,
}

impl CommandHandler {
    pub fn new<F, Fut>(command: impl Into<String>, callback: F) -> Self
    where
        F: Fn(BoxedBot, Arc<Context>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            id: HandlerId::new("command"),
            command: command.into().to_lowercase(),
            prefixes: vec!['/'],
            filter: None,
            callback: Arc::new(move |bot: BoxedBot, ctx: Arc<Context>| callback(bot, ctx).boxed()),
        }
    }

    /// Replaces the accepted command prefixes.
    pub fn prefixes(mut self, prefixes: impl IntoIterator<Item = char>) -> Self {
        self.prefixes = prefixes.into_iter().collect();
        self
    }

    /// Only matches messages that also pass `filter`.
    pub fn filter(mut self, filter: MessageFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Returns `true` if `text` starts with this command.
    pub fn matches_text(&self, text: &str) -> bool {
        let Some(word) = text.split_whitespace().next() else {
            return false;
        };
        let mut chars = word.chars();
        let Some(prefix) = chars.next() else {
            return false;
        };
        self.prefixes.contains(&prefix) && chars.as_str().to_lowercase() == self.command
    }
}

#[async_trait]
impl Handler for CommandHandler {
    fn check_update(&self, update: &Update) -> bool {
        let Update::MessageCreated(created) = update else {
            return false;
        };
        self.matches_text(created.message.text())
            && self.filter.as_ref().is_none_or(|f| f(&created.message))
    }

    async fn handle_update(&self, bot: BoxedBot, ctx: Arc<Context>) -> HandlerResult {
        (self.callback)(bot, ctx).await
    }

    fn id(&self) -> HandlerId {
        self.id.clone()
    }
}

impl std::fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandler")
            .field("id", &self.id)
            .field("command", &self.command)
            .field("prefixes", &self.prefixes)
            .finish_non_exhaustive()
    }
}

/// Returns the words following the command in `text`.
pub fn command_args(text: &str) -> Vec<&str> {
    text.split_whitespace().skip(1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Outcome;
    use crate::filters;
    use serde_json::json;

    fn noop() -> impl Fn(BoxedBot, Arc<Context>) -> futures::future::Ready<HandlerResult>
    + Send
    + Sync
    + 'static {
        |_, _| futures::future::ready(Ok(Outcome::Handled))
    }

    fn created(text: &str, chat_id: i64) -> Update {
        Update::from_value(json!({
            "update_type": "message_created",
            "timestamp": 1,
            "message": {
                "recipient": { "chat_id": chat_id },
                "body": { "mid": "m", "text": text }
            }
        }))
        .unwrap()
    }

    fn callback(payload: &str) -> Update {
        Update::from_value(json!({
            "update_type": "message_callback",
            "timestamp": 1,
            "callback": { "callback_id": "c", "payload": payload }
        }))
        .unwrap()
    }

    #[test]
    fn test_command_matching() {
        let start = CommandHandler::new("Start", noop());

        assert!(start.check_update(&created("/start", 1)));
        assert!(start.check_update(&created("/START now", 1)));
        assert!(start.check_update(&created("  /start", 1)));
        assert!(!start.check_update(&created("/started", 1)));
        assert!(!start.check_update(&created("start", 1)));
        assert!(!start.check_update(&created("", 1)));
        assert!(!start.check_update(&callback("/start")));
    }

    #[test]
    fn test_command_prefixes_and_filter() {
        let help = CommandHandler::new("help", noop())
            .prefixes(['!', '.'])
            .filter(filters::message::chat(5));

        assert!(help.check_update(&created("!help", 5)));
        assert!(help.check_update(&created(".help me", 5)));
        assert!(!help.check_update(&created("/help", 5)));
        assert!(!help.check_update(&created("!help", 6)));
    }

    #[test]
    fn test_command_args() {
        assert_eq!(command_args("/ban  42 spam"), vec!["42", "spam"]);
        assert!(command_args("/ban").is_empty());
    }

    #[test]
    fn test_message_and_callback_builders() {
        let texts = on_message(filters::message::text(), noop());
        assert!(texts.check_update(&created("hi", 1)));
        assert!(!texts.check_update(&created("", 1)));

        let edited = on_edited_message(filters::message::all(), noop());
        assert!(!edited.check_update(&created("hi", 1)));

        let votes = on_callback(filters::callback::payload_prefix("vote:"), noop());
        assert!(votes.check_update(&callback("vote:no")));
        assert!(!votes.check_update(&callback("other")));

        assert!(any(noop()).check_update(&callback("x")));
        assert!(on_update(UpdateType::MessageCallback, noop()).check_update(&callback("x")));
        assert!(!on_bot_started(noop()).check_update(&callback("x")));
    }

    #[test]
    fn test_builder_ids_carry_kind() {
        assert!(on_message(filters::message::all(), noop()).id().as_str().starts_with("message-"));
        assert!(on_bot_added(noop()).id().as_str().starts_with("bot_added-"));
        assert!(CommandHandler::new("x", noop()).id().as_str().starts_with("command-"));
    }

    #[tokio::test]
    async fn test_command_handler_in_dispatcher() {
        use crate::Dispatcher;
        use gott_core::{ApiError, ApiRequest, ApiResult, Bot};
        use serde_json::Value;
        use std::any::Any;
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct MockBot;

        #[async_trait]
        impl Bot for MockBot {
            fn id(&self) -> &str {
                "mock"
            }

            async fn call_api(&self, _request: ApiRequest) -> ApiResult<Value> {
                Err(ApiError::Transport("offline".into()))
            }

            fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
                self
            }
        }

        let starts = Arc::new(AtomicUsize::new(0));
        let fallbacks = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::new();

        let counter = Arc::clone(&starts);
        dispatcher.add_handler(CommandHandler::new("start", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(Outcome::EndGroups) }
        }));
        let counter = Arc::clone(&fallbacks);
        dispatcher.add_handler_to_group(
            1,
            on_message(filters::message::all(), move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok(Outcome::Handled) }
            }),
        );

        let bot: BoxedBot = Arc::new(MockBot);
        dispatcher.process_update(&bot, created("/start", 1)).await;
        dispatcher.process_update(&bot, created("hello", 1)).await;

        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert_eq!(fallbacks.load(Ordering::SeqCst), 1);
    }
}
