//! Handler contract.
//!
//! A [`Handler`] decides whether it wants an update ([`Handler::check_update`])
//! and processes it ([`Handler::handle_update`]). The [`Outcome`] it returns
//! steers the dispatcher:
//!
//! | Result | Effect |
//! |---|---|
//! | `Ok(Outcome::Handled)` / `Ok(Outcome::SkipGroup)` | stop this group, go to the next one |
//! | `Ok(Outcome::EndGroups)` | stop processing the update |
//! | `Ok(Outcome::ContinueGroup)` | try the next handler of this group |
//! | `Err(_)` | report the error, then try the next handler of this group |
//!
//! # Example
//!
//! ```rust,ignore
//! use gott_framework::{FnHandler, Outcome};
//!
//! let handler = FnHandler::new(
//!     "ping",
//!     |update| update.update_type() == UpdateType::MessageCreated,
//!     |bot, ctx| async move {
//!         if let Some(chat_id) = ctx.effective_chat_id() {
//!             bot.send_message(chat_id, "pong").await?;
//!         }
//!         Ok(Outcome::Handled)
//!     },
//! );
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use uuid::Uuid;

use gott_core::{BoxedBot, Context, Update};

// ============================================================================
// Outcome
// ============================================================================

/// Control-flow signal returned by a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    /// The update was handled; no other handler of this group runs.
    #[default]
    Handled,
    /// Not handled, but the rest of this group must be skipped.
    SkipGroup,
    /// Stop processing the update entirely.
    EndGroups,
    /// Let the next handler of this group try.
    ContinueGroup,
}

/// What a handler returns. Errors are reported and treated like
/// [`Outcome::ContinueGroup`].
pub type HandlerResult = anyhow::Result<Outcome>;

// ============================================================================
// HandlerId
// ============================================================================

/// Identifier of a registered handler, used for removal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerId(String);

impl HandlerId {
    /// Generates a fresh identifier of the form `kind-<uuid>`.
    pub fn new(kind: &str) -> Self {
        Self(format!("{kind}-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for HandlerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for HandlerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ============================================================================
// Handler Trait
// ============================================================================

/// A reactor registered in a dispatcher group.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Returns `true` if this handler wants the update.
    fn check_update(&self, update: &Update) -> bool;

    /// Processes an update that passed [`check_update`](Self::check_update).
    async fn handle_update(&self, bot: BoxedBot, ctx: Arc<Context>) -> HandlerResult;

    /// Returns the identifier of this handler. Must be stable.
    fn id(&self) -> HandlerId;
}

/// A shared handler trait object.
pub type BoxedHandler = Arc<dyn Handler>;

// ============================================================================
// FnHandler
// ============================================================================

/// A type-erased check function.
pub type CheckFn = Arc<dyn Fn(&Update) -> bool + Send + Sync>;

/// A type-erased async callback.
pub type CallbackFn =
    Arc<dyn Fn(BoxedBot, Arc<Context>) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// A handler built from a check closure and an async callback.
///
/// All built-in handlers except [`CommandHandler`](crate::CommandHandler) are
/// `FnHandler`s.
#[derive(Clone)]
pub struct FnHandler {
    id: HandlerId,
    check: CheckFn,
    callback: CallbackFn,
}

impl FnHandler {
    /// Creates a handler; `kind` prefixes its generated identifier.
    pub fn new<C, F, Fut>(kind: &str, check: C, callback: F) -> Self
    where
        C: Fn(&Update) -> bool + Send + Sync + 'static,
        F: Fn(BoxedBot, Arc<Context>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::from_parts(
            HandlerId::new(kind),
            Arc::new(check),
            Arc::new(move |bot: BoxedBot, ctx: Arc<Context>| callback(bot, ctx).boxed()),
        )
    }

    pub(crate) fn from_parts(id: HandlerId, check: CheckFn, callback: CallbackFn) -> Self {
        Self {
            id,
            check,
            callback,
        }
    }

    /// Replaces the generated identifier.
    pub fn with_id(mut self, id: impl Into<HandlerId>) -> Self {
        self.id = id.into();
        self
    }
}

#[async_trait]
impl Handler for FnHandler {
    fn check_update(&self, update: &Update) -> bool {
        (self.check)(update)
    }

    async fn handle_update(&self, bot: BoxedBot, ctx: Arc<Context>) -> HandlerResult {
        (self.callback)(bot, ctx).await
    }

    fn id(&self) -> HandlerId {
        self.id.clone()
    }
}

impl fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_ids_are_unique() {
        let a = HandlerId::new("message");
        let b = HandlerId::new("message");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("message-"));
    }

    #[test]
    fn test_with_id() {
        let handler = FnHandler::new("any", |_| true, |_, _| async { Ok(Outcome::Handled) })
            .with_id("fixed");
        assert_eq!(handler.id(), HandlerId::from("fixed"));
        assert_eq!(handler.id().to_string(), "fixed");
    }
}
