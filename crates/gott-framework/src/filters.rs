//! Predicates used by the built-in handlers.
//!
//! ```rust,ignore
//! use gott_framework::{filters, on_message};
//!
//! let handler = on_message(filters::message::prefix("!"), |bot, ctx| async move {
//!     Ok(Outcome::Handled)
//! });
//! ```

use std::sync::Arc;

use gott_core::{Callback, Message};

/// A shared predicate over messages.
pub type MessageFilter = Arc<dyn Fn(&Message) -> bool + Send + Sync>;

/// A shared predicate over button callbacks.
pub type CallbackFilter = Arc<dyn Fn(&Callback) -> bool + Send + Sync>;

/// Message predicates.
pub mod message {
    use std::sync::Arc;

    use gott_core::{ChatType, Message, MessageLinkType};

    use super::MessageFilter;

    /// Matches every message.
    pub fn all() -> MessageFilter {
        Arc::new(|_: &Message| true)
    }

    /// Matches messages with non-empty text.
    pub fn text() -> MessageFilter {
        Arc::new(|m: &Message| !m.text().is_empty())
    }

    pub fn prefix(prefix: impl Into<String>) -> MessageFilter {
        let prefix = prefix.into();
        Arc::new(move |m: &Message| m.text().starts_with(&prefix))
    }

    pub fn suffix(suffix: impl Into<String>) -> MessageFilter {
        let suffix = suffix.into();
        Arc::new(move |m: &Message| m.text().ends_with(&suffix))
    }

    /// Matches messages sent by the given user.
    pub fn user(user_id: i64) -> MessageFilter {
        Arc::new(move |m: &Message| m.sender.as_ref().is_some_and(|u| u.user_id == user_id))
    }

    /// Matches messages sent to the given chat.
    pub fn chat(chat_id: i64) -> MessageFilter {
        Arc::new(move |m: &Message| m.chat_id() == Some(chat_id))
    }

    pub fn chat_type(chat_type: ChatType) -> MessageFilter {
        Arc::new(move |m: &Message| m.recipient.chat_type == chat_type)
    }

    pub fn is_reply() -> MessageFilter {
        Arc::new(|m: &Message| m.link_type() == Some(MessageLinkType::Reply))
    }

    pub fn is_forwarded() -> MessageFilter {
        Arc::new(|m: &Message| m.link_type() == Some(MessageLinkType::Forward))
    }
}

/// Callback predicates.
pub mod callback {
    use std::sync::Arc;

    use gott_core::Callback;

    use super::CallbackFilter;

    /// Matches every callback.
    pub fn all() -> CallbackFilter {
        Arc::new(|_: &Callback| true)
    }

    /// Matches callbacks whose payload equals `payload`.
    pub fn payload(payload: impl Into<String>) -> CallbackFilter {
        let payload = payload.into();
        Arc::new(move |c: &Callback| c.payload.as_deref() == Some(payload.as_str()))
    }

    pub fn payload_prefix(prefix: impl Into<String>) -> CallbackFilter {
        let prefix = prefix.into();
        Arc::new(move |c: &Callback| c.payload.as_deref().is_some_and(|p| p.starts_with(&prefix)))
    }
}
