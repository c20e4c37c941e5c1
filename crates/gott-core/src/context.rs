//! Per-update context.
//!
//! A [`Context`] is created once for every update the dispatcher processes
//! and shared by all handlers that run for it. It exposes:
//!
//! - the **effective view** of the update: the acting user, the message and
//!   the chat the update is about, whatever its variant;
//! - a **side-channel map** that lets an early handler leave data for a later
//!   one (an auth gate storing the resolved account, for instance).
//!
//! The effective view is derived by [`Update::effective`]:
//!
//! | Variant | user | message | chat id |
//! |---|---|---|---|
//! | `message_created` / `message_edited` / `message_constructed` | message sender | message | recipient chat |
//! | `message_callback` | message sender | message | recipient chat |
//! | `bot_*`, `user_*`, `chat_title_changed` | carried user | - | carried chat |
//! | `message_chat_created` | - | - | created chat |
//! | `message_construction_request` | carried user | - | - |
//! | `message_removed` | - | - | carried chat |

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

use crate::types::{Callback, Message, User};
use crate::update::Update;

// =============================================================================
// Effective view
// =============================================================================

/// Uniform projection of an update, borrowed from it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Effective<'a> {
    pub user: Option<&'a User>,
    pub message: Option<&'a Message>,
    /// Set for `message_callback` only.
    pub callback: Option<&'a Callback>,
    pub chat_id: Option<i64>,
}

impl<'a> Effective<'a> {
    fn from_message(message: &'a Message) -> Self {
        Self {
            user: message.sender.as_ref(),
            message: Some(message),
            callback: None,
            chat_id: message.chat_id(),
        }
    }

    fn from_member(user: &'a User, chat_id: i64) -> Self {
        Self {
            user: Some(user),
            chat_id: Some(chat_id),
            ..Self::default()
        }
    }
}

impl Update {
    /// Derives the effective view of this update. Never fails; fields the
    /// variant does not carry stay `None`.
    pub fn effective(&self) -> Effective<'_> {
        match self {
            Update::MessageCreated(u) => Effective::from_message(&u.message),
            Update::MessageEdited(u) => Effective::from_message(&u.message),
            Update::MessageConstructed(u) => Effective::from_message(&u.message),
            Update::MessageCallback(u) => {
                let base = u
                    .message
                    .as_ref()
                    .map(Effective::from_message)
                    .unwrap_or_default();
                Effective {
                    callback: Some(&u.callback),
                    ..base
                }
            }
            Update::BotAdded(u) => Effective::from_member(&u.user, u.chat_id),
            Update::BotRemoved(u) => Effective::from_member(&u.user, u.chat_id),
            Update::BotStarted(u) => Effective::from_member(&u.user, u.chat_id),
            Update::UserAdded(u) => Effective::from_member(&u.user, u.chat_id),
            Update::UserRemoved(u) => Effective::from_member(&u.user, u.chat_id),
            Update::ChatTitleChanged(u) => Effective::from_member(&u.user, u.chat_id),
            Update::MessageChatCreated(u) => Effective {
                chat_id: Some(u.chat.chat_id),
                ..Effective::default()
            },
            Update::MessageConstructionRequest(u) => Effective {
                user: Some(&u.user),
                ..Effective::default()
            },
            Update::MessageRemoved(u) => Effective {
                chat_id: Some(u.chat_id),
                ..Effective::default()
            },
        }
    }
}

// =============================================================================
// Context
// =============================================================================

/// The context handed to handlers for one update.
///
/// Handlers receive it as `Arc<Context>`; the data map is behind a mutex so
/// that any of them can write to it. Handlers run one at a time, so the lock
/// is never contended in practice.
pub struct Context {
    update: Update,
    data: Mutex<HashMap<String, Box<dyn Any + Send + Sync>>>,
}

impl Context {
    /// Creates a context for an update.
    pub fn new(update: Update) -> Self {
        Self {
            update,
            data: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the update being processed.
    pub fn update(&self) -> &Update {
        &self.update
    }

    /// Returns the effective view of the update.
    pub fn effective(&self) -> Effective<'_> {
        self.update.effective()
    }

    pub fn effective_user(&self) -> Option<&User> {
        self.effective().user
    }

    pub fn effective_message(&self) -> Option<&Message> {
        self.effective().message
    }

    pub fn effective_callback(&self) -> Option<&Callback> {
        self.effective().callback
    }

    pub fn effective_chat_id(&self) -> Option<i64> {
        self.effective().chat_id
    }

    /// Stores a value under `key`, replacing any previous value.
    pub fn set_data<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        self.data.lock().insert(key.into(), Box::new(value));
    }

    /// Returns a clone of the value under `key` if it exists and has type `T`.
    pub fn get_data<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        self.data
            .lock()
            .get(key)
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    /// Removes and returns the value under `key` if it has type `T`.
    ///
    /// A value of another type is left in place.
    pub fn take_data<T: 'static>(&self, key: &str) -> Option<T> {
        let mut data = self.data.lock();
        if !data.get(key).is_some_and(|v| v.is::<T>()) {
            return None;
        }
        data.remove(key)
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
    }

    pub fn has_data(&self, key: &str) -> bool {
        self.data.lock().contains_key(key)
    }
}

impl From<Update> for Context {
    fn from(update: Update) -> Self {
        Self::new(update)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.data.lock().keys().cloned().collect();
        f.debug_struct("Context")
            .field("update_type", &self.update.update_type())
            .field("data_keys", &keys)
            .finish()
    }
}
