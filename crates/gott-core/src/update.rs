//! The update model.
//!
//! Every notification from the platform is an [`Update`]: a sum type with one
//! payload struct per event kind. On the wire each update is a flat JSON
//! object whose `update_type` field names the kind:
//!
//! ```text
//! { "update_type": "bot_started", "timestamp": 1700000000, "chat_id": 55,
//!   "user": { "user_id": 9, "name": "Ann" }, "payload": "ref-42" }
//! ```
//!
//! # Decoding
//!
//! [`Update::decode`] reads the discriminator first and only then decodes the
//! rest of the object into the payload struct for that kind, so an unknown
//! kind and a broken payload are reported as different errors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DecodeError, DecodeResult};
use crate::types::{Callback, Chat, ConstructorInput, Message, User};

// ============================================================================
// Update Type Classification
// ============================================================================

/// Fieldless mirror of the [`Update`] variants.
///
/// Used to subscribe to a subset of updates and by handlers that only care
/// about the kind of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    MessageCreated,
    MessageEdited,
    MessageRemoved,
    MessageCallback,
    BotAdded,
    BotRemoved,
    BotStarted,
    UserAdded,
    UserRemoved,
    ChatTitleChanged,
    MessageChatCreated,
    MessageConstructed,
    MessageConstructionRequest,
}

impl UpdateType {
    /// Every update type, in wire-name order.
    pub const ALL: [UpdateType; 13] = [
        UpdateType::BotAdded,
        UpdateType::BotRemoved,
        UpdateType::BotStarted,
        UpdateType::ChatTitleChanged,
        UpdateType::MessageCallback,
        UpdateType::MessageChatCreated,
        UpdateType::MessageConstructed,
        UpdateType::MessageConstructionRequest,
        UpdateType::MessageCreated,
        UpdateType::MessageEdited,
        UpdateType::MessageRemoved,
        UpdateType::UserAdded,
        UpdateType::UserRemoved,
    ];

    /// Returns the wire name of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MessageCreated => "message_created",
            Self::MessageEdited => "message_edited",
            Self::MessageRemoved => "message_removed",
            Self::MessageCallback => "message_callback",
            Self::BotAdded => "bot_added",
            Self::BotRemoved => "bot_removed",
            Self::BotStarted => "bot_started",
            Self::UserAdded => "user_added",
            Self::UserRemoved => "user_removed",
            Self::ChatTitleChanged => "chat_title_changed",
            Self::MessageChatCreated => "message_chat_created",
            Self::MessageConstructed => "message_constructed",
            Self::MessageConstructionRequest => "message_construction_request",
        }
    }
}

impl FromStr for UpdateType {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DecodeError::UnknownType(s.to_string()))
    }
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// A new message was sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageCreated {
    pub timestamp: i64,
    pub message: Message,
    /// User locale in IETF BCP 47 format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_locale: Option<String>,
}

/// A message was edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEdited {
    pub timestamp: i64,
    pub message: Message,
}

/// A message was deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRemoved {
    pub timestamp: i64,
    pub message_id: String,
    pub chat_id: i64,
    /// User who deleted the message.
    pub user_id: i64,
}

/// An inline button was pressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageCallback {
    pub timestamp: i64,
    pub callback: Callback,
    /// Message holding the keyboard; `None` if it was deleted meanwhile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_locale: Option<String>,
}

/// The bot was added to a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotAdded {
    pub timestamp: i64,
    pub chat_id: i64,
    /// User who added the bot.
    pub user: User,
    #[serde(default)]
    pub is_channel: bool,
}

/// The bot was removed from a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotRemoved {
    pub timestamp: i64,
    pub chat_id: i64,
    /// User who removed the bot.
    pub user: User,
    #[serde(default)]
    pub is_channel: bool,
}

/// A user pressed "Start" in a dialog with the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotStarted {
    pub timestamp: i64,
    pub chat_id: i64,
    pub user: User,
    /// Deep-link payload passed on start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_locale: Option<String>,
}

/// A user joined or was added to a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAdded {
    pub timestamp: i64,
    pub chat_id: i64,
    pub user: User,
    /// Who added the user; `None` when the user joined by link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inviter_id: Option<i64>,
    #[serde(default)]
    pub is_channel: bool,
}

/// A user left or was removed from a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRemoved {
    pub timestamp: i64,
    pub chat_id: i64,
    pub user: User,
    /// Administrator who removed the user; `None` when the user left.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<i64>,
    #[serde(default)]
    pub is_channel: bool,
}

/// A chat got a new title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTitleChanged {
    pub timestamp: i64,
    pub chat_id: i64,
    pub user: User,
    pub title: String,
}

/// A chat was created from a chat button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageChatCreated {
    pub timestamp: i64,
    pub chat: Chat,
    /// Message whose button was pressed.
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_payload: Option<String>,
}

/// A constructor session finished with a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageConstructed {
    pub timestamp: i64,
    pub message: Message,
    pub session_id: String,
}

/// A user interacts with the bot acting as a message constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageConstructionRequest {
    pub timestamp: i64,
    pub user: User,
    pub session_id: String,
    /// Data from the previous constructor answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    pub input: ConstructorInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_locale: Option<String>,
}

// ============================================================================
// Update
// ============================================================================

/// One notification from the platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "update_type", rename_all = "snake_case")]
pub enum Update {
    MessageCreated(MessageCreated),
    MessageEdited(MessageEdited),
    MessageRemoved(MessageRemoved),
    MessageCallback(MessageCallback),
    BotAdded(BotAdded),
    BotRemoved(BotRemoved),
    BotStarted(BotStarted),
    UserAdded(UserAdded),
    UserRemoved(UserRemoved),
    ChatTitleChanged(ChatTitleChanged),
    MessageChatCreated(MessageChatCreated),
    MessageConstructed(MessageConstructed),
    MessageConstructionRequest(MessageConstructionRequest),
}

impl Update {
    /// Decodes an update from raw JSON bytes.
    pub fn decode(raw: &[u8]) -> DecodeResult<Self> {
        let value: Value = serde_json::from_slice(raw).map_err(DecodeError::Malformed)?;
        Self::from_value(value)
    }

    /// Decodes an update from an already parsed JSON value.
    pub fn from_value(value: Value) -> DecodeResult<Self> {
        if !value.is_object() {
            return Err(DecodeError::Malformed(serde::de::Error::custom(
                "expected a JSON object",
            )));
        }

        let update_type: UpdateType = value
            .get("update_type")
            .and_then(Value::as_str)
            .ok_or(DecodeError::MissingType)?
            .parse()?;

        macro_rules! payload {
            ($variant:ident) => {
                serde_json::from_value(value)
                    .map(Update::$variant)
                    .map_err(|source| DecodeError::InvalidPayload {
                        update_type: update_type.as_str(),
                        source,
                    })
            };
        }

        match update_type {
            UpdateType::MessageCreated => payload!(MessageCreated),
            UpdateType::MessageEdited => payload!(MessageEdited),
            UpdateType::MessageRemoved => payload!(MessageRemoved),
            UpdateType::MessageCallback => payload!(MessageCallback),
            UpdateType::BotAdded => payload!(BotAdded),
            UpdateType::BotRemoved => payload!(BotRemoved),
            UpdateType::BotStarted => payload!(BotStarted),
            UpdateType::UserAdded => payload!(UserAdded),
            UpdateType::UserRemoved => payload!(UserRemoved),
            UpdateType::ChatTitleChanged => payload!(ChatTitleChanged),
            UpdateType::MessageChatCreated => payload!(MessageChatCreated),
            UpdateType::MessageConstructed => payload!(MessageConstructed),
            UpdateType::MessageConstructionRequest => payload!(MessageConstructionRequest),
        }
    }

    /// Returns the kind of this update.
    pub fn update_type(&self) -> UpdateType {
        match self {
            Self::MessageCreated(_) => UpdateType::MessageCreated,
            Self::MessageEdited(_) => UpdateType::MessageEdited,
            Self::MessageRemoved(_) => UpdateType::MessageRemoved,
            Self::MessageCallback(_) => UpdateType::MessageCallback,
            Self::BotAdded(_) => UpdateType::BotAdded,
            Self::BotRemoved(_) => UpdateType::BotRemoved,
            Self::BotStarted(_) => UpdateType::BotStarted,
            Self::UserAdded(_) => UpdateType::UserAdded,
            Self::UserRemoved(_) => UpdateType::UserRemoved,
            Self::ChatTitleChanged(_) => UpdateType::ChatTitleChanged,
            Self::MessageChatCreated(_) => UpdateType::MessageChatCreated,
            Self::MessageConstructed(_) => UpdateType::MessageConstructed,
            Self::MessageConstructionRequest(_) => UpdateType::MessageConstructionRequest,
        }
    }

    /// Returns the Unix time at which the event occurred.
    pub fn timestamp(&self) -> i64 {
        match self {
            Self::MessageCreated(u) => u.timestamp,
            Self::MessageEdited(u) => u.timestamp,
            Self::MessageRemoved(u) => u.timestamp,
            Self::MessageCallback(u) => u.timestamp,
            Self::BotAdded(u) => u.timestamp,
            Self::BotRemoved(u) => u.timestamp,
            Self::BotStarted(u) => u.timestamp,
            Self::UserAdded(u) => u.timestamp,
            Self::UserRemoved(u) => u.timestamp,
            Self::ChatTitleChanged(u) => u.timestamp,
            Self::MessageChatCreated(u) => u.timestamp,
            Self::MessageConstructed(u) => u.timestamp,
            Self::MessageConstructionRequest(u) => u.timestamp,
        }
    }
}
