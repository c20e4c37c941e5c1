//! Platform object types carried inside updates.
//!
//! Only the fields the dispatch engine and the built-in filters look at are
//! modelled strictly. Attachments and markup are kept as raw JSON so that
//! payload schemas can evolve upstream without breaking update decoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A platform user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub user_id: i64,
    /// Visible name.
    #[serde(default)]
    pub name: String,
    /// Public username, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// `true` if the user is a bot.
    #[serde(default)]
    pub is_bot: bool,
    /// Time of last activity (Unix milliseconds).
    #[serde(default)]
    pub last_activity_time: i64,
}

/// Kind of chat a message was delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatType {
    /// One-to-one conversation.
    #[default]
    Dialog,
    /// Group chat.
    Chat,
    /// Channel.
    Channel,
    /// Any type this crate does not know about yet.
    #[serde(other)]
    Unknown,
}

/// Where a message was sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Chat identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
    /// Chat type.
    #[serde(default)]
    pub chat_type: ChatType,
    /// User identifier, if the message was sent to a user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

/// Body of a message: text plus attachments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageBody {
    /// Unique message identifier.
    pub mid: String,
    /// Sequence number of the message in its chat.
    #[serde(default)]
    pub seq: i64,
    /// Message text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Raw attachment objects.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Value>,
    /// Raw markup elements.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub markup: Vec<Value>,
}

/// How a linked message relates to the message carrying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageLinkType {
    Forward,
    Reply,
}

/// A forwarded or replied-to message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedMessage {
    #[serde(rename = "type")]
    pub link_type: MessageLinkType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
    pub message: MessageBody,
}

/// A message in a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Sender; absent for messages posted on behalf of a channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<User>,
    /// Recipient chat or user.
    pub recipient: Recipient,
    /// Creation time (Unix milliseconds).
    #[serde(default)]
    pub timestamp: i64,
    /// Forwarded or replied message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkedMessage>,
    /// Message body.
    pub body: MessageBody,
    /// Public URL, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Message {
    /// Returns the text of the message, or `""` if it has none.
    pub fn text(&self) -> &str {
        self.body.text.as_deref().unwrap_or("")
    }

    /// Returns the message identifier.
    pub fn mid(&self) -> &str {
        &self.body.mid
    }

    /// Returns the chat the message was sent to.
    pub fn chat_id(&self) -> Option<i64> {
        self.recipient.chat_id
    }

    /// Returns the link type if this message forwards or replies to another.
    pub fn link_type(&self) -> Option<MessageLinkType> {
        self.link.as_ref().map(|l| l.link_type)
    }
}

/// A pressed inline button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callback {
    /// Time the button was pressed.
    #[serde(default)]
    pub timestamp: i64,
    /// Keyboard identifier, used to answer the callback.
    pub callback_id: String,
    /// Button payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// User who pressed the button.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// A chat, as carried by `message_chat_created`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub chat_id: i64,
    #[serde(rename = "type", default)]
    pub chat_type: ChatType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// User input delivered to a message constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorInput {
    /// Either `"callback"` or `"message"`.
    #[serde(rename = "type", alias = "input")]
    pub input_type: String,
    /// Pressed button payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    /// Messages sent during construction.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Value>,
}
