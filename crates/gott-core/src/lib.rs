//! # gott core
//!
//! The data layer of the gott bot framework:
//!
//! - **Update model**: [`Update`], a sum type with one payload per platform
//!   event, decoded from the wire by its `update_type` discriminator.
//! - **Context**: [`Context`], the per-update effective view (user, message,
//!   chat) plus a side-channel map shared by the handlers of one update.
//! - **Bot boundary**: the [`Bot`] trait through which the engine talks to
//!   the platform API.
//! - **Hand-off channel**: [`channel`], the rendezvous channel between an
//!   update producer and the dispatcher.
//!
//! ```text
//! ┌──────────┐  Update  ┌─────────┐  Update  ┌────────────┐
//! │ producer │─────────▶│ channel │─────────▶│ dispatcher │
//! └──────────┘          └─────────┘          └────────────┘
//! ```

pub mod bot;
pub mod channel;
pub mod context;
pub mod error;
pub mod types;
pub mod update;

pub use bot::{ApiRequest, Bot, BoxedBot, GetUpdatesOpts, HttpMethod, UpdateList};
pub use channel::{UpdateReceiver, UpdateSender, channel};
pub use context::{Context, Effective};
pub use error::{ApiError, ApiResult, ChannelClosed, DecodeError, DecodeResult};
pub use types::{
    Callback, Chat, ChatType, ConstructorInput, LinkedMessage, Message, MessageBody,
    MessageLinkType, Recipient, User,
};
pub use update::{Update, UpdateType};

/// Prelude for common imports.
pub mod prelude {
    pub use super::bot::{ApiRequest, Bot, BoxedBot, GetUpdatesOpts};
    pub use super::context::Context;
    pub use super::error::{ApiError, ApiResult};
    pub use super::types::{Callback, ChatType, Message, User};
    pub use super::update::{Update, UpdateType};
}
