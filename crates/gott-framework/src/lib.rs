//! # gott framework
//!
//! Routing layer of the gott bot framework:
//!
//! - [`Handler`] trait with the [`Outcome`] control-flow vocabulary
//! - [`Dispatcher`] with ordered handler groups
//! - Built-in handlers ([`on_message`], [`CommandHandler`], ...) and
//!   [`filters`] for them

pub mod dispatcher;
pub mod filters;
pub mod handler;
pub mod handlers;

pub use dispatcher::{Dispatcher, ErrorHandler};
pub use filters::{CallbackFilter, MessageFilter};
pub use handler::{
    BoxedHandler, CallbackFn, CheckFn, FnHandler, Handler, HandlerId, HandlerResult, Outcome,
};
pub use handlers::{
    CommandHandler, any, command_args, on_bot_added, on_bot_started, on_callback,
    on_edited_message, on_message, on_update,
};
