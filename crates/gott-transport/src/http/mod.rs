//! HTTP transports.
//!
//! - `client`: [`HttpBot`], the [`Bot`](gott_core::Bot) backed by the
//!   platform's HTTP API
//! - `server`: [`serve_webhook`], the push-mode listener

#[cfg(feature = "http-client")]
mod client;
#[cfg(feature = "http-client")]
pub use client::{DEFAULT_API_URL, HttpBot};

#[cfg(feature = "http-server")]
mod server;
#[cfg(feature = "http-server")]
pub use server::{ListenerHandle, serve_webhook};
