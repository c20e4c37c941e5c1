//! # gott transport
//!
//! Network transports for the gott bot framework.
//!
//! ## Features
//!
//! - `http-client` (default): [`HttpBot`], the HTTP API client
//! - `http-server` (default): [`serve_webhook`], the push-mode listener
//! - `full`: both
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │  gott-runtime        │  (updater: pull loop / webhook)
//! ├──────────────────────┤
//! │  gott-transport      │  <- This crate
//! ├──────────────────────┤
//! │  Network (TCP/HTTP)  │
//! └──────────────────────┘
//! ```

pub mod error;

#[cfg(any(feature = "http-client", feature = "http-server"))]
pub mod http;

pub use error::{TransportError, TransportResult};

#[cfg(feature = "http-client")]
pub use http::{DEFAULT_API_URL, HttpBot};

#[cfg(feature = "http-server")]
pub use http::{ListenerHandle, serve_webhook};
