//! A terminal client for a plain-text chat backend.
//!
//! The backend exposes `GET {base}/ai/chat/string?message=...` returning the
//! reply as plain text, and `GET {base}/actuator/health` for liveness. This
//! crate validates input, keeps a single request in flight, shows a live
//! elapsed-time indicator, and renders replies as markdown in a terminal or
//! as HTML fragments.
//!
//! # Layout
//!
//! - [`client`]: HTTP transport to the backend
//! - [`types`]: conversation messages and request state
//! - [`markdown`]: markdown and syntax highlighting transforms
//! - [`render`]: terminal and HTML output
//! - [`chat`]: session, configuration, validation and slash commands

// Public modules
pub mod chat;
pub mod client;
pub mod error;
pub mod markdown;
mod observability;
pub mod render;
pub mod types;

// Re-exports
pub use client::{ChatBackend, ChatTransport};
pub use error::{Error, Result};
pub use observability::register_biometrics;
pub use types::*;
