//! Slack integration for Samovar.
//!
//! Thin I/O glue around the core pipeline:
//! - [`socket`] — inbound events via Slack Socket Mode
//!   (`apps.connections.open` + WebSocket)
//! - [`api`] — outbound calls via the Slack Web API (`chat.postMessage`,
//!   `users.profile.get`, `team.info`)
//! - [`bridge`] — the per-event handler: mention stripping, conversation-key
//!   derivation, profile caching, threaded replies

pub mod api;
pub mod bridge;
pub mod socket;

pub use api::SlackApiClient;
pub use bridge::SlackBridge;
pub use socket::{MessageEvent, SocketModeListener};

use thiserror::Error;

/// Errors from the Slack boundary.
#[derive(Debug, Error)]
pub enum SlackError {
    #[error("Slack API call failed: {0}")]
    Api(String),

    #[error("Slack Socket Mode error: {0}")]
    Socket(String),
}
