//! Outbound HTTP clients.
//!
//! [`WorkerClient`] is the seam the playback path delivers through; the
//! HTTP implementation lives in [`worker`]. [`ConductorClient`] talks to a
//! conductor and is used by musicians and the CLI.

use async_trait::async_trait;

mod conductor;
mod worker;

pub use conductor::{ClientError, ConductorClient};
pub use worker::HttpWorkerClient;

#[derive(Debug, Clone, thiserror::Error)]
pub enum DeliveryError {
    #[error("invalid worker address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("worker rejected event with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Delivers one event payload to one worker.
#[async_trait]
pub trait WorkerClient: Send + Sync {
    async fn deliver_event(&self, address: &str, payload: &[u8]) -> Result<(), DeliveryError>;
}
