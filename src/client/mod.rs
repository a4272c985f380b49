//! Remote queue API abstraction
//!
//! The sweeper only talks to [`QueueApi`]; [`SonarrClient`] is the HTTP
//! implementation used in production.

pub mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::queue::{QueueId, QueueRecord};

pub use http::SonarrClient;

/// Failure to complete an exchange with the remote server
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("Malformed response body: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Read and delete access to the server's download queue
#[async_trait]
pub trait QueueApi: Send + Sync {
    /// Every record currently in the queue, in server order
    async fn fetch_queue(&self) -> Result<Vec<QueueRecord>>;

    /// Drop the queue entry while leaving the download in the client
    async fn remove(&self, id: &QueueId) -> Result<()>;
}
