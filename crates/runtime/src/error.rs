//! Error types for the LCU runtime.
//!
//! Nothing here is fatal to the embedding application: every variant maps to
//! "the client is unavailable right now" and the supervisor keeps retrying.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while discovering or talking to the LCU.
#[derive(Debug, Error)]
pub enum Error {
    /// No lockfile was found at any candidate location.
    #[error("LCU lockfile not found; is the League client running?")]
    DescriptorNotFound,

    /// A lockfile existed but never parsed within the retry budget.
    #[error("LCU lockfile unreadable at {path}: {reason}")]
    DescriptorUnreadable { path: String, reason: String },

    /// Refused to relax certificate validation for a non-loopback host.
    #[error("refusing non-loopback LCU endpoint: {0}")]
    NonLoopbackEndpoint(String),

    /// No live session; the caller should treat the client as disconnected.
    #[error("no active LCU session")]
    NotConnected,

    /// The HTTP client itself could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(reqwest::Error),

    /// REST request failed at the HTTP layer (connect error or timeout).
    #[error("LCU request failed: {endpoint}: {source}")]
    Request {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// REST request completed with a non-2xx status.
    #[error("LCU request failed: {endpoint} => {status}")]
    Status { endpoint: String, status: u16 },

    /// WebSocket connect, upgrade, or subscribe failed.
    #[error("event stream unavailable: {0}")]
    StreamUnavailable(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if the failure was an HTTP-level timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Request { source, .. } if source.is_timeout())
    }

    /// Returns `true` for failures the supervisor retries on its cadence,
    /// which is all of them except the deliberate loopback refusal.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::NonLoopbackEndpoint(_))
    }
}
