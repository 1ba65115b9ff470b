use thiserror::Error;

/// Classified transport and decoding failures.
///
/// Every variant is recoverable: loaders keep previously fetched items,
/// surface the latest error, and re-issue requests only on explicit caller
/// action. `Clone` so a loader snapshot can carry the error to observers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// No active server is configured; no network I/O was attempted.
    #[error("no server configured")]
    NotConfigured,

    /// The transport produced no response (unreachable host, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The server responded with a non-2xx status.
    #[error("server returned HTTP {status}")]
    HttpStatus { status: u16 },

    /// The server responded but flagged logical errors in the envelope.
    #[error("remote logical errors: {}", .messages.join("; "))]
    Protocol { messages: Vec<String> },

    /// The response arrived but did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
