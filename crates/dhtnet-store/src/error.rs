//! Error types for dhtnet-store.

/// Result type for dhtnet-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading the external store.
///
/// Any failure here fails the whole call; the store layer never returns
/// partial results and never retries internally.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport-level failure reaching the store.
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("store returned status {status} for {path}")]
    Backend { path: String, status: u16 },

    /// The payload at a path did not match the expected schema.
    #[error("malformed payload at {path}: {reason}")]
    MalformedPayload { path: String, reason: String },

    /// JSON decoding failure outside a known path context.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        Error::MalformedPayload {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
