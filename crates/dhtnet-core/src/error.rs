//! Error types for dhtnet-core.

/// Result type for query and aggregation operations.
pub type Result<T> = std::result::Result<T, QueryError>;

/// Errors surfaced by the query engine and dashboard aggregator.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The request itself was malformed (zero limit, unparseable date).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The sensor has no data of any kind in the store.
    #[error("unknown sensor: {0}")]
    NotFound(String),

    /// The store layer failed.
    #[error(transparent)]
    Store(#[from] dhtnet_store::Error),
}
