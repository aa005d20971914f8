//! Unified error types for the spielplan crates.

/// Unified error type for the crawl/cache pipeline.
///
/// Failures are recovered as close to their origin as possible and turned
/// into "no data" results; nothing in this crate raises an error that should
/// stop the process.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or unparsable URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Transport-level failure (connect, TLS, client timeout).
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// The remote replied with an error status.
    #[error("REMOTE_STATUS: status {0}")]
    RemoteStatus(u16),

    /// Malformed HTML or JSON from the remote site.
    #[error("PARSE_FAILED: {0}")]
    ParseFailed(String),

    /// Font asset could not be parsed.
    #[error("FONT_PARSE_FAILED: {0}")]
    FontParse(String),

    /// A cache entry promised a body the content store cannot produce.
    #[error("BODY_MISSING: {0}")]
    BodyMissing(String),

    /// Disk or serialization failure in the cache layer.
    #[error("PERSIST_FAILED: {0}")]
    Persist(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Persist(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Persist(err.to_string())
    }
}
