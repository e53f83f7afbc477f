//! Error types for MIME composition.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Header value that cannot be written safely.
    #[error("Invalid header {name}: {reason}")]
    InvalidHeader {
        /// Header name.
        name: String,
        /// Why it was refused.
        reason: String,
    },

    /// Missing required header or body.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}
