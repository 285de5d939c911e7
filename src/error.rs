//! Error types for rs-rdrview.
//!
//! This module defines the error types returned by extraction operations.

/// Error type for extraction operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The document has no root element.
    #[error("document has no root element")]
    Empty,

    /// Extraction completed but no article was selectable, even the fallback.
    #[error("no extractable content found")]
    NoContent,

    /// A structural precondition was violated (e.g. no `<body>` where one is required).
    #[error("malformed document: {0}")]
    Malformed(String),

    /// A compiled pattern failed to build. Fatal to the process; should not
    /// occur once the pattern table in `patterns` has compiled successfully once.
    #[error("regex compilation failed: {0}")]
    BadRegex(String),
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;
