//! Closed error-kind taxonomy shared by every component that can fail.
//!
//! Every fallible operation in this codebase returns `Result<T, PmcError>` (or
//! wraps one). `ErrorKind` is the bookkeeping currency: the batch ledger,
//! the summary artifact, and the CLI's exit-code mapping all key off of it
//! rather than matching on `PmcError` variants directly.

use std::fmt;

/// The closed set of ways an operation in this system can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum ErrorKind {
    /// An identifier could not be normalized (e.g. not decimal after stripping `PMC`).
    UnsupportedInput,
    /// The external service has no record for the requested ID.
    NotFound,
    /// Transport-level failure: timeout, connection reset, HTTP 429/5xx.
    NetworkError,
    /// The response was not XML, or not a JATS article.
    ValidationError,
    /// Well-formed XML but unexpected structure; extraction cannot begin.
    ParseError,
    /// Local filesystem read/write problem.
    IOFailed,
    /// Cancellation was observed at a suspension point.
    Cancelled,
    /// Invalid configuration.
    ConfigError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UnsupportedInput => "UnsupportedInput",
            Self::NotFound => "NotFound",
            Self::NetworkError => "NetworkError",
            Self::ValidationError => "ValidationError",
            Self::ParseError => "ParseError",
            Self::IOFailed => "IOFailed",
            Self::Cancelled => "Cancelled",
            Self::ConfigError => "ConfigError",
        };
        write!(f, "{s}")
    }
}

impl ErrorKind {
    /// Whether a failure of this kind is worth retrying at the item level.
    ///
    /// `NetworkError` covers timeouts, resets, 429 and 5xx per the retry policy;
    /// everything else is either permanent for the item or not an HTTP failure
    /// at all.
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::NetworkError)
    }
}

/// The library's structured error type.
///
/// Carries a `kind` for ledger/exit-code bookkeeping plus a human message and,
/// where applicable, the underlying cause.
#[derive(Debug, thiserror::Error)]
pub enum PmcError {
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("I/O error: {0}")]
    IOFailed(#[from] std::io::Error),

    #[error("cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl PmcError {
    /// The `ErrorKind` this error is recorded under in the ledger.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedInput(_) => ErrorKind::UnsupportedInput,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NetworkError(_) => ErrorKind::NetworkError,
            Self::ValidationError(_) => ErrorKind::ValidationError,
            Self::ParseError(_) => ErrorKind::ParseError,
            Self::IOFailed(_) => ErrorKind::IOFailed,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::ConfigError(_) => ErrorKind::ConfigError,
        }
    }

    /// Whether this particular error should trigger a retry under C3.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Build a `NetworkError` from a reqwest error, classifying status codes
    /// the same way regardless of which component issued the request.
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        let status = e.status().map(|s| s.as_u16());
        match status {
            Some(404) => Self::NotFound(e.to_string()),
            Some(s) if (400..500).contains(&s) && s != 429 => Self::ValidationError(e.to_string()),
            _ => Self::NetworkError(e.to_string()),
        }
    }

    /// CLI exit code for this error, per the §6 contract.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::ConfigError(_) => 2,
            Self::IOFailed(_) => 4,
            _ => 1,
        }
    }
}
