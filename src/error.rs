//! Error types for the document store.
//!
//! Only hard failures travel through these types. Missing sidecars, missing
//! documents and unparsable JSON are absorbed by the resolvers in `core` and
//! never reach callers as errors.

use thiserror::Error;

/// Result type alias for object-store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors raised by object-store backends.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The requested object does not exist.
    #[error("object not found: {key}")]
    NotFound { key: String },

    /// The key cannot be mapped onto the backend (e.g. `..` on a filesystem).
    #[error("invalid object key: {0}")]
    InvalidKey(String),

    /// The backend could not be reached.
    #[error("backend unreachable: {0}")]
    Network(String),

    /// The backend answered with an unexpected status.
    #[error("backend returned HTTP {status} for {key}")]
    Http { status: u16, key: String },

    /// A listing response could not be decoded or its pagination is broken.
    #[error("malformed listing response: {0}")]
    InvalidListing(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The store could not be built from configuration.
    #[error("invalid store configuration: {0}")]
    Config(String),
}

impl StoreError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Whether this error only means "the object is absent".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_is_soft() {
        let err = StoreError::not_found("base/kb/docs/sha/a.md");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "object not found: base/kb/docs/sha/a.md");
    }

    #[test]
    fn test_other_errors_are_hard() {
        assert!(!StoreError::Network("connection refused".into()).is_not_found());
        assert!(!StoreError::InvalidListing("no token".into()).is_not_found());
        let http = StoreError::Http {
            status: 503,
            key: "k".into(),
        };
        assert_eq!(http.to_string(), "backend returned HTTP 503 for k");
    }
}
