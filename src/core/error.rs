//! Router error types

use thiserror::Error;

/// Errors that can occur in the routing and permission engines
///
/// Authorization outcomes (denied, expired) are *not* errors; they are
/// returned as values from the permission gate. This enum covers storage,
/// configuration, and contract violations only.
#[derive(Error, Debug)]
pub enum RouterError {
    /// No pending permission request with the given id
    #[error("Unknown permission request: {0}")]
    UnknownRequest(uuid::Uuid),

    /// A pending request was already resolved or expired
    #[error("Permission request already resolved: {0}")]
    RequestAlreadyResolved(uuid::Uuid),

    /// Referenced rule or pattern does not exist
    #[error("Unknown entry: {0}")]
    UnknownEntry(String),

    /// Invalid configuration (e.g. a pattern that would match everything)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unknown expert identifier (contract violation at the call site)
    #[error("Unknown expert id: {0}")]
    UnknownExpert(String),

    /// IO error from the rule store
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl RouterError {
    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        RouterError::Other(msg.into())
    }

    /// Create an invalid-configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        RouterError::InvalidConfig(msg.into())
    }
}

/// Result type alias for router operations
pub type RouterResult<T> = Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RouterError::UnknownExpert("wizard".into());
        assert_eq!(err.to_string(), "Unknown expert id: wizard");

        let err = RouterError::invalid_config("empty pattern");
        assert_eq!(err.to_string(), "Invalid configuration: empty pattern");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let router_err: RouterError = io_err.into();
        assert!(matches!(router_err, RouterError::Io(_)));
    }
}
