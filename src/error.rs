//! Error types for session-keeper.

use thiserror::Error;

/// Main error type for session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// A namespace or key was requested on a non-creating path and is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// A value could not be converted to or from its stored form.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Expiration policy or container settings were rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Client identifier failed shape validation.
    #[error("invalid client id: {0}")]
    InvalidClientId(String),

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,

    /// I/O error from a durable store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = SessionError::NotFound("products.foo/color".into());
        assert!(err.to_string().contains("products.foo/color"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_invalid_config_display() {
        let err = SessionError::InvalidConfig("resolution 601 exceeds timeout 600".into());
        assert!(err.to_string().contains("invalid configuration"));
        assert!(err.to_string().contains("601"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SessionError = io_err.into();
        assert!(matches!(err, SessionError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_serde_error_conversion() {
        let serde_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: SessionError = serde_err.into();
        assert!(matches!(err, SessionError::Serialization(_)));
        assert!(err.to_string().contains("serialization failed"));
    }
}
