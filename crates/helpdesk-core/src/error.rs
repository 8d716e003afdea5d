use thiserror::Error;

/// Top-level error type for the helpdesk service.
///
/// Subsystem crates define their own error types and implement
/// `From<HelpdeskError>` (or the reverse) so that `?` works across crate
/// boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HelpdeskError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// The primary record store could not be reached or answered with a
    /// non-success status.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A mutation was attempted while only fallback data is available.
    #[error("Server offline: {0}")]
    Offline(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Read-only collection: {0}")]
    ReadOnly(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl HelpdeskError {
    /// Whether this error means the primary store is unreachable, as opposed
    /// to a request the store itself refused.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, HelpdeskError::Unavailable(_) | HelpdeskError::Offline(_))
    }
}

impl From<toml::de::Error> for HelpdeskError {
    fn from(err: toml::de::Error) -> Self {
        HelpdeskError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for HelpdeskError {
    fn from(err: toml::ser::Error) -> Self {
        HelpdeskError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for HelpdeskError {
    fn from(err: serde_json::Error) -> Self {
        HelpdeskError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for helpdesk operations.
pub type Result<T> = std::result::Result<T, HelpdeskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HelpdeskError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");

        let err = HelpdeskError::Offline("cannot save changes".to_string());
        assert_eq!(err.to_string(), "Server offline: cannot save changes");

        assert_eq!(
            HelpdeskError::InvalidCredentials.to_string(),
            "Invalid email or password"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: HelpdeskError = io_err.into();
        assert!(matches!(err, HelpdeskError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: HelpdeskError = json_err.into();
        assert!(matches!(err, HelpdeskError::Serialization(_)));
    }

    #[test]
    fn test_is_unavailable() {
        assert!(HelpdeskError::Unavailable("connection refused".into()).is_unavailable());
        assert!(HelpdeskError::Offline("x".into()).is_unavailable());
        assert!(!HelpdeskError::Storage("disk full".into()).is_unavailable());
        assert!(!HelpdeskError::NotFound("qa/7".into()).is_unavailable());
    }
}
