//! Error types for the risk analysis console

use thiserror::Error;

/// Result type alias for console operations
pub type Result<T> = std::result::Result<T, ConsoleError>;

#[derive(Error, Debug)]
pub enum ConsoleError {

    // =============================
    // Gateway Errors
    // =============================

    /// Transport failure: connection refused, DNS, timeout.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("Backend error ({status}): {body}")]
    Backend { status: u16, body: String },

    /// The backend answered, but not with the shape we expect.
    #[error("Decode error: {0}")]
    Decode(String),

    // =============================
    // Local Errors
    // =============================

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConsoleError {
    /// Short kind tag used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ConsoleError::Network(_) => "network",
            ConsoleError::Backend { .. } => "backend",
            ConsoleError::Decode(_) => "decode",
            _ => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(ConsoleError::Network("refused".into()).kind(), "network");
        assert_eq!(
            ConsoleError::Backend { status: 500, body: String::new() }.kind(),
            "backend"
        );
        assert_eq!(ConsoleError::Decode("bad".into()).kind(), "decode");
        assert_eq!(ConsoleError::Config("x".into()).kind(), "other");
    }

    #[test]
    fn test_backend_display_includes_status() {
        let err = ConsoleError::Backend {
            status: 503,
            body: "unavailable".into(),
        };
        assert_eq!(err.to_string(), "Backend error (503): unavailable");
    }
}
