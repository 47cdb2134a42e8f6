//! Error types for NEA Studio
//!
//! Provides a unified error type and domain-specific error variants.
//! The simulation core itself is total; these cover parsing, configuration,
//! and the boundaries around it.

use thiserror::Error;

/// Result type alias using NeaError
pub type Result<T> = std::result::Result<T, NeaError>;

/// Unified error type for NEA Studio operations
#[derive(Debug, Error)]
pub enum NeaError {
    // Parse errors for operator-supplied selectors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // External formalizer errors
    #[error("Formalizer error: {0}")]
    Formalizer(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors from parsing operator selectors (mode, domain, schema)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown policy mode: {0}")]
    UnknownMode(String),

    #[error("Unknown operating domain: {0}")]
    UnknownDomain(String),

    #[error("Unknown formalizer schema: {0}")]
    UnknownSchema(String),
}

impl From<serde_json::Error> for NeaError {
    fn from(err: serde_json::Error) -> Self {
        NeaError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for NeaError {
    fn from(err: anyhow::Error) -> Self {
        NeaError::Internal(err.to_string())
    }
}

impl NeaError {
    /// Whether the error was caused by caller input rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(self, NeaError::Parse(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NeaError::Parse(ParseError::UnknownMode("CHAOS".to_string()));
        assert!(err.to_string().contains("CHAOS"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_serde_error_conversion() {
        let bad: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: NeaError = bad.unwrap_err().into();
        assert!(matches!(err, NeaError::Serialization(_)));
        assert!(!err.is_client_error());
    }
}
