//! Error types for Scribe.

use thiserror::Error;

/// Result type alias using the Scribe error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Scribe.
///
/// Archive and render failures are deliberately absent: the sink absorbs
/// backend errors (logged, skipped) and rendering degrades to raw text
/// instead of failing.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport error
    #[error("Transport error: {0}")]
    Transport(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = Error::Config("missing keyword".into());
        assert_eq!(err.to_string(), "Configuration error: missing keyword");
    }

    #[test]
    fn test_json_error_converts() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = parse_err.into();
        assert!(err.to_string().starts_with("JSON error"));
    }
}
