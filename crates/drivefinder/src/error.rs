/// Error types for prompt assembly and model calls
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriveFinderError {
    #[error("Image was not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Content blocked: {0}")]
    ContentBlocked(String),

    #[error("Model API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriveFinderError {
    /// Whether the user can simply resubmit after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, DriveFinderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_not_found_names_path() {
        let err = DriveFinderError::InputNotFound(PathBuf::from("/tmp/missing.jpg"));
        assert_eq!(err.to_string(), "Image was not found: /tmp/missing.jpg");
    }

    #[test]
    fn test_only_config_errors_are_fatal() {
        assert!(DriveFinderError::Transport("refused".into()).is_recoverable());
        assert!(DriveFinderError::ContentBlocked("SAFETY".into()).is_recoverable());
        assert!(!DriveFinderError::Config("API_KEY not set".into()).is_recoverable());
    }
}
