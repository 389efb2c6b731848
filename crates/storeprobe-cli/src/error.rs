//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// At least one journey failed
    #[error("{failed} of {total} journeys failed")]
    JourneysFailed {
        /// Failed journeys
        failed: usize,
        /// Journeys run
        total: usize,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storeprobe library error
    #[error("{0}")]
    Probe(#[from] storeprobe::ProbeError),

    /// JSON rendering error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CliError::config("bad config");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("bad config"));
    }

    #[test]
    fn test_invalid_argument_error() {
        let err = CliError::invalid_argument("no journeys match \"x\"");
        assert!(err.to_string().starts_with("Invalid argument"));
    }

    #[test]
    fn test_journeys_failed_message() {
        let err = CliError::JourneysFailed {
            failed: 2,
            total: 17,
        };
        assert_eq!(err.to_string(), "2 of 17 journeys failed");
    }

    #[test]
    fn test_probe_error_passes_message_through() {
        let err: CliError = storeprobe::ProbeError::config("workers must be at least 1").into();
        assert_eq!(
            err.to_string(),
            "Configuration error: workers must be at least 1"
        );
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(cli_err.to_string().contains("I/O"));
    }
}
