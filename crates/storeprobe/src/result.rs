//! Result and error types for storeprobe.

use thiserror::Error;

/// Result type for storeprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving a storefront
#[derive(Debug, Error)]
pub enum ProbeError {
    /// No element matched the locator
    #[error("No element found for {locator}")]
    NotFound {
        /// Description of the locator
        locator: String,
    },

    /// Element matched but is not rendered/visible
    #[error("Element {locator} is not visible")]
    NotVisible {
        /// Description of the locator
        locator: String,
    },

    /// Element is visible but cannot be acted on (disabled, obscured, not editable)
    #[error("Element {locator} is not interactable: {reason}")]
    NotInteractable {
        /// Description of the locator
        locator: String,
        /// Why the element rejected the interaction
        reason: String,
    },

    /// A wait exceeded its budget
    #[error("Timed out after {ms}ms waiting for {what}")]
    Timeout {
        /// What was being waited for
        what: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Browser driver failure unrelated to a specific element
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// The browser session is closed or the browser process is gone
    #[error("Browser session closed")]
    SessionClosed,

    /// The document was replaced while being queried (navigation in flight)
    #[error("Document changed while querying: {message}")]
    DocumentChanged {
        /// Error message
        message: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Journey assertion failed
    #[error("Assertion failed: {message}")]
    Assertion {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ProbeError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a document-changed error
    #[must_use]
    pub fn document_changed(message: impl Into<String>) -> Self {
        Self::DocumentChanged {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an assertion error
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(what: impl Into<String>, ms: u64) -> Self {
        Self::Timeout {
            what: what.into(),
            ms,
        }
    }

    /// Whether this is one of the interaction failures an action can report
    /// (`NotFound`, `NotVisible`, `NotInteractable`, `Timeout`)
    #[must_use]
    pub const fn is_interaction_failure(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::NotVisible { .. }
                | Self::NotInteractable { .. }
                | Self::Timeout { .. }
        )
    }

    /// Whether a wait may poll again after this error.
    ///
    /// Only a document swapped out mid-query qualifies. A closed session or a
    /// broken transport is final.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::DocumentChanged { .. })
    }

    /// Check for `NotFound`
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check for `Timeout`
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Fail a journey with an [`ProbeError::Assertion`] unless the condition holds.
///
/// ```ignore
/// ensure!(cart.is_empty().await, "cart should be empty after removal");
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::ProbeError::assertion(format!($($arg)+)));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_failure_family() {
        assert!(ProbeError::NotFound {
            locator: "#x".into()
        }
        .is_interaction_failure());
        assert!(ProbeError::timeout("#x visible", 10).is_interaction_failure());
        assert!(!ProbeError::driver("socket closed").is_interaction_failure());
        assert!(!ProbeError::config("bad url").is_interaction_failure());
    }

    #[test]
    fn test_only_document_changes_are_transient() {
        assert!(ProbeError::document_changed("execution context destroyed").is_transient());
        assert!(!ProbeError::SessionClosed.is_transient());
        assert!(!ProbeError::driver("websocket closed").is_transient());
        assert!(!ProbeError::SessionClosed.is_interaction_failure());
    }

    #[test]
    fn test_messages() {
        let err = ProbeError::NotInteractable {
            locator: "css=#qty".into(),
            reason: "element is disabled".into(),
        };
        assert_eq!(
            err.to_string(),
            "Element css=#qty is not interactable: element is disabled"
        );
        assert_eq!(
            ProbeError::timeout("url ~ /checkout/i", 250).to_string(),
            "Timed out after 250ms waiting for url ~ /checkout/i"
        );
    }

    fn check(flag: bool) -> ProbeResult<()> {
        crate::ensure!(flag, "flag was {}", flag);
        Ok(())
    }

    #[test]
    fn test_ensure_macro() {
        assert!(check(true).is_ok());
        let err = check(false).unwrap_err();
        assert!(matches!(err, ProbeError::Assertion { .. }));
        assert!(err.to_string().contains("flag was false"));
    }
}
