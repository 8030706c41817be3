/// Error types for quickcommand
///
/// Only configuration and startup errors are fatal. Everything else is
/// reported to the user and the session keeps going.
/// Uses thiserror for ergonomic error handling.

use crate::shell::Shell;
use thiserror::Error;

/// Main error type for quickcommand operations
#[derive(Error, Debug)]
pub enum QuickError {
    /// Bad pattern file, invalid setting or unreadable config source
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (reading input, pattern files, temp scripts)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No handler registered for the suggestion's shell
    #[error("Unsupported shell: {0}")]
    UnsupportedShell(Shell),

    /// The command's process could not be started
    #[error("Execution error: {0}")]
    Execution(String),

    /// Copying to the system clipboard failed
    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

/// Result type alias for quickcommand operations
pub type Result<T> = std::result::Result<T, QuickError>;

/// Convert QuickError to a user-friendly error message
impl QuickError {
    pub fn user_message(&self) -> String {
        match self {
            QuickError::Config(msg) => {
                format!("Configuration issue: {}", msg)
            }
            QuickError::Io(e) => {
                format!("File system error. Check permissions. Details: {}", e)
            }
            QuickError::UnsupportedShell(shell) => {
                format!("No way to run {} commands here", shell)
            }
            QuickError::Execution(msg) => {
                format!("Could not run the command: {}", msg)
            }
            QuickError::Clipboard(msg) => {
                format!("Clipboard not available: {}", msg)
            }
        }
    }

    /// Whether the process should stop because of this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, QuickError::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_user_messages() {
        let err = QuickError::UnsupportedShell(Shell::Python);
        assert!(err.user_message().contains("python"));

        let err = QuickError::Clipboard("no xclip".to_string());
        assert!(err.user_message().contains("no xclip"));
    }

    #[test]
    fn test_error_display() {
        let err = QuickError::Config("powershell.services[0]: missing `command`".to_string());
        let display = format!("{}", err);
        assert!(display.contains("Configuration error"));
        assert!(display.contains("powershell.services[0]"));
    }

    #[test]
    fn test_only_config_is_fatal() {
        assert!(QuickError::Config("x".to_string()).is_fatal());
        assert!(!QuickError::Execution("x".to_string()).is_fatal());
        assert!(!QuickError::UnsupportedShell(Shell::PowerShell).is_fatal());
    }
}
