/// Command dispatch
///
/// Maps each shell to the handler that knows how to run commands in it.
/// Supporting another shell means registering another handler.

use crate::core::Suggestion;
use crate::error::{QuickError, Result};
use crate::shell::handlers::{PowerShellHandler, PythonHandler};
use crate::shell::Shell;
use std::collections::HashMap;
use std::process::Output;
use tracing::info;

/// What a finished command produced
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionOutcome {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
}

impl ExecutionOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

impl From<Output> for ExecutionOutcome {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        }
    }
}

/// Runs commands for one shell
pub trait ShellHandler: Send + Sync {
    fn shell(&self) -> Shell;

    /// Run a command to completion
    ///
    /// # Returns
    /// * `Err(QuickError::Execution)` - No interpreter, or the process couldn't start
    fn execute(&self, command: &str) -> Result<ExecutionOutcome>;

    /// Whether an interpreter for this shell can be found
    fn is_available(&self) -> bool;
}

/// Registry of shell handlers
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<Shell, Box<dyn ShellHandler>>,
}

impl Dispatcher {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the PowerShell and Python handlers
    pub fn with_defaults() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(Box::new(PowerShellHandler::new()));
        dispatcher.register(Box::new(PythonHandler::new()));
        dispatcher
    }

    /// Add a handler, replacing any previous one for the same shell
    pub fn register(&mut self, handler: Box<dyn ShellHandler>) {
        self.handlers.insert(handler.shell(), handler);
    }

    /// Run a confirmed suggestion in its shell
    ///
    /// # Returns
    /// * `Err(QuickError::UnsupportedShell)` - No handler for the suggestion's shell
    /// * `Err(QuickError::Execution)` - The handler couldn't run it
    pub fn execute(&self, suggestion: &Suggestion) -> Result<ExecutionOutcome> {
        let handler = self
            .handlers
            .get(&suggestion.shell)
            .ok_or(QuickError::UnsupportedShell(suggestion.shell))?;

        info!(shell = %suggestion.shell, command = %suggestion.command, "Running command");
        let outcome = handler.execute(&suggestion.command)?;
        info!(exit_code = ?outcome.exit_code, "Command finished");

        Ok(outcome)
    }

    /// Whether commands for `shell` can actually run here
    pub fn is_available(&self, shell: Shell) -> bool {
        self.handlers
            .get(&shell)
            .map(|h| h.is_available())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Source;
    use std::sync::{Arc, Mutex};

    struct RecordingHandler {
        shell: Shell,
        ran: Arc<Mutex<Vec<String>>>,
    }

    impl ShellHandler for RecordingHandler {
        fn shell(&self) -> Shell {
            self.shell
        }

        fn execute(&self, command: &str) -> Result<ExecutionOutcome> {
            self.ran.lock().unwrap().push(command.to_string());
            Ok(ExecutionOutcome {
                stdout: format!("{} ran", self.shell.name()),
                stderr: String::new(),
                exit_code: Some(0),
            })
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn recording(shell: Shell) -> (Box<dyn ShellHandler>, Arc<Mutex<Vec<String>>>) {
        let ran = Arc::new(Mutex::new(Vec::new()));
        let handler = RecordingHandler {
            shell,
            ran: Arc::clone(&ran),
        };
        (Box::new(handler), ran)
    }

    #[test]
    fn test_routes_to_matching_handler() {
        let (ps, ps_ran) = recording(Shell::PowerShell);
        let (py, py_ran) = recording(Shell::Python);
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(ps);
        dispatcher.register(py);

        let suggestion = Suggestion::new("Get-Date", "", Shell::PowerShell, Source::Fallback);
        let outcome = dispatcher.execute(&suggestion).unwrap();

        assert_eq!(outcome.stdout, "powershell ran");
        assert!(outcome.success());
        assert_eq!(*ps_ran.lock().unwrap(), vec!["Get-Date".to_string()]);
        assert!(py_ran.lock().unwrap().is_empty());
    }

    #[test]
    fn test_missing_handler_is_unsupported() {
        let (ps, _) = recording(Shell::PowerShell);
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(ps);

        let suggestion = Suggestion::new("pip list", "", Shell::Python, Source::Ai);
        match dispatcher.execute(&suggestion) {
            Err(QuickError::UnsupportedShell(shell)) => assert_eq!(shell, Shell::Python),
            other => panic!("Expected UnsupportedShell, got {:?}", other),
        }
        assert!(!dispatcher.is_available(Shell::Python));
    }

    #[test]
    fn test_register_replaces_handler() {
        let (first, first_ran) = recording(Shell::Python);
        let (second, second_ran) = recording(Shell::Python);
        let mut dispatcher = Dispatcher::new();
        dispatcher.register(first);
        dispatcher.register(second);

        let suggestion = Suggestion::new("print(1)", "", Shell::Python, Source::Ai);
        dispatcher.execute(&suggestion).unwrap();

        assert!(first_ran.lock().unwrap().is_empty());
        assert_eq!(second_ran.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_defaults_cover_both_shells() {
        let dispatcher = Dispatcher::with_defaults();
        for shell in Shell::ALL {
            assert!(dispatcher.handlers.contains_key(&shell));
        }
    }
}
