// PowerShell and Python handlers
//
// Both look their interpreter up on PATH at run time, so installing one
// mid-session just works.

use crate::error::{QuickError, Result};
use crate::shell::dispatcher::{ExecutionOutcome, ShellHandler};
use crate::shell::{Shell, ShellDetector};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Find the interpreter: an explicit path wins, then `PATH`
fn interpreter(shell: Shell, explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(QuickError::Execution(format!(
                "{} interpreter not found at {}",
                shell.label(),
                path.display()
            )));
        }
        return Ok(path.to_path_buf());
    }

    ShellDetector::locate(shell).ok_or_else(|| {
        QuickError::Execution(format!(
            "{} not found on PATH (looked for {})",
            shell.label(),
            shell.executable_candidates().join(", ")
        ))
    })
}

fn run(program: &Path, args: &[OsString]) -> Result<ExecutionOutcome> {
    debug!(program = %program.display(), ?args, "Spawning");

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| QuickError::Execution(format!("{}: {}", program.display(), e)))?;

    Ok(output.into())
}

#[derive(Default)]
pub struct PowerShellHandler {
    executable: Option<PathBuf>,
}

impl PowerShellHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific interpreter instead of searching `PATH`
    pub fn with_executable(path: impl Into<PathBuf>) -> Self {
        Self {
            executable: Some(path.into()),
        }
    }

    fn arguments(command: &str) -> Vec<OsString> {
        ["-NoProfile", "-NonInteractive", "-Command", command]
            .into_iter()
            .map(OsString::from)
            .collect()
    }
}

impl ShellHandler for PowerShellHandler {
    fn shell(&self) -> Shell {
        Shell::PowerShell
    }

    fn execute(&self, command: &str) -> Result<ExecutionOutcome> {
        let program = interpreter(Shell::PowerShell, self.executable.as_deref())?;
        run(&program, &Self::arguments(command))
    }

    fn is_available(&self) -> bool {
        interpreter(Shell::PowerShell, self.executable.as_deref()).is_ok()
    }
}

/// How a Python-shell command gets run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PythonInvocation {
    /// `pip ...` becomes `<python> -m pip ...`
    Pip(Vec<String>),
    /// `python ...` runs the interpreter with these arguments
    Interpreter(Vec<String>),
    /// Multi-line code, written to a temp file first
    Script(String),
    /// One-liner passed with `-c`
    Inline(String),
}

impl PythonInvocation {
    /// Work out how to run a command
    ///
    /// # Returns
    /// * `Err(QuickError::Execution)` - A pip/python command line with unbalanced quotes
    pub fn plan(command: &str) -> Result<Self> {
        let command = command.trim();
        let first = command.split_whitespace().next().unwrap_or("");

        match first {
            "pip" | "pip3" => Ok(Self::Pip(split_rest(command)?)),
            "python" | "python3" | "py" => Ok(Self::Interpreter(split_rest(command)?)),
            _ if looks_like_script(command) => Ok(Self::Script(command.to_string())),
            _ => Ok(Self::Inline(command.to_string())),
        }
    }
}

/// Everything after the first word, split the way a POSIX shell would
fn split_rest(command: &str) -> Result<Vec<String>> {
    let mut words = shlex::split(command)
        .ok_or_else(|| QuickError::Execution(format!("can't parse command line: {}", command)))?;

    if !words.is_empty() {
        words.remove(0);
    }
    Ok(words)
}

fn looks_like_script(code: &str) -> bool {
    code.contains('\n')
        || code.starts_with("import ")
        || code.starts_with("from ")
        || code.contains("def ")
}

#[derive(Default)]
pub struct PythonHandler {
    executable: Option<PathBuf>,
}

impl PythonHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific interpreter instead of searching `PATH`
    pub fn with_executable(path: impl Into<PathBuf>) -> Self {
        Self {
            executable: Some(path.into()),
        }
    }

    fn run_script(program: &Path, code: &str) -> Result<ExecutionOutcome> {
        let mut script = tempfile::Builder::new()
            .prefix("quickcommand-")
            .suffix(".py")
            .tempfile()?;
        script.write_all(code.as_bytes())?;
        script.flush()?;

        // The file is removed when `script` drops, after the child exits
        run(program, &[script.path().as_os_str().to_os_string()])
    }
}

impl ShellHandler for PythonHandler {
    fn shell(&self) -> Shell {
        Shell::Python
    }

    fn execute(&self, command: &str) -> Result<ExecutionOutcome> {
        let plan = PythonInvocation::plan(command)?;
        let program = interpreter(Shell::Python, self.executable.as_deref())?;

        match plan {
            PythonInvocation::Pip(args) => {
                let mut full: Vec<OsString> = vec!["-m".into(), "pip".into()];
                full.extend(args.into_iter().map(OsString::from));
                run(&program, &full)
            }
            PythonInvocation::Interpreter(args) => {
                let args: Vec<OsString> = args.into_iter().map(OsString::from).collect();
                run(&program, &args)
            }
            PythonInvocation::Script(code) => Self::run_script(&program, &code),
            PythonInvocation::Inline(code) => {
                let args = [OsString::from("-c"), OsString::from(code)];
                run(&program, &args)
            }
        }
    }

    fn is_available(&self) -> bool {
        interpreter(Shell::Python, self.executable.as_deref()).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_powershell_arguments() {
        let args = PowerShellHandler::arguments("Get-Service | Select-Object -First 3");
        assert_eq!(
            args,
            vec![
                OsString::from("-NoProfile"),
                OsString::from("-NonInteractive"),
                OsString::from("-Command"),
                OsString::from("Get-Service | Select-Object -First 3"),
            ]
        );
    }

    #[test]
    fn test_plan_pip() {
        assert_eq!(
            PythonInvocation::plan("pip install \"requests>=2\" --upgrade").unwrap(),
            PythonInvocation::Pip(vec!["install".into(), "requests>=2".into(), "--upgrade".into()])
        );
        assert_eq!(
            PythonInvocation::plan("pip3 list").unwrap(),
            PythonInvocation::Pip(vec!["list".into()])
        );
    }

    #[test]
    fn test_plan_interpreter() {
        assert_eq!(
            PythonInvocation::plan("python -m venv .venv").unwrap(),
            PythonInvocation::Interpreter(vec!["-m".into(), "venv".into(), ".venv".into()])
        );
        assert_eq!(
            PythonInvocation::plan("python --version").unwrap(),
            PythonInvocation::Interpreter(vec!["--version".into()])
        );
    }

    #[test]
    fn test_plan_script_and_inline() {
        assert!(matches!(
            PythonInvocation::plan("import sys\nprint(sys.version)").unwrap(),
            PythonInvocation::Script(_)
        ));
        assert!(matches!(
            PythonInvocation::plan("import platform; print(platform.node())").unwrap(),
            PythonInvocation::Script(_)
        ));
        assert_eq!(
            PythonInvocation::plan("print('hello')").unwrap(),
            PythonInvocation::Inline("print('hello')".into())
        );
    }

    #[test]
    fn test_plan_unbalanced_quotes() {
        assert!(matches!(
            PythonInvocation::plan("pip install \"requests"),
            Err(QuickError::Execution(_))
        ));
    }

    #[test]
    fn test_missing_interpreter_is_execution_error() {
        let dir = tempfile::tempdir().unwrap();
        let handler = PowerShellHandler::with_executable(dir.path().join("no-such-pwsh"));

        assert!(matches!(handler.execute("Get-Date"), Err(QuickError::Execution(_))));
    }
}
