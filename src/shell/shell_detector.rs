/// Shell detection logic
///
/// Defines the shells a suggestion can target and finds their interpreters
/// on the current machine.

use crate::error::{QuickError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::str::FromStr;

/// Supported shells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shell {
    PowerShell,
    Python,
}

impl Shell {
    /// Every shell, in the order they're listed to the user
    pub const ALL: [Shell; 2] = [Shell::PowerShell, Shell::Python];

    /// Get the shell name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Shell::PowerShell => "powershell",
            Shell::Python => "python",
        }
    }

    /// Human-facing label used when rendering suggestions
    pub fn label(&self) -> &'static str {
        match self {
            Shell::PowerShell => "PowerShell",
            Shell::Python => "Python",
        }
    }

    /// Interpreter executables to look for, most preferred first
    pub fn executable_candidates(&self) -> &'static [&'static str] {
        match self {
            // PowerShell 7 first, Windows PowerShell second
            Shell::PowerShell => &["pwsh", "powershell"],
            Shell::Python => &["python3", "python", "py"],
        }
    }
}

impl std::fmt::Display for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Shell {
    type Err = QuickError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "powershell" | "pwsh" | "ps" => Ok(Shell::PowerShell),
            "python" | "py" | "python3" => Ok(Shell::Python),
            other => Err(QuickError::Config(format!(
                "Unsupported shell: '{}' (expected powershell or python)",
                other
            ))),
        }
    }
}

/// Shell detector
pub struct ShellDetector;

impl ShellDetector {
    /// Find the first of `candidates` installed on `PATH`
    ///
    /// # Returns
    /// * `Some(PathBuf)` - Full path of the first executable found
    /// * `None` - If none of the candidates is installed
    pub fn find_executable(candidates: &[&str]) -> Option<PathBuf> {
        let path = env::var_os("PATH")?;
        Self::find_in(candidates, &path)
    }

    /// Same as [`find_executable`](Self::find_executable) with an explicit search path
    pub fn find_in(candidates: &[&str], search_path: &OsStr) -> Option<PathBuf> {
        let cwd = env::current_dir().ok()?;
        candidates
            .iter()
            .find_map(|name| which::which_in(name, Some(search_path), &cwd).ok())
    }

    /// Locate the interpreter for a shell
    pub fn locate(shell: Shell) -> Option<PathBuf> {
        Self::find_executable(shell.executable_candidates())
    }
}
