// Clipboard access through whatever copy utility the platform has.
// The text goes in on stdin so nothing needs escaping.

use crate::error::{QuickError, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::debug;

pub trait Clipboard {
    fn copy(&self, text: &str) -> Result<()>;
}

/// Copy utilities to try, in order: (program, args)
#[cfg(target_os = "windows")]
const COPY_TOOLS: &[(&str, &[&str])] = &[("clip", &[])];

#[cfg(target_os = "macos")]
const COPY_TOOLS: &[(&str, &[&str])] = &[("pbcopy", &[])];

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const COPY_TOOLS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

/// The real system clipboard
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }

    fn copy_with(program: &str, args: &[&str], text: &str) -> std::io::Result<bool> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }

        Ok(child.wait()?.success())
    }
}

impl Clipboard for SystemClipboard {
    fn copy(&self, text: &str) -> Result<()> {
        for (program, args) in COPY_TOOLS {
            match Self::copy_with(program, args, text) {
                Ok(true) => return Ok(()),
                Ok(false) => debug!(program, "Copy tool exited with an error"),
                Err(e) => debug!(program, error = %e, "Copy tool not usable"),
            }
        }

        let tried: Vec<&str> = COPY_TOOLS.iter().map(|(program, _)| *program).collect();
        Err(QuickError::Clipboard(format!(
            "no working copy tool (tried {})",
            tried.join(", ")
        )))
    }
}
