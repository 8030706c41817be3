/// Suggestion data model
///
/// A suggestion is what resolution hands to the session: one command, the
/// shell it runs in, and whatever we know about it.

use crate::shell::Shell;
use serde::{Deserialize, Serialize};

/// Where a suggestion came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Ai,
    Fallback,
}

impl Source {
    pub fn label(&self) -> &'static str {
        match self {
            Source::Ai => "AI",
            Source::Fallback => "pattern match",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Ai => write!(f, "ai"),
            Source::Fallback => write!(f, "fallback"),
        }
    }
}

/// A resolved command suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub command: String,
    pub description: String,
    pub shell: Shell,
    pub warning: Option<String>,
    pub source: Source,
}

impl Suggestion {
    pub fn new(
        command: impl Into<String>,
        description: impl Into<String>,
        shell: Shell,
        source: Source,
    ) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
            shell,
            warning: None,
            source,
        }
    }

    /// Attach a warning; blank text means no warning
    pub fn with_warning(mut self, warning: Option<String>) -> Self {
        self.warning = warning.filter(|w| !w.trim().is_empty());
        self
    }

    pub fn has_warning(&self) -> bool {
        self.warning.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_warning_is_none() {
        let s = Suggestion::new("Get-Date", "", Shell::PowerShell, Source::Ai)
            .with_warning(Some("   ".to_string()));
        assert!(!s.has_warning());

        let s = s.with_warning(Some("careful".to_string()));
        assert_eq!(s.warning.as_deref(), Some("careful"));
    }

    #[test]
    fn test_source_display() {
        assert_eq!(Source::Ai.to_string(), "ai");
        assert_eq!(Source::Fallback.to_string(), "fallback");
    }
}
