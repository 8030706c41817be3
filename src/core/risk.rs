// Flags commands that can wreck something
//
// Runs over every suggestion no matter where it came from. It's a keyword
// heuristic, not a safety guarantee.

use crate::core::Suggestion;
use crate::error::{QuickError, Result};
use regex::{Regex, RegexBuilder};

// (label, pattern). Matched case-insensitively against the whole command.
const DEFAULT_RISK_PATTERNS: &[(&str, &str)] = &[
    (
        "recursive forced deletion",
        r"\b(remove-item|rm|ri|del|rmdir|rd|erase)\b.*(-recurse\b.*-force\b|-force\b.*-recurse\b)",
    ),
    (
        "recursive forced deletion",
        r"\brm\s+(-[a-z]*r[a-z]*f|-[a-z]*f[a-z]*r)\b",
    ),
    (
        "recursive forced deletion",
        r"\b(del|erase)\b.*\s/s\b.*\s/q\b|\b(rd|rmdir)\b.*\s/s\b",
    ),
    (
        "disk formatting",
        r"\bformat-volume\b|\bformat\s+[a-z]:|\bclear-disk\b|\binitialize-disk\b|\bfdisk\b|\bdiskpart\b",
    ),
    (
        "registry edit",
        r"\breg(\.exe)?\s+(delete|add|import)\b|\b(remove-item|remove-itemproperty|set-itemproperty|new-itemproperty)\b.*\b(hklm|hkcu|hkey_[a-z_]+)",
    ),
    (
        "user account removal",
        r"\bremove-localuser\b|\bremove-aduser\b|\bnet\s+user\b.*\s/delete\b",
    ),
    (
        "system shutdown",
        r"\b(stop-computer|restart-computer)\b|\bshutdown(\.exe)?\s+/[srp]\b",
    ),
    ("recursive deletion", r"\bshutil\.rmtree\b"),
];

struct RiskRule {
    label: String,
    regex: Regex,
}

/// Scans command text for risky operations
pub struct RiskScanner {
    rules: Vec<RiskRule>,
}

impl RiskScanner {
    /// Scanner with the built-in risk patterns
    pub fn new() -> Self {
        // Build all the regex patterns once so we don't recompile them every time
        let rules = DEFAULT_RISK_PATTERNS
            .iter()
            .filter_map(|(label, pattern)| {
                compile(pattern).ok().map(|regex| RiskRule {
                    label: label.to_string(),
                    regex,
                })
            })
            .collect();

        Self { rules }
    }

    /// Built-in patterns plus user-configured ones
    ///
    /// # Returns
    /// * `Err(QuickError::Config)` - If any extra pattern is not a valid regex
    pub fn with_extra(extra: &[String]) -> Result<Self> {
        let mut scanner = Self::new();

        for pattern in extra {
            let regex = compile(pattern).map_err(|e| {
                QuickError::Config(format!("RISK_PATTERNS: invalid pattern '{}': {}", pattern, e))
            })?;
            scanner.rules.push(RiskRule {
                label: format!("matches '{}'", pattern),
                regex,
            });
        }

        Ok(scanner)
    }

    /// Labels of every risk the command matches, without duplicates
    pub fn scan(&self, command: &str) -> Vec<&str> {
        let mut hits: Vec<&str> = Vec::new();

        for rule in &self.rules {
            if rule.regex.is_match(command) && !hits.contains(&rule.label.as_str()) {
                hits.push(&rule.label);
            }
        }

        hits
    }

    pub fn is_risky(&self, command: &str) -> bool {
        self.rules.iter().any(|rule| rule.regex.is_match(command))
    }

    /// Set the suggestion's warning when its command is risky
    ///
    /// A detected risk overrides whatever warning the source supplied.
    /// Commands with no hits keep their original warning.
    pub fn annotate(&self, mut suggestion: Suggestion) -> Suggestion {
        let hits = self.scan(&suggestion.command);
        if !hits.is_empty() {
            suggestion.warning = Some(format!(
                "Risky command ({}). Review it carefully before running.",
                hits.join(", ")
            ));
        }
        suggestion
    }
}

impl Default for RiskScanner {
    fn default() -> Self {
        Self::new()
    }
}

fn compile(pattern: &str) -> std::result::Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Source;
    use crate::shell::Shell;

    #[test]
    fn test_all_builtin_patterns_compile() {
        for (label, pattern) in DEFAULT_RISK_PATTERNS {
            assert!(compile(pattern).is_ok(), "{} pattern does not compile", label);
        }
        assert_eq!(RiskScanner::new().rules.len(), DEFAULT_RISK_PATTERNS.len());
    }

    #[test]
    fn test_flags_recursive_force_delete() {
        let scanner = RiskScanner::new();

        assert!(scanner.is_risky("Remove-Item -Path $env:TEMP\\* -Recurse -Force"));
        assert!(scanner.is_risky("remove-item C:\\old -force -recurse"));
        assert!(scanner.is_risky("rm -rf /tmp/build"));
        assert!(scanner.is_risky("del /f /s /q C:\\temp"));
        assert!(scanner.is_risky("rd /s C:\\old"));
    }

    #[test]
    fn test_flags_registry_accounts_and_disks() {
        let scanner = RiskScanner::new();

        assert!(scanner.is_risky("reg delete HKLM\\SOFTWARE\\Foo /f"));
        assert!(scanner.is_risky("Remove-ItemProperty -Path HKCU:\\Software\\Foo -Name Bar"));
        assert!(scanner.is_risky("Remove-LocalUser -Name 'guest'"));
        assert!(scanner.is_risky("net user bob /delete"));
        assert!(scanner.is_risky("Format-Volume -DriveLetter D"));
        assert!(scanner.is_risky("Stop-Computer -Force"));
        assert!(scanner.is_risky("python -c \"import shutil; shutil.rmtree('build')\""));
    }

    #[test]
    fn test_leaves_read_only_commands_alone() {
        let scanner = RiskScanner::new();

        assert!(!scanner.is_risky("Get-Service | Where-Object {$_.Status -eq 'Running'}"));
        assert!(!scanner.is_risky("Get-ChildItem -Recurse | Where-Object {$_.Length -gt 1GB}"));
        assert!(!scanner.is_risky("Get-Process | Format-Table Name,CPU"));
        assert!(!scanner.is_risky("reg export HKLM\\SOFTWARE\\backup.reg"));
        assert!(!scanner.is_risky("pip install requests"));
    }

    #[test]
    fn test_scan_dedupes_labels() {
        let scanner = RiskScanner::new();

        let hits = scanner.scan("Remove-Item x -Recurse -Force; rm -rf y");
        assert_eq!(hits, vec!["recursive forced deletion"]);
    }

    #[test]
    fn test_annotate_overrides_warning() {
        let scanner = RiskScanner::new();
        let s = Suggestion::new("Remove-Item . -Recurse -Force", "", Shell::PowerShell, Source::Ai)
            .with_warning(Some("from the model".to_string()));

        let annotated = scanner.annotate(s);
        let warning = annotated.warning.unwrap();
        assert!(warning.contains("recursive forced deletion"));
    }

    #[test]
    fn test_annotate_keeps_source_warning_when_clean() {
        let scanner = RiskScanner::new();
        let s = Suggestion::new("Get-Date", "", Shell::PowerShell, Source::Ai)
            .with_warning(Some("from the model".to_string()));

        let annotated = scanner.annotate(s);
        assert_eq!(annotated.warning.as_deref(), Some("from the model"));
    }

    #[test]
    fn test_extra_patterns() {
        let scanner = RiskScanner::with_extra(&["\\bdrop\\s+table\\b".to_string()]).unwrap();
        assert!(scanner.is_risky("sqlcmd -Q \"DROP TABLE users\""));

        let err = RiskScanner::with_extra(&["(unclosed".to_string()]);
        assert!(matches!(err, Err(QuickError::Config(_))));
    }
}
