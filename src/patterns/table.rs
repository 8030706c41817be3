/// Pattern table loading
///
/// The table maps shell -> category -> entries and is read from YAML once at
/// startup. A single bad entry fails the whole load; there is no partial table.

use crate::error::{QuickError, Result};
use crate::shell::Shell;
use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Table shipped inside the binary
const BUILTIN_PATTERNS: &str = include_str!("../../data/patterns.yaml");

/// One trigger -> command mapping
#[derive(Debug, Clone)]
pub struct PatternEntry {
    pub trigger: String,
    pub command: String,
    pub description: String,
    pub shell: Shell,
    pub category: String,
    /// Declaration index across the whole table
    pub position: usize,
    regex: Regex,
}

impl PatternEntry {
    /// Whether the trigger matches anywhere in `text` (case-insensitive)
    pub fn matches(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Length of the trigger source, used as its specificity
    pub fn trigger_len(&self) -> usize {
        self.trigger.chars().count()
    }
}

// Fields are optional here so a missing one gets our own message.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEntry {
    trigger: Option<String>,
    command: Option<String>,
    #[serde(default)]
    description: String,
}

/// Read-only table of pattern entries, in declaration order
#[derive(Debug, Clone)]
pub struct PatternTable {
    entries: Vec<PatternEntry>,
    origin: String,
}

impl PatternTable {
    /// Load a table from a YAML file
    ///
    /// # Returns
    /// * `Ok(PatternTable)` - Every entry parsed and compiled
    /// * `Err(QuickError::Config)` - If the file is unreadable or any entry is malformed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            QuickError::Config(format!("cannot read pattern file {}: {}", path.display(), e))
        })?;

        Self::from_yaml_str(&text, &path.display().to_string())
    }

    /// The table embedded at compile time
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_PATTERNS, "built-in patterns")
    }

    /// Pick the table to use at startup
    ///
    /// An explicit path wins and must load. Otherwise a user table in
    /// `~/.quickcommand/patterns.yaml` is used when present, else the built-in one.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Some(user_path) = Self::user_table_path() {
            if user_path.is_file() {
                return Self::load(user_path);
            }
        }

        Self::builtin()
    }

    /// Location of the optional per-user table
    pub fn user_table_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".quickcommand").join("patterns.yaml"))
    }

    /// Parse a table from YAML text
    ///
    /// `origin` names the source in error messages.
    pub fn from_yaml_str(text: &str, origin: &str) -> Result<Self> {
        let document: Value = serde_yaml::from_str(text)
            .map_err(|e| QuickError::Config(format!("{}: invalid YAML: {}", origin, e)))?;

        let root = document.as_mapping().ok_or_else(|| {
            QuickError::Config(format!(
                "{}: expected a mapping of shell -> category -> entries",
                origin
            ))
        })?;

        let mut entries = Vec::new();

        for (shell_key, categories) in root {
            let shell_name = key_str(shell_key, origin, "shell name")?;
            let shell: Shell = shell_name.parse().map_err(|_| {
                QuickError::Config(format!("{}: unknown shell '{}'", origin, shell_name))
            })?;

            let categories: &Mapping = categories.as_mapping().ok_or_else(|| {
                QuickError::Config(format!(
                    "{}: {}: expected a mapping of category -> entries",
                    origin, shell_name
                ))
            })?;

            for (category_key, list) in categories {
                let category = key_str(category_key, origin, "category name")?;
                let list = list.as_sequence().ok_or_else(|| {
                    QuickError::Config(format!(
                        "{}: {}.{}: expected a list of entries",
                        origin, shell_name, category
                    ))
                })?;

                for (index, raw) in list.iter().enumerate() {
                    let name = format!("{}.{}[{}]", shell_name, category, index);
                    let position = entries.len();
                    entries.push(parse_entry(raw, shell, category, position, &name, origin)?);
                }
            }
        }

        debug!(origin, entries = entries.len(), "loaded pattern table");

        Ok(Self {
            entries,
            origin: origin.to_string(),
        })
    }

    pub fn entries(&self) -> &[PatternEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Where the table was loaded from
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

fn key_str<'a>(key: &'a Value, origin: &str, what: &str) -> Result<&'a str> {
    key.as_str()
        .ok_or_else(|| QuickError::Config(format!("{}: {} must be a string", origin, what)))
}

fn parse_entry(
    raw: &Value,
    shell: Shell,
    category: &str,
    position: usize,
    name: &str,
    origin: &str,
) -> Result<PatternEntry> {
    let bad = |reason: String| QuickError::Config(format!("{}: {}: {}", origin, name, reason));

    let raw: RawEntry = serde_yaml::from_value(raw.clone()).map_err(|e| bad(e.to_string()))?;

    let trigger = raw
        .trigger
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| bad("missing or empty `trigger`".to_string()))?;
    let command = raw
        .command
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| bad("missing or empty `command`".to_string()))?;

    let regex = RegexBuilder::new(&trigger)
        .case_insensitive(true)
        .build()
        .map_err(|e| bad(format!("invalid trigger '{}': {}", trigger, e)))?;

    Ok(PatternEntry {
        trigger,
        command: command.trim().to_string(),
        description: raw.description.trim().to_string(),
        shell,
        category: category.to_string(),
        position,
        regex,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SMALL_TABLE: &str = r#"
powershell:
  services:
    - trigger: 'services|running services'
      command: 'Get-Service | Where-Object {$_.Status -eq ''Running''}'
      description: 'List all running services'
  files:
    - trigger: 'list files'
      command: 'Get-ChildItem'
python:
  packages:
    - trigger: 'pip list'
      command: 'pip list'
      description: 'List packages'
"#;

    fn expect_config_error(text: &str) -> String {
        match PatternTable::from_yaml_str(text, "test") {
            Err(QuickError::Config(msg)) => msg,
            Err(other) => panic!("Expected Config error, got {:?}", other),
            Ok(_) => panic!("Expected Config error, table loaded"),
        }
    }

    #[test]
    fn test_load_preserves_declaration_order() {
        let table = PatternTable::from_yaml_str(SMALL_TABLE, "test").unwrap();

        assert_eq!(table.len(), 3);
        let triggers: Vec<&str> = table.entries().iter().map(|e| e.trigger.as_str()).collect();
        assert_eq!(triggers, vec!["services|running services", "list files", "pip list"]);

        let positions: Vec<usize> = table.entries().iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);

        assert_eq!(table.entries()[0].category, "services");
        assert_eq!(table.entries()[2].shell, Shell::Python);
    }

    #[test]
    fn test_description_defaults_to_empty() {
        let table = PatternTable::from_yaml_str(SMALL_TABLE, "test").unwrap();
        assert_eq!(table.entries()[1].description, "");
    }

    #[test]
    fn test_trigger_is_case_insensitive() {
        let table = PatternTable::from_yaml_str(SMALL_TABLE, "test").unwrap();
        assert!(table.entries()[0].matches("LIST RUNNING SERVICES"));
    }

    #[test]
    fn test_missing_command_names_entry() {
        let msg = expect_config_error(
            "powershell:\n  services:\n    - trigger: 'a'\n      command: 'b'\n    - trigger: 'c'\n",
        );
        assert!(msg.contains("powershell.services[1]"), "{}", msg);
        assert!(msg.contains("command"), "{}", msg);
    }

    #[test]
    fn test_blank_trigger_rejected() {
        let msg = expect_config_error("python:\n  misc:\n    - trigger: '  '\n      command: 'pip list'\n");
        assert!(msg.contains("python.misc[0]"), "{}", msg);
    }

    #[test]
    fn test_unknown_shell_rejected() {
        let msg = expect_config_error("bash:\n  files:\n    - trigger: 'ls'\n      command: 'ls'\n");
        assert!(msg.contains("unknown shell 'bash'"), "{}", msg);
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let msg = expect_config_error(
            "powershell:\n  broken:\n    - trigger: '(unclosed'\n      command: 'Get-Date'\n",
        );
        assert!(msg.contains("powershell.broken[0]"), "{}", msg);
        assert!(msg.contains("invalid trigger"), "{}", msg);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let msg = expect_config_error(
            "powershell:\n  misc:\n    - trigger: 'x'\n      command: 'Get-Date'\n      shel: 'python'\n",
        );
        assert!(msg.contains("powershell.misc[0]"), "{}", msg);
    }

    #[test]
    fn test_non_mapping_documents_rejected() {
        expect_config_error("");
        expect_config_error("- just\n- a list\n");
        expect_config_error("powershell:\n  - trigger: 'x'\n");
        expect_config_error("powershell:\n  misc: 'not a list'\n");
        expect_config_error("powershell: [unclosed");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SMALL_TABLE.as_bytes()).unwrap();

        let table = PatternTable::load(file.path()).unwrap();
        assert_eq!(table.len(), 3);
        assert!(table.origin().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = PatternTable::load(dir.path().join("nope.yaml"));
        assert!(matches!(result, Err(QuickError::Config(_))));
    }

    #[test]
    fn test_discover_explicit_path_must_load() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.yaml");
        assert!(PatternTable::discover(Some(&missing)).is_err());
    }

    #[test]
    fn test_builtin_table_loads() {
        let table = PatternTable::builtin().unwrap();
        assert!(!table.is_empty());
        for shell in Shell::ALL {
            assert!(table.entries().iter().any(|e| e.shell == shell));
        }
    }
}
