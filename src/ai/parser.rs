/// AI reply parsing
///
/// Models are asked for JSON but don't always comply. JSON is tried first,
/// then a loose text form. Anything without a usable command is rejected
/// outright; there are no half-filled suggestions.

use crate::core::{ProviderError, Source, Suggestion};
use crate::shell::Shell;
use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct RawReply {
    command: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    shell: Option<String>,
    #[serde(default)]
    warning: Option<String>,
}

/// Turn a model reply into a suggestion
///
/// # Arguments
/// * `content` - The reply text
/// * `shell_hint` - Shell to use when the reply doesn't name one
///
/// # Returns
/// * `Err(ProviderError::MalformedResponse)` - Missing command or unsupported shell
pub fn parse_reply(content: &str, shell_hint: Shell) -> Result<Suggestion, ProviderError> {
    let cleaned = strip_code_fences(content);
    if cleaned.is_empty() {
        return Err(ProviderError::MalformedResponse("empty reply".to_string()));
    }

    if let Some(object) = find_json_object(cleaned) {
        return from_json(object, shell_hint);
    }

    parse_text(cleaned, shell_hint)
}

fn from_json(object: Value, shell_hint: Shell) -> Result<Suggestion, ProviderError> {
    let raw: RawReply = serde_json::from_value(object)
        .map_err(|e| ProviderError::MalformedResponse(format!("bad reply fields: {}", e)))?;

    let command = raw
        .command
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ProviderError::MalformedResponse("reply has no command".to_string()))?;

    let shell = match raw.shell.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => name.parse::<Shell>().map_err(|_| {
            ProviderError::MalformedResponse(format!("unsupported shell '{}'", name))
        })?,
        None => shell_hint,
    };

    Ok(Suggestion::new(
        command,
        raw.description.unwrap_or_default().trim(),
        shell,
        Source::Ai,
    )
    .with_warning(raw.warning))
}

// Text replies: "Command: ..." / "Description: ..." lines, or the first
// line that isn't a comment.
fn parse_text(content: &str, shell_hint: Shell) -> Result<Suggestion, ProviderError> {
    let mut command: Option<String> = None;
    let mut description = String::new();

    for line in content.lines().map(str::trim) {
        if let Some(rest) = strip_label(line, "command:") {
            command = Some(rest.to_string());
        } else if let Some(rest) = strip_label(line, "description:") {
            description = rest.to_string();
        } else if command.is_none() && !line.is_empty() && !line.starts_with('#') {
            command = Some(line.to_string());
        }
    }

    let command = command
        .map(|c| c.trim_matches('`').trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ProviderError::MalformedResponse("reply has no command".to_string()))?;

    Ok(Suggestion::new(command, description, shell_hint, Source::Ai))
}

fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let head = line.get(..label.len())?;
    if head.eq_ignore_ascii_case(label) {
        Some(line[label.len()..].trim())
    } else {
        None
    }
}

/// Drop a surrounding Markdown code fence, if any
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Skip the info string (```json, ```powershell)
    let body = match after_open.find('\n') {
        Some(newline) => &after_open[newline + 1..],
        None => after_open,
    };

    body.trim_end().trim_end_matches("```").trim()
}

/// The reply as a JSON object, if it contains one
fn find_json_object(content: &str) -> Option<Value> {
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(content) {
        return Some(value);
    }

    // Chatty models wrap the object in prose
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end <= start {
        return None;
    }

    match serde_json::from_str::<Value>(&content[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_reply() {
        let reply = r#"{"command": "Get-Service", "description": "List services", "shell": "powershell", "warning": ""}"#;
        let s = parse_reply(reply, Shell::Python).unwrap();

        assert_eq!(s.command, "Get-Service");
        assert_eq!(s.description, "List services");
        assert_eq!(s.shell, Shell::PowerShell);
        assert_eq!(s.source, Source::Ai);
        assert_eq!(s.warning, None);
    }

    #[test]
    fn test_parse_fenced_json_with_warning() {
        let reply = "```json\n{\"command\": \"pip uninstall -y requests\", \"shell\": \"python\", \"warning\": \"Removes a package\"}\n```";
        let s = parse_reply(reply, Shell::PowerShell).unwrap();

        assert_eq!(s.command, "pip uninstall -y requests");
        assert_eq!(s.shell, Shell::Python);
        assert_eq!(s.warning.as_deref(), Some("Removes a package"));
    }

    #[test]
    fn test_missing_shell_uses_hint() {
        let s = parse_reply(r#"{"command": "pip list"}"#, Shell::Python).unwrap();
        assert_eq!(s.shell, Shell::Python);
        assert_eq!(s.description, "");
    }

    #[test]
    fn test_json_without_command_is_malformed() {
        let err = parse_reply(r#"{"description": "nothing to run"}"#, Shell::PowerShell).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));

        let err = parse_reply(r#"{"command": "   "}"#, Shell::PowerShell).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[test]
    fn test_unknown_shell_is_malformed() {
        let err = parse_reply(r#"{"command": "ls -la", "shell": "bash"}"#, Shell::PowerShell).unwrap_err();
        match err {
            ProviderError::MalformedResponse(msg) => assert!(msg.contains("bash")),
            other => panic!("Expected MalformedResponse, got {:?}", other),
        }
    }

    #[test]
    fn test_json_wrapped_in_prose() {
        let reply = "Sure! Here you go:\n{\"command\": \"Get-NetAdapter\", \"shell\": \"powershell\"}\nHope that helps.";
        let s = parse_reply(reply, Shell::Python).unwrap();
        assert_eq!(s.command, "Get-NetAdapter");
    }

    #[test]
    fn test_text_reply_with_labels() {
        let reply = "Command: Get-Process | Sort-Object CPU -Descending\nDescription: Top CPU users";
        let s = parse_reply(reply, Shell::PowerShell).unwrap();

        assert_eq!(s.command, "Get-Process | Sort-Object CPU -Descending");
        assert_eq!(s.description, "Top CPU users");
        assert_eq!(s.shell, Shell::PowerShell);
    }

    #[test]
    fn test_text_reply_with_braces_is_not_json() {
        let reply = "Get-Service | Where-Object {$_.Status -eq 'Running'}";
        let s = parse_reply(reply, Shell::PowerShell).unwrap();
        assert_eq!(s.command, reply);
    }

    #[test]
    fn test_text_reply_first_non_comment_line() {
        let reply = "# here's the command\n`Get-LocalUser`\n";
        let s = parse_reply(reply, Shell::PowerShell).unwrap();
        assert_eq!(s.command, "Get-LocalUser");
    }

    #[test]
    fn test_empty_reply_is_malformed() {
        assert!(matches!(
            parse_reply("  ", Shell::PowerShell),
            Err(ProviderError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_reply("```\n```", Shell::PowerShell),
            Err(ProviderError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_reply("# only a comment", Shell::PowerShell),
            Err(ProviderError::MalformedResponse(_))
        ));
    }
}
