// Prompt text for the AI providers

use crate::shell::Shell;

pub const SYSTEM_PROMPT: &str = r#"You turn plain-language requests into a single PowerShell or Python command for a system administrator or developer.

Reply with one JSON object and nothing else:
{
    "command": "the exact command to run",
    "description": "one sentence on what it does",
    "shell": "powershell" or "python",
    "warning": "why it is dangerous, or an empty string"
}

Rules:
- PowerShell for Windows administration, services, files, networking and the registry.
- Python (including pip) for packages, data work and cross-platform scripting.
- One command only. No Markdown, no alternatives, no explanation outside the JSON.
- Prefer read-only commands. Never pick a broader command than the request needs.
- Fill "warning" for anything that deletes data, changes accounts, edits the registry or restarts the machine.
- Use placeholders such as 'ServiceName' when the request leaves a name open.

The user reviews the command before it runs."#;

/// The per-request prompt
pub fn user_prompt(request: &str, shell: Shell) -> String {
    format!(
        r#"Request: "{}"
Default shell: {}
Operating system: {}

Reply with the JSON object only."#,
        request.trim(),
        shell.name(),
        std::env::consts::OS
    )
}

/// System and user prompt in one block, for providers without a system role
pub fn combined_prompt(request: &str, shell: Shell) -> String {
    format!("{}\n\n{}", SYSTEM_PROMPT, user_prompt(request, shell))
}
