/// Application settings
///
/// Read from environment variables (a `.env` file is loaded first by the
/// binary). A missing API key is not an error: it just means no AI provider.

use crate::error::{QuickError, Result};
use crate::shell::Shell;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_AI_TIMEOUT_SECS: u64 = 8;
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Which AI service to ask first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderChoice {
    OpenAi,
    Gemini,
    /// Pattern matching only
    Fallback,
}

impl ProviderChoice {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderChoice::OpenAi => "openai",
            ProviderChoice::Gemini => "gemini",
            ProviderChoice::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for ProviderChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ProviderChoice {
    type Err = QuickError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderChoice::OpenAi),
            "gemini" | "google" => Ok(ProviderChoice::Gemini),
            "fallback" | "none" | "offline" => Ok(ProviderChoice::Fallback),
            other => Err(QuickError::Config(format!("Unknown AI provider: '{}'", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub provider: ProviderChoice,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub openai_model: String,
    pub gemini_model: String,
    pub openai_base_url: String,
    pub gemini_base_url: String,
    pub ai_timeout: Duration,
    pub default_shell: Shell,
    pub log_level: String,
    pub patterns_path: Option<PathBuf>,
    pub risk_patterns: Vec<String>,
    pub require_confirmation: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: ProviderChoice::Fallback,
            openai_api_key: None,
            gemini_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            ai_timeout: Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS),
            default_shell: Shell::PowerShell,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            patterns_path: None,
            risk_patterns: Vec::new(),
            require_confirmation: true,
        }
    }
}

impl Settings {
    /// Settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Settings from any key -> value source
    ///
    /// # Returns
    /// * `Err(QuickError::Config)` - For values that can't be used at all
    ///   (bad timeout). Unknown provider or shell names only log a warning.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut settings = Settings {
            openai_api_key: get("OPENAI_API_KEY"),
            gemini_api_key: get("GEMINI_API_KEY"),
            ..Settings::default()
        };

        settings.provider = match get("AI_PROVIDER") {
            Some(name) => name.parse().unwrap_or_else(|_| {
                warn!(provider = %name, "unknown AI_PROVIDER, using pattern matching only");
                ProviderChoice::Fallback
            }),
            None => settings.detect_provider(),
        };

        if let Some(model) = get("OPENAI_MODEL") {
            settings.openai_model = model;
        }
        if let Some(model) = get("GEMINI_MODEL") {
            settings.gemini_model = model;
        }
        if let Some(model) = get("AI_MODEL") {
            settings.set_primary_model(model);
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            settings.openai_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(url) = get("GEMINI_BASE_URL") {
            settings.gemini_base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(raw) = get("AI_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| {
                QuickError::Config(format!("AI_TIMEOUT_SECS must be a whole number, got '{}'", raw))
            })?;
            if secs == 0 {
                return Err(QuickError::Config("AI_TIMEOUT_SECS must be at least 1".to_string()));
            }
            settings.ai_timeout = Duration::from_secs(secs);
        }

        if let Some(name) = get("DEFAULT_SHELL") {
            settings.default_shell = name.parse().unwrap_or_else(|_| {
                warn!(shell = %name, "unknown DEFAULT_SHELL, using powershell");
                Shell::PowerShell
            });
        }

        settings.log_level = log_level(&get);

        settings.patterns_path = get("QUICKCOMMAND_PATTERNS").map(PathBuf::from);

        if let Some(raw) = get("RISK_PATTERNS") {
            settings.risk_patterns = raw
                .split(';')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }

        if let Some(raw) = get("REQUIRE_CONFIRMATION") {
            settings.require_confirmation = parse_flag(&raw);
        }

        Ok(settings)
    }

    /// First provider with a key: OpenAI, then Gemini
    fn detect_provider(&self) -> ProviderChoice {
        if self.openai_api_key.is_some() {
            ProviderChoice::OpenAi
        } else if self.gemini_api_key.is_some() {
            ProviderChoice::Gemini
        } else {
            ProviderChoice::Fallback
        }
    }

    /// Override the model of whichever provider is primary
    pub fn set_primary_model(&mut self, model: String) {
        match self.provider {
            ProviderChoice::OpenAi => self.openai_model = model,
            ProviderChoice::Gemini => self.gemini_model = model,
            ProviderChoice::Fallback => {}
        }
    }

    pub fn api_key(&self, provider: ProviderChoice) -> Option<&str> {
        match provider {
            ProviderChoice::OpenAi => self.openai_api_key.as_deref(),
            ProviderChoice::Gemini => self.gemini_api_key.as_deref(),
            ProviderChoice::Fallback => None,
        }
    }

    /// AI providers to try, in order
    ///
    /// The primary comes first and the other service is the alternate.
    /// Providers without a key are left out, so no key at all means an empty
    /// chain (pattern matching only).
    pub fn ai_chain(&self) -> Vec<ProviderChoice> {
        let order = match self.provider {
            ProviderChoice::OpenAi => [ProviderChoice::OpenAi, ProviderChoice::Gemini],
            ProviderChoice::Gemini => [ProviderChoice::Gemini, ProviderChoice::OpenAi],
            ProviderChoice::Fallback => return Vec::new(),
        };

        order
            .into_iter()
            .filter(|p| self.api_key(*p).is_some())
            .collect()
    }

    pub fn model(&self, provider: ProviderChoice) -> &str {
        match provider {
            ProviderChoice::OpenAi => &self.openai_model,
            ProviderChoice::Gemini => &self.gemini_model,
            ProviderChoice::Fallback => "",
        }
    }
}

/// Log filter from the environment alone
///
/// Logging has to be up before the full settings load, or their warnings
/// would go nowhere.
pub fn log_level_from_env() -> String {
    log_level(|key| env::var(key).ok().filter(|v| !v.trim().is_empty()))
}

fn log_level(get: impl Fn(&str) -> Option<String>) -> String {
    if let Some(level) = get("LOG_LEVEL") {
        level.trim().to_string()
    } else if get("VERBOSE_OUTPUT").map(|v| parse_flag(&v)).unwrap_or(false) {
        "debug".to_string()
    } else {
        DEFAULT_LOG_LEVEL.to_string()
    }
}

fn parse_flag(raw: &str) -> bool {
    !matches!(raw.trim().to_lowercase().as_str(), "false" | "0" | "no" | "off")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_no_keys_means_fallback_only() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.provider, ProviderChoice::Fallback);
        assert!(s.ai_chain().is_empty());
        assert_eq!(s.default_shell, Shell::PowerShell);
        assert_eq!(s.ai_timeout, Duration::from_secs(DEFAULT_AI_TIMEOUT_SECS));
        assert!(s.require_confirmation);
    }

    #[test]
    fn test_provider_detected_from_keys() {
        let s = settings(&[("GEMINI_API_KEY", "g")]).unwrap();
        assert_eq!(s.provider, ProviderChoice::Gemini);
        assert_eq!(s.ai_chain(), vec![ProviderChoice::Gemini]);

        let s = settings(&[("GEMINI_API_KEY", "g"), ("OPENAI_API_KEY", "o")]).unwrap();
        assert_eq!(s.provider, ProviderChoice::OpenAi);
        assert_eq!(s.ai_chain(), vec![ProviderChoice::OpenAi, ProviderChoice::Gemini]);
    }

    #[test]
    fn test_explicit_primary_orders_chain() {
        let s = settings(&[
            ("AI_PROVIDER", "gemini"),
            ("GEMINI_API_KEY", "g"),
            ("OPENAI_API_KEY", "o"),
        ])
        .unwrap();
        assert_eq!(s.ai_chain(), vec![ProviderChoice::Gemini, ProviderChoice::OpenAi]);
    }

    #[test]
    fn test_fallback_provider_ignores_keys() {
        let s = settings(&[("AI_PROVIDER", "fallback"), ("OPENAI_API_KEY", "o")]).unwrap();
        assert!(s.ai_chain().is_empty());
    }

    #[test]
    fn test_unknown_values_fall_back() {
        let s = settings(&[
            ("AI_PROVIDER", "ollama"),
            ("DEFAULT_SHELL", "zsh"),
            ("OPENAI_API_KEY", "o"),
        ])
        .unwrap();
        assert_eq!(s.provider, ProviderChoice::Fallback);
        assert_eq!(s.default_shell, Shell::PowerShell);
    }

    #[test]
    fn test_blank_key_is_unset() {
        let s = settings(&[("OPENAI_API_KEY", "   ")]).unwrap();
        assert!(s.openai_api_key.is_none());
        assert_eq!(s.provider, ProviderChoice::Fallback);
    }

    #[test]
    fn test_ai_model_overrides_primary_only() {
        let s = settings(&[
            ("AI_PROVIDER", "gemini"),
            ("GEMINI_API_KEY", "g"),
            ("AI_MODEL", "gemini-1.5-pro"),
        ])
        .unwrap();
        assert_eq!(s.gemini_model, "gemini-1.5-pro");
        assert_eq!(s.openai_model, DEFAULT_OPENAI_MODEL);
    }

    #[test]
    fn test_timeout_parsing() {
        let s = settings(&[("AI_TIMEOUT_SECS", "3")]).unwrap();
        assert_eq!(s.ai_timeout, Duration::from_secs(3));

        assert!(matches!(
            settings(&[("AI_TIMEOUT_SECS", "soon")]),
            Err(QuickError::Config(_))
        ));
        assert!(matches!(
            settings(&[("AI_TIMEOUT_SECS", "0")]),
            Err(QuickError::Config(_))
        ));
    }

    #[test]
    fn test_misc_keys() {
        let s = settings(&[
            ("DEFAULT_SHELL", "python"),
            ("RISK_PATTERNS", "drop table; ;truncate"),
            ("REQUIRE_CONFIRMATION", "false"),
            ("QUICKCOMMAND_PATTERNS", "/tmp/p.yaml"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
            ("VERBOSE_OUTPUT", "true"),
        ])
        .unwrap();

        assert_eq!(s.default_shell, Shell::Python);
        assert_eq!(s.risk_patterns, vec!["drop table", "truncate"]);
        assert!(!s.require_confirmation);
        assert_eq!(s.patterns_path, Some(PathBuf::from("/tmp/p.yaml")));
        assert_eq!(s.openai_base_url, "http://localhost:8080/v1");
        assert_eq!(s.log_level, "debug");
    }
}
