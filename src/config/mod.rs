/// Configuration module
///
/// Environment-driven settings: API keys, provider choice, default shell,
/// timeouts and log verbosity.

pub mod settings;

pub use settings::{log_level_from_env, ProviderChoice, Settings};
