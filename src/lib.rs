/// quickcommand library
///
/// Turns plain-language requests into PowerShell or Python commands, using
/// an AI provider when one is configured and a built-in pattern table when not.

pub mod ai;
pub mod config;
pub mod core;
pub mod error;
pub mod patterns;
pub mod session;
pub mod shell;

// Re-exports for convenience
pub use config::Settings;
pub use core::{Resolver, Suggestion};
pub use error::{QuickError, Result};
pub use patterns::PatternTable;
