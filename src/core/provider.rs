/// Suggestion providers
///
/// Everything that can turn a request into a suggestion (an AI service or the
/// local pattern matcher) implements the same trait, so the resolver can walk
/// them as an ordered list.

use crate::core::Suggestion;
use crate::shell::Shell;
use async_trait::async_trait;
use thiserror::Error;

/// Why a provider produced no suggestion
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Missing, empty or rejected API key
    #[error("not authenticated: {0}")]
    Unauthenticated(String),

    /// Provider refused because of rate limits or exhausted quota
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Network failure, timeout or server error
    #[error("unreachable: {0}")]
    Unreachable(String),

    /// The reply couldn't be turned into a valid suggestion
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Pattern matcher found nothing
    #[error("no matching pattern")]
    NoMatch,
}

impl ProviderError {
    /// Whether the next AI provider in line is worth trying after this failure
    ///
    /// A rate limit or a garbled reply goes straight to the pattern matcher.
    pub fn allows_alternate(&self) -> bool {
        matches!(
            self,
            ProviderError::Unreachable(_) | ProviderError::Unauthenticated(_)
        )
    }
}

/// Broad provider category, used to order and label providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Ai,
    Fallback,
}

#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// Short name for logs and the settings screen
    fn name(&self) -> &str;

    fn kind(&self) -> ProviderKind;

    /// Turn a request into one suggestion
    async fn suggest(&self, query: &str, shell_hint: Shell) -> Result<Suggestion, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternate_policy() {
        assert!(ProviderError::Unreachable("timeout".into()).allows_alternate());
        assert!(ProviderError::Unauthenticated("401".into()).allows_alternate());
        assert!(!ProviderError::RateLimited("429".into()).allows_alternate());
        assert!(!ProviderError::MalformedResponse("no command".into()).allows_alternate());
        assert!(!ProviderError::NoMatch.allows_alternate());
    }
}
