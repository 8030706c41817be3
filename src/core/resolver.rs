/// Suggestion resolution
///
/// Walks an ordered provider chain (primary AI, alternate AI, pattern
/// matcher) and returns the first suggestion, with risk annotation applied
/// whatever its source. Provider failures are logged and never surface to
/// the caller.

use crate::ai;
use crate::config::Settings;
use crate::core::{ProviderKind, RiskScanner, Source, Suggestion, SuggestionProvider};
use crate::error::Result;
use crate::patterns::{FallbackMatcher, PatternTable};
use crate::shell::Shell;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct Resolver {
    providers: Vec<Box<dyn SuggestionProvider>>,
    risk: RiskScanner,
    shell_hint: Shell,
}

impl Resolver {
    /// Create a resolver over an explicit provider chain
    ///
    /// # Arguments
    /// * `providers` - Tried in order; AI providers should come before the matcher
    /// * `risk` - Scanner applied to every suggestion
    /// * `shell_hint` - Default shell passed to each provider
    pub fn new(providers: Vec<Box<dyn SuggestionProvider>>, risk: RiskScanner, shell_hint: Shell) -> Self {
        Self {
            providers,
            risk,
            shell_hint,
        }
    }

    /// Build the standard chain from settings
    ///
    /// AI providers without a key are left out; the pattern matcher always
    /// closes the chain.
    ///
    /// # Returns
    /// * `Err(QuickError::Config)` - An extra risk pattern doesn't compile
    pub fn from_settings(settings: &Settings, table: Arc<PatternTable>) -> Result<Self> {
        let mut providers: Vec<Box<dyn SuggestionProvider>> = Vec::new();

        for choice in settings.ai_chain() {
            match ai::build_provider(choice, settings) {
                Ok(Some(provider)) => providers.push(provider),
                Ok(None) => {}
                Err(e) => warn!(provider = %choice, error = %e, "Could not set up AI provider"),
            }
        }

        providers.push(Box::new(FallbackMatcher::new(table)));

        let risk = RiskScanner::with_extra(&settings.risk_patterns)?;
        let resolver = Self::new(providers, risk, settings.default_shell);
        debug!(chain = ?resolver.provider_names(), "Provider chain ready");

        Ok(resolver)
    }

    /// Names of the providers in the chain, in order
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn has_ai(&self) -> bool {
        self.providers.iter().any(|p| p.kind() == ProviderKind::Ai)
    }

    pub fn shell_hint(&self) -> Shell {
        self.shell_hint
    }

    /// Apply the risk scan to a suggestion that didn't come through `resolve`
    pub fn annotate(&self, suggestion: Suggestion) -> Suggestion {
        self.risk.annotate(suggestion)
    }

    /// Resolve a request into at most one suggestion
    ///
    /// # Returns
    /// * `None` - Blank request, or no provider produced anything
    pub async fn resolve(&self, query: &str) -> Option<Suggestion> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        // Set once an AI failure rules out the remaining AI providers
        let mut skip_ai = false;

        for provider in &self.providers {
            let kind = provider.kind();
            if kind == ProviderKind::Ai && skip_ai {
                continue;
            }

            match provider.suggest(query, self.shell_hint).await {
                Ok(mut suggestion) => {
                    if suggestion.command.trim().is_empty() {
                        warn!(provider = provider.name(), "Provider returned an empty command");
                        if kind == ProviderKind::Ai {
                            skip_ai = true;
                        }
                        continue;
                    }

                    suggestion.source = match kind {
                        ProviderKind::Ai => Source::Ai,
                        ProviderKind::Fallback => Source::Fallback,
                    };

                    debug!(provider = provider.name(), command = %suggestion.command, "Resolved request");
                    return Some(self.risk.annotate(suggestion));
                }
                Err(e) => {
                    if kind == ProviderKind::Ai {
                        warn!(provider = provider.name(), error = %e, "AI suggestion failed");
                        if !e.allows_alternate() {
                            skip_ai = true;
                        }
                    } else {
                        debug!(provider = provider.name(), error = %e, "No suggestion");
                    }
                }
            }
        }

        None
    }
}
