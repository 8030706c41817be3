// Offline matcher: finds the best pattern entry for a request
//
// Used when there's no AI provider or when it fails. It never guesses: no
// matching trigger means no suggestion.

use crate::core::{ProviderError, ProviderKind, Source, Suggestion, SuggestionProvider};
use crate::patterns::{PatternEntry, PatternTable};
use crate::shell::Shell;
use async_trait::async_trait;
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::sync::Arc;
use tracing::debug;

// Words shorter than this add noise to the fuzzy hints
const MIN_HINT_WORD_LEN: usize = 3;

pub struct FallbackMatcher {
    table: Arc<PatternTable>,
    fuzzy: SkimMatcherV2,
}

impl FallbackMatcher {
    pub fn new(table: Arc<PatternTable>) -> Self {
        Self {
            table,
            fuzzy: SkimMatcherV2::default(),
        }
    }

    pub fn table(&self) -> &PatternTable {
        &self.table
    }

    /// Best matching entry for a query
    ///
    /// Longest trigger text wins. On equal length the entry declared first wins.
    pub fn find(&self, query: &str) -> Option<&PatternEntry> {
        let normalized = query.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        let mut best: Option<&PatternEntry> = None;

        // Entries come in declaration order, so keeping the current best on a
        // tie keeps the earlier one.
        for entry in self.table.entries() {
            if !entry.matches(&normalized) {
                continue;
            }

            best = match best {
                Some(current) if current.trigger_len() >= entry.trigger_len() => Some(current),
                _ => Some(entry),
            };
        }

        if let Some(entry) = best {
            debug!(trigger = %entry.trigger, category = %entry.category, "fallback match");
        }

        best
    }

    /// Best match as a suggestion
    pub fn match_query(&self, query: &str) -> Option<Suggestion> {
        self.find(query).map(to_suggestion)
    }

    /// Entries that look close to the query, for "did you mean" hints
    ///
    /// Scores each word of the query against the entry's description and
    /// trigger. Never used to build a suggestion.
    pub fn closest(&self, query: &str, limit: usize) -> Vec<&PatternEntry> {
        let normalized = query.trim().to_lowercase();
        let words: Vec<&str> = normalized
            .split_whitespace()
            .filter(|w| w.chars().count() >= MIN_HINT_WORD_LEN)
            .collect();

        if words.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(i64, &PatternEntry)> = self
            .table
            .entries()
            .iter()
            .filter_map(|entry| {
                let haystack = format!("{} {}", entry.description, entry.trigger).to_lowercase();
                let score: i64 = words
                    .iter()
                    .filter_map(|word| self.fuzzy.fuzzy_match(&haystack, word))
                    .sum();
                (score > 0).then_some((score, entry))
            })
            .collect();

        // Stable sort keeps declaration order among equal scores
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(limit);

        scored.into_iter().map(|(_, entry)| entry).collect()
    }
}

/// Build a fallback suggestion from an entry
pub fn to_suggestion(entry: &PatternEntry) -> Suggestion {
    Suggestion::new(
        entry.command.clone(),
        entry.description.clone(),
        entry.shell,
        Source::Fallback,
    )
}

#[async_trait]
impl SuggestionProvider for FallbackMatcher {
    fn name(&self) -> &str {
        "patterns"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Fallback
    }

    async fn suggest(&self, query: &str, _shell_hint: Shell) -> Result<Suggestion, ProviderError> {
        self.match_query(query).ok_or(ProviderError::NoMatch)
    }
}
