// The interactive loop: read a request, show the suggestion, ask what to do
// with it. Input and output are generic so tests can drive it with buffers.

use crate::config::Settings;
use crate::core::{Resolver, Suggestion};
use crate::error::Result;
use crate::patterns::{FallbackMatcher, PatternEntry, PatternTable};
use crate::patterns::matcher::to_suggestion;
use crate::session::clipboard::Clipboard;
use crate::session::recommendations::{self, DEFAULT_RECOMMENDATIONS};
use crate::shell::{Dispatcher, ExecutionOutcome, Shell};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::debug;

pub const QUERY_PROMPT: &str = "❯ ";
pub const DECISION_PROMPT: &str = "Execute this command? [y]es / [n]o / [c]opy / [q]uit: ";
pub const NO_SUGGESTION: &str = "Couldn't find a match for that request. Try rephrasing.";
pub const INVALID_INPUT: &str = "That input wasn't valid UTF-8, please type it again.";

const HINT_LIMIT: usize = 3;
const RULE_WIDTH: usize = 60;

/// What the user wants done with a suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Execute,
    Skip,
    Copy,
    Quit,
}

impl Decision {
    /// Parse a reply to the decision prompt; `None` means ask again
    pub fn parse(reply: &str) -> Option<Self> {
        match reply.trim().to_lowercase().as_str() {
            "y" | "yes" => Some(Decision::Execute),
            "n" | "no" | "s" | "skip" => Some(Decision::Skip),
            "c" | "copy" => Some(Decision::Copy),
            "q" | "quit" => Some(Decision::Quit),
            _ => None,
        }
    }
}

/// What happened to one offered suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Ran; `success` is a zero exit status
    Executed { success: bool },
    /// The dispatcher couldn't run it at all
    DispatchFailed,
    Skipped,
    Copied,
    Quit,
}

/// Tally of a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub executed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub unmatched: usize,
    /// A skip or quit stopped the batch early
    pub aborted: bool,
}

impl BatchReport {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Split a `--batch` argument into queries
///
/// Semicolons separate queries when there are any; otherwise commas do.
/// Blank items are dropped.
pub fn split_batch(raw: &str) -> Vec<String> {
    let separator = if raw.contains(';') { ';' } else { ',' };

    raw.split(separator)
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(String::from)
        .collect()
}

pub struct Session {
    resolver: Resolver,
    dispatcher: Dispatcher,
    clipboard: Box<dyn Clipboard>,
    matcher: FallbackMatcher,
    settings: Settings,
    auto_confirm: bool,
    last: Option<Suggestion>,
    recommendations: Vec<PatternEntry>,
    rng: fastrand::Rng,
}

impl Session {
    pub fn new(
        resolver: Resolver,
        dispatcher: Dispatcher,
        clipboard: Box<dyn Clipboard>,
        table: Arc<PatternTable>,
        settings: Settings,
    ) -> Self {
        let auto_confirm = !settings.require_confirmation;

        Self {
            resolver,
            dispatcher,
            clipboard,
            matcher: FallbackMatcher::new(table),
            settings,
            auto_confirm,
            last: None,
            recommendations: Vec::new(),
            rng: fastrand::Rng::new(),
        }
    }

    /// Execute batch suggestions without asking
    pub fn with_auto_confirm(mut self, auto_confirm: bool) -> Self {
        self.auto_confirm = auto_confirm;
        self
    }

    /// Fixed random seed for the recommendation picks
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = fastrand::Rng::with_seed(seed);
        self
    }

    pub fn last_suggestion(&self) -> Option<&Suggestion> {
        self.last.as_ref()
    }

    /// Run the interactive loop until quit or end of input
    pub async fn run<R: BufRead, W: Write>(&mut self, input: &mut R, out: &mut W) -> Result<()> {
        self.print_banner(out)?;
        self.refresh_recommendations(out)?;

        loop {
            write!(out, "{}", QUERY_PROMPT)?;
            out.flush()?;

            let Some(line) = read_line(input, out)? else {
                writeln!(out)?;
                break;
            };
            let line = line.trim();

            match line.to_lowercase().as_str() {
                "" => continue,
                "quit" | "q" | "exit" => break,
                "help" => {
                    self.print_help(out)?;
                    continue;
                }
                "settings" => {
                    self.print_settings(out)?;
                    continue;
                }
                "recommendations" => {
                    self.refresh_recommendations(out)?;
                    continue;
                }
                "last" => {
                    match self.last.clone() {
                        Some(suggestion) => {
                            if self.offer(suggestion, input, out, false)? == Outcome::Quit {
                                break;
                            }
                        }
                        None => writeln!(out, "No suggestion yet.")?,
                    }
                    continue;
                }
                _ => {}
            }

            let suggestion = match self.recommendation(line) {
                Some(picked) => Some(picked),
                None => self.resolve(line, out).await?,
            };

            if let Some(suggestion) = suggestion {
                if self.offer(suggestion, input, out, false)? == Outcome::Quit {
                    break;
                }
            }
        }

        writeln!(out, "Goodbye!")?;
        Ok(())
    }

    /// Resolve, confirm and dispatch each query in turn
    ///
    /// Without auto-confirm a skip (or quit) stops the rest of the batch.
    pub async fn run_batch<R: BufRead, W: Write>(
        &mut self,
        queries: &[String],
        input: &mut R,
        out: &mut W,
    ) -> Result<BatchReport> {
        let mut report = BatchReport::default();

        for (i, query) in queries.iter().enumerate() {
            writeln!(out, "[{}/{}] {}", i + 1, queries.len(), query)?;

            let Some(suggestion) = self.resolve(query, out).await? else {
                report.unmatched += 1;
                continue;
            };

            match self.offer(suggestion, input, out, self.auto_confirm)? {
                Outcome::Executed { success: true } => report.executed += 1,
                Outcome::Executed { success: false } => {
                    report.executed += 1;
                    report.failed += 1;
                }
                Outcome::DispatchFailed => report.failed += 1,
                Outcome::Copied => {}
                Outcome::Skipped | Outcome::Quit => {
                    report.skipped += 1;
                    report.aborted = true;
                    writeln!(out, "Batch stopped.")?;
                    break;
                }
            }
        }

        debug!(?report, "Batch finished");
        Ok(report)
    }

    async fn resolve<W: Write>(&mut self, query: &str, out: &mut W) -> Result<Option<Suggestion>> {
        writeln!(out, "Thinking...")?;

        match self.resolver.resolve(query).await {
            Some(suggestion) => Ok(Some(suggestion)),
            None => {
                writeln!(out, "{}", NO_SUGGESTION)?;
                let hints = self.matcher.closest(query, HINT_LIMIT);
                if !hints.is_empty() {
                    writeln!(out, "Similar requests that work offline:")?;
                    for entry in hints {
                        writeln!(out, "  - {} ({})", describe(entry), entry.command)?;
                    }
                }
                Ok(None)
            }
        }
    }

    /// A recommendation picked by its number, risk-scanned like anything else
    fn recommendation(&self, line: &str) -> Option<Suggestion> {
        let index: usize = line.parse().ok()?;
        let entry = self.recommendations.get(index.checked_sub(1)?)?;
        Some(self.resolver.annotate(to_suggestion(entry)))
    }

    /// Show a suggestion and act on the decision
    fn offer<R: BufRead, W: Write>(
        &mut self,
        suggestion: Suggestion,
        input: &mut R,
        out: &mut W,
        auto_confirm: bool,
    ) -> Result<Outcome> {
        render(&suggestion, out)?;
        self.last = Some(suggestion.clone());

        let decision = if auto_confirm {
            Decision::Execute
        } else {
            ask_decision(input, out)?
        };

        let outcome = match decision {
            Decision::Execute => self.dispatch(&suggestion, out)?,
            Decision::Skip => {
                writeln!(out, "Command cancelled.")?;
                Outcome::Skipped
            }
            Decision::Copy => {
                match self.clipboard.copy(&suggestion.command) {
                    Ok(()) => writeln!(out, "Command copied to clipboard.")?,
                    Err(e) => writeln!(out, "{}", e.user_message())?,
                }
                Outcome::Copied
            }
            Decision::Quit => Outcome::Quit,
        };

        Ok(outcome)
    }

    fn dispatch<W: Write>(&self, suggestion: &Suggestion, out: &mut W) -> Result<Outcome> {
        writeln!(out, "Running...")?;

        match self.dispatcher.execute(suggestion) {
            Ok(outcome) => {
                print_outcome(&outcome, out)?;
                Ok(Outcome::Executed {
                    success: outcome.success(),
                })
            }
            Err(e) => {
                writeln!(out, "{}", e.user_message())?;
                Ok(Outcome::DispatchFailed)
            }
        }
    }

    fn refresh_recommendations<W: Write>(&mut self, out: &mut W) -> Result<()> {
        self.recommendations = recommendations::sample(
            self.matcher.table(),
            DEFAULT_RECOMMENDATIONS,
            &mut self.rng,
        );

        if self.recommendations.is_empty() {
            return Ok(());
        }

        writeln!(out, "\nTry one of these (type its number):")?;
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
        for (i, entry) in self.recommendations.iter().enumerate() {
            writeln!(out, "{:3}. {}", i + 1, describe(entry))?;
            writeln!(out, "     {}", entry.command)?;
        }
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
        Ok(())
    }

    fn print_banner<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "QuickCommand v{}", env!("CARGO_PKG_VERSION"))?;
        writeln!(out, "Describe what you want to do. Type 'help' for help, 'quit' to exit.")?;
        if !self.resolver.has_ai() {
            writeln!(out, "No AI provider configured, using the built-in patterns only.")?;
        }
        Ok(())
    }

    fn print_help<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "\nQuickCommand help")?;
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(out, "Examples:")?;
        writeln!(out, "  list all running services")?;
        writeln!(out, "  install python package for web scraping")?;
        writeln!(out, "  check disk space on C drive")?;
        writeln!(out, "  command for remote group policy update")?;
        writeln!(out)?;
        writeln!(out, "Commands:")?;
        writeln!(out, "  help             show this message")?;
        writeln!(out, "  settings         show the current configuration")?;
        writeln!(out, "  recommendations  show a fresh set of suggestions")?;
        writeln!(out, "  <number>         pick a recommendation")?;
        writeln!(out, "  last             offer the previous suggestion again")?;
        writeln!(out, "  quit, q, exit    leave")?;
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
        Ok(())
    }

    fn print_settings<W: Write>(&self, out: &mut W) -> Result<()> {
        let s = &self.settings;
        let yes_no = |b: bool| if b { "yes" } else { "no" };

        writeln!(out, "\nCurrent settings")?;
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(out, "  AI provider:        {}", s.provider)?;
        writeln!(out, "  AI model:           {}", s.model(s.provider))?;
        writeln!(out, "  Provider chain:     {}", self.resolver.provider_names().join(" -> "))?;
        writeln!(out, "  OpenAI API key:     {}", yes_no(s.openai_api_key.is_some()))?;
        writeln!(out, "  Gemini API key:     {}", yes_no(s.gemini_api_key.is_some()))?;
        writeln!(out, "  AI timeout:         {}s", s.ai_timeout.as_secs())?;
        writeln!(out, "  Default shell:      {}", s.default_shell)?;
        for shell in Shell::ALL {
            writeln!(
                out,
                "  {:<19} {}",
                format!("{} available:", shell.label()),
                yes_no(self.dispatcher.is_available(shell))
            )?;
        }
        writeln!(
            out,
            "  Patterns:           {} ({} entries)",
            self.matcher.table().origin(),
            self.matcher.table().len()
        )?;
        writeln!(out, "  Confirm in batch:   {}", yes_no(!self.auto_confirm))?;
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
        Ok(())
    }
}

fn describe(entry: &PatternEntry) -> &str {
    if entry.description.is_empty() {
        &entry.trigger
    } else {
        &entry.description
    }
}

fn render<W: Write>(suggestion: &Suggestion, out: &mut W) -> Result<()> {
    writeln!(out, "\nSuggested command ({}):", suggestion.source.label())?;
    writeln!(out, "  {}", suggestion.command)?;
    if !suggestion.description.is_empty() {
        writeln!(out, "  {}", suggestion.description)?;
    }
    writeln!(out, "  Shell: {}", suggestion.shell.label())?;
    if let Some(warning) = &suggestion.warning {
        writeln!(out, "  WARNING: {}", warning)?;
    }
    Ok(())
}

fn print_outcome<W: Write>(outcome: &ExecutionOutcome, out: &mut W) -> Result<()> {
    if !outcome.stdout.is_empty() {
        write!(out, "{}", outcome.stdout)?;
        if !outcome.stdout.ends_with('\n') {
            writeln!(out)?;
        }
    }
    if !outcome.stderr.is_empty() {
        write!(out, "{}", outcome.stderr)?;
        if !outcome.stderr.ends_with('\n') {
            writeln!(out)?;
        }
    }

    match outcome.exit_code {
        Some(0) => writeln!(out, "Done (exit 0).")?,
        Some(code) => writeln!(out, "Command failed (exit {}).", code)?,
        None => writeln!(out, "Command was terminated.")?,
    }
    Ok(())
}

/// Ask until we get a usable answer; end of input counts as skip
fn ask_decision<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Decision> {
    loop {
        write!(out, "{}", DECISION_PROMPT)?;
        out.flush()?;

        let Some(reply) = read_line(input, out)? else {
            writeln!(out)?;
            return Ok(Decision::Skip);
        };

        match Decision::parse(&reply) {
            Some(decision) => return Ok(decision),
            None => writeln!(out, "Please answer y, n, c or q.")?,
        }
    }
}

/// One line of input, `None` at end of input
///
/// A line that isn't valid UTF-8 is reported and comes back empty, so the
/// caller asks again.
fn read_line<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Option<String>> {
    let mut buf = Vec::new();
    if input.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }

    match String::from_utf8(buf) {
        Ok(line) => Ok(Some(line)),
        Err(_) => {
            writeln!(out, "{}", INVALID_INPUT)?;
            Ok(Some(String::new()))
        }
    }
}
