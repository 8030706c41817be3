// quickcommand - say what you want, get the PowerShell or Python command
//
// Entry point. Loads config, builds the provider chain and hands off to the
// interactive session (or runs a batch).

use anyhow::{bail, Context};
use clap::Parser;
use quickcommand_lib::{
    config::{log_level_from_env, ProviderChoice},
    session::{split_batch, Session, SystemClipboard},
    shell::{Dispatcher, Shell},
    PatternTable, Resolver, Settings,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quickcommand", version)]
#[command(about = "Describe what you want in plain words, get the PowerShell or Python command for it", long_about = None)]
struct Cli {
    /// Default shell for suggestions (powershell or python)
    #[arg(short, long)]
    shell: Option<Shell>,

    /// Model for the primary AI provider
    #[arg(short, long)]
    model: Option<String>,

    /// Primary AI provider (openai, gemini or fallback)
    #[arg(long)]
    provider: Option<ProviderChoice>,

    /// Pattern table to use instead of the default one
    #[arg(long)]
    patterns: Option<PathBuf>,

    /// Run these requests and exit (separated by ';' or ',')
    #[arg(short, long)]
    batch: Option<String>,

    /// Run batch suggestions without asking
    #[arg(short, long)]
    yes: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // A missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut settings = Settings::from_env().context("Invalid configuration")?;

    if let Some(provider) = cli.provider {
        settings.provider = provider;
    }
    if let Some(model) = cli.model {
        settings.set_primary_model(model);
    }
    if let Some(shell) = cli.shell {
        settings.default_shell = shell;
    }
    if cli.patterns.is_some() {
        settings.patterns_path = cli.patterns;
    }

    let table = PatternTable::discover(settings.patterns_path.as_deref())
        .context("Could not load the pattern table")?;
    let table = Arc::new(table);

    let resolver = Resolver::from_settings(&settings, Arc::clone(&table))
        .context("Could not set up suggestion providers")?;

    let auto_confirm = cli.yes || !settings.require_confirmation;
    let mut session = Session::new(
        resolver,
        Dispatcher::with_defaults(),
        Box::new(SystemClipboard::new()),
        table,
        settings,
    )
    .with_auto_confirm(auto_confirm);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Some(raw) = cli.batch {
        let queries = split_batch(&raw);
        if queries.is_empty() {
            bail!("--batch needs at least one request");
        }

        let report = session.run_batch(&queries, &mut input, &mut out).await?;
        writeln!(
            out,
            "\n{} executed, {} failed, {} without a suggestion{}",
            report.executed,
            report.failed,
            report.unmatched,
            if report.aborted { ", stopped early" } else { "" }
        )?;

        return Ok(if report.has_failures() {
            ExitCode::from(2)
        } else {
            ExitCode::SUCCESS
        });
    }

    session.run(&mut input, &mut out).await?;
    Ok(ExitCode::SUCCESS)
}

/// Logs go to stderr so they never mix with command output
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level_from_env()))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
