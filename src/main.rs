use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tracing::error;
use visual_search_backend::{AppConfig, AppState, IngestionReport, SearchResult, TranslationOutcome, telemetry};

mod cli;

use cli::{Cli, Command, SearchArgs};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine; the environment may be set by the caller.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    telemetry::init(&cli.log_level);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{e:#}"), "command failed");
            eprintln!("{} {e:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let cfg = AppConfig::from_env().context("loading configuration")?;
    let state = AppState::init(cfg).await.context("initializing backend")?;

    let outcome = execute(&state, cli.command).await;
    state.shutdown().await.context("shutting down")?;
    outcome
}

async fn execute(state: &AppState, command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Ingest { folder, json } => {
            let report = state
                .ingest(&folder)
                .await
                .with_context(|| format!("ingesting {}", folder.display()))?;
            print_report(&report, json)?;
            // Partial failures are reported but still a completed run.
            Ok(ExitCode::SUCCESS)
        }
        Command::SearchText { query, opts } => {
            let results = state
                .search_by_text(&query, opts.k, opts.category.as_deref())
                .await
                .context("text search")?;
            print_results(&results, &opts)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::SearchImage { file, opts } => {
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("reading {}", file.display()))?;
            let results = state
                .search_by_image(&bytes, opts.k, opts.category.as_deref())
                .await
                .context("image search")?;
            print_results(&results, &opts)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Translate { query } => {
            let t = state.translate_detailed(&query).await;
            match &t.outcome {
                TranslationOutcome::Fallback(reason) => {
                    println!("{}  {}", t.text, format!("(fallback: {reason})").yellow());
                }
                _ => println!("{}", t.text),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_results(results: &[SearchResult], opts: &SearchArgs) -> anyhow::Result<()> {
    if opts.json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }
    if results.is_empty() {
        println!("{}", "no results".dimmed());
        return Ok(());
    }
    for r in results {
        println!(
            "{:>3}  {}  {:<14} {}",
            r.rank,
            format!("{:.4}", r.score).green(),
            r.category.cyan(),
            r.path
        );
    }
    Ok(())
}

fn print_report(report: &IngestionReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    println!("{}", report.to_string().bold());
    for f in &report.failures {
        println!("  {} [{}] {}: {}", "failed".red(), f.stage, f.path.display(), f.reason);
    }
    Ok(())
}
