//! Command line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "visual-search-backend", version, about = "Ingest images and search them by text or example")]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset.
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Index every image below FOLDER; category = parent directory name.
    Ingest {
        folder: PathBuf,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Search with free text (translated by the LLM first).
    SearchText {
        query: String,
        #[command(flatten)]
        opts: SearchArgs,
    },
    /// Search with an example image.
    SearchImage {
        file: PathBuf,
        #[command(flatten)]
        opts: SearchArgs,
    },
    /// Show how a query would be rewritten.
    Translate { query: String },
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Number of results.
    #[arg(short = 'k', long = "top-k", default_value_t = 10)]
    pub k: usize,
    /// Only return images from this category.
    #[arg(long)]
    pub category: Option<String>,
    /// Print results as JSON.
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_search_text() {
        let cli = Cli::try_parse_from([
            "visual-search-backend",
            "search-text",
            "a furry feline",
            "-k",
            "3",
            "--category",
            "animals",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Command::SearchText { query, opts } => {
                assert_eq!(query, "a furry feline");
                assert_eq!(opts.k, 3);
                assert_eq!(opts.category.as_deref(), Some("animals"));
                assert!(opts.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
