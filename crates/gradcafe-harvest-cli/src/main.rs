//! `gradcafe`: scrape, pull, clean and standardize GradCafe survey results.

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::CrawlArgs;
use gradcafe_harvest::HarvestConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gradcafe", version, about = "Polite GradCafe survey harvester")]
struct Cli {
    /// Machine-readable JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    /// Only print errors
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl survey pages and print the parsed records without storing them
    Scrape {
        #[command(flatten)]
        crawl: CrawlArgs,

        /// Write the records to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Crawl until caught up with the database, then clean new rows
    Pull {
        #[command(flatten)]
        crawl: CrawlArgs,
    },
    /// Run the score and campus-name cleanup passes
    Cleanup,
    /// Standardize one "program, university" string
    Standardize {
        text: String,

        /// Skip the inference server
        #[arg(long)]
        offline: bool,
    },
    /// Insert records from an exported JSON file
    Load {
        file: PathBuf,

        #[arg(long)]
        offline: bool,
    },
    /// Standardize stored rows that have no standardized names yet
    Backfill {
        #[arg(long)]
        offline: bool,
    },
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "gradcafe=warn" } else { "gradcafe=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.json {
        std::env::set_var("GRADCAFE_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("GRADCAFE_QUIET", "1");
    }
    init_tracing(cli.quiet);

    let config = HarvestConfig::from_env();

    match cli.command {
        Commands::Scrape { crawl, output } => {
            cli::scrape_cmd::run(&config, &crawl, output.as_deref()).await
        }
        Commands::Pull { crawl } => cli::pull_cmd::run(&config, &crawl).await,
        Commands::Cleanup => cli::cleanup_cmd::run(&config),
        Commands::Standardize { text, offline } => {
            cli::standardize_cmd::run(&config, &text, offline).await
        }
        Commands::Load { file, offline } => cli::load_cmd::run(&config, &file, offline).await,
        Commands::Backfill { offline } => cli::backfill_cmd::run(&config, offline).await,
    }
}
