//! bookrank CLI
//!
//! Local execution entry point for the collector and its maintenance commands.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bookrank::{
    error::Result,
    models::Config,
    pipeline,
    services::{ItemSource, QiitaSource},
    storage::LocalStorage,
};
use clap::{Parser, Subcommand};

/// bookrank - Tech Book Ranking Collector
#[derive(Parser, Debug)]
#[command(
    name = "bookrank",
    version,
    about = "Ranks technical books by how often popular articles cite them"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true, default_value = "bookrank.toml")]
    config: PathBuf,

    /// Ranking document path (overrides config and RANKING_OUTPUT)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch articles, detect books and write the ranking
    Collect {
        /// Listing pages to fetch (1-10)
        #[arg(long)]
        pages: Option<u32>,

        /// Minimum likes for an article to count
        #[arg(long)]
        min_likes: Option<u64>,

        /// Also accept quoted titles and publisher links as evidence
        #[arg(long)]
        no_strict: bool,

        /// Ignore configured RSS/Atom feeds
        #[arg(long)]
        skip_rss: bool,
    },

    /// Drop stored entries whose ISBN fails the checksum
    Postfilter,

    /// Print a JSON health summary of the stored ranking
    Health,

    /// Show the stored ranking
    Show {
        /// Number of entries to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Validate configuration and the stored ranking
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// File, then environment, then flags.
fn load_config(path: &Path, output: Option<PathBuf>) -> Result<Config> {
    let mut config = if path.exists() {
        let config = Config::load(path)?;
        log::info!("Loaded configuration from {}", path.display());
        config
    } else {
        log::debug!("No config at {}, using defaults", path.display());
        Config::default()
    };
    config.apply_process_env();
    if let Some(output) = output {
        config.output.path = output;
    }
    config.clamp();
    Ok(config)
}

fn build_sources(config: &Config, skip_rss: bool) -> Result<Vec<Box<dyn ItemSource>>> {
    let qiita = QiitaSource::new(config.api.clone(), config.fetch.clone())?;
    let mut sources: Vec<Box<dyn ItemSource>> = Vec::new();

    #[cfg(feature = "rss")]
    if !skip_rss && !config.feeds.urls.is_empty() {
        let feeds =
            bookrank::services::FeedSource::new(&config.feeds, config.fetch.clone(), Some(qiita.clone()))?;
        sources.push(Box::new(qiita));
        sources.push(Box::new(feeds));
        return Ok(sources);
    }
    #[cfg(not(feature = "rss"))]
    if !skip_rss && !config.feeds.urls.is_empty() {
        log::warn!("Built without the rss feature; ignoring {} feed(s)", config.feeds.urls.len());
    }

    sources.push(Box::new(qiita));
    Ok(sources)
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(&cli.config, cli.output)?;
    let storage = LocalStorage::new(&config.output.path);

    match cli.command {
        Command::Collect {
            pages,
            min_likes,
            no_strict,
            skip_rss,
        } => {
            if let Some(pages) = pages {
                config.api.pages = pages;
            }
            if let Some(min_likes) = min_likes {
                config.ranking.min_likes = min_likes;
            }
            if no_strict {
                config.policy.strict = false;
            }
            config.clamp();
            config.validate()?;

            let sources = build_sources(&config, skip_rss)?;
            pipeline::run_collect(&config, &sources, &storage).await?;
        }

        Command::Postfilter => {
            pipeline::run_postfilter(&storage).await?;
        }

        Command::Health => {
            let status = pipeline::run_health(&storage).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }

        Command::Show { limit } => {
            pipeline::run_show(&storage, limit).await?;
        }

        Command::Validate => {
            pipeline::run_validate(&config, &storage).await?;
            log::info!("All validations passed!");
        }
    }

    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}
