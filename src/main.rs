use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rotamap::commands;
use rotamap::config::Config;

#[derive(Parser)]
#[command(
    name = "rotamap",
    version,
    about = "Rotating sitemap generator with durable locator discovery",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover locators, rotate a selection and write the sitemap
    Generate {
        /// Override the configured number of feed entries
        #[arg(short, long)]
        target: Option<usize>,

        /// Select from the existing pool without scanning the site
        #[arg(long, default_value = "false")]
        skip_discovery: bool,

        /// Selection date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Grow the locator pool without emitting a feed
    Discover,

    /// Show pool, rotation cycle and feed state
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };

    match cli.command {
        Commands::Generate {
            target,
            skip_discovery,
            date,
        } => {
            tracing::info!(
                target = ?target,
                skip_discovery,
                date = ?date,
                "Starting generate command"
            );

            let options = commands::generate::GenerateOptions {
                target,
                skip_discovery,
                date,
            };
            let summary = commands::generate::run(&config, &options).await?;

            if summary.feed_written {
                println!(
                    "OK: wrote {} product URLs to {} (new: {}, pool: {}, reset: {})",
                    summary.selected,
                    config.storage.sitemap_path.display(),
                    summary.new_locators,
                    summary.pool_size,
                    summary.did_reset
                );
            } else {
                println!(
                    "OK: kept existing feed with {} entries at {}",
                    summary.feed_entries,
                    config.storage.sitemap_path.display()
                );
            }
        }

        Commands::Discover => {
            tracing::info!("Starting discover command");
            commands::discover::run(&config).await?;
        }

        Commands::Status => {
            commands::status::run(&config)?;
        }
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("rotamap=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("rotamap=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}
