mod commands;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tour_roster::config::Config;

use commands::RosterParams;

#[derive(Parser)]
#[command(
    name = "tour-roster",
    version,
    about = "Publish monthly tour rosters with fair-share guide assignment",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// TOML configuration file; environment variables are used when absent
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Override the bind address (e.g. 127.0.0.1:8080)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Print the proposed roster for next month
    Preview {
        /// Add an afternoon tour every day
        #[arg(long, default_value = "false")]
        afternoon: bool,

        /// Manual assignment DATE[@HH:MM]=GUIDE_ID (repeatable)
        #[arg(short, long = "assign")]
        assign: Vec<String>,

        /// Plan relative to this day instead of today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Print JSON instead of a table
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Compute next month's roster and publish it
    Publish {
        /// Add an afternoon tour every day
        #[arg(long, default_value = "false")]
        afternoon: bool,

        /// Manual assignment DATE[@HH:MM]=GUIDE_ID (repeatable)
        #[arg(short, long = "assign")]
        assign: Vec<String>,

        /// Plan relative to this day instead of today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Create the PostgreSQL schema
    InitDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let log_format = cli
        .log_format
        .clone()
        .unwrap_or_else(|| config.logging.format.clone());
    setup_tracing(&log_format, &config.logging.level, cli.verbose)?;

    tracing::info!(backend = ?config.database.backend, "tour-roster starting");

    match cli.command {
        Commands::Serve { bind } => {
            tracing::info!(bind = ?bind, "Starting serve command");
            commands::serve(config, bind).await?;
        }

        Commands::Preview {
            afternoon,
            assign,
            today,
            json,
        } => {
            tracing::info!(
                afternoon = %afternoon,
                assignments = assign.len(),
                today = ?today,
                "Starting preview command"
            );
            let params = RosterParams {
                include_afternoon: afternoon,
                assignments: assign,
                today,
            };
            commands::preview(config, params, json).await?;
        }

        Commands::Publish {
            afternoon,
            assign,
            today,
        } => {
            tracing::info!(
                afternoon = %afternoon,
                assignments = assign.len(),
                today = ?today,
                "Starting publish command"
            );
            let params = RosterParams {
                include_afternoon: afternoon,
                assignments: assign,
                today,
            };
            commands::publish(config, params).await?;
        }

        Commands::InitDb => {
            tracing::info!("Starting init-db command");
            commands::init_db(config).await?;
        }
    }

    tracing::info!("tour-roster completed successfully");
    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("tour_roster=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("tour_roster={level},warn")))
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
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
