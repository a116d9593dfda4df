//! Gitpulse CLI - command-line interface for the activity synchronizer.

mod commands;
mod config;
mod progress;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gitpulse")]
#[command(version)]
#[command(about = "Incremental GitHub activity synchronizer")]
#[command(
    long_about = "Gitpulse pulls activity data (commits, pull requests, issues, reviews) for a \
configured set of repositories from the GitHub API and stores it in a local \
database, or writes it out as static JSON snapshots. Syncs are incremental: \
each run resumes from the newest stored record and skips duplicates."
)]
#[command(after_long_help = r#"EXAMPLES
    Sync all tracked repositories incrementally:
        $ gitpulse sync

    Rebuild a date window from scratch (clears and refetches it):
        $ gitpulse sync --since 2024-01-01 --until 2024-03-31

    Write JSON snapshots instead of using the database:
        $ gitpulse snapshot --out ./snapshots

    Apply database migrations:
        $ gitpulse migrate up

CONFIGURATION
    Gitpulse reads configuration from:
      1. ~/.config/gitpulse/config.toml (or $XDG_CONFIG_HOME/gitpulse/config.toml)
      2. ./gitpulse.toml
      3. Environment variables (GITPULSE_* prefix, e.g. GITPULSE_GITHUB_TOKEN)
      4. .env file in the current directory

    Tracked repositories live in a line-oriented file (default
    config.properties), one `owner/name=snapshot-target` entry per line.

ENVIRONMENT VARIABLES
    GITPULSE_DATABASE_URL     Database connection string (default: ~/.local/state/gitpulse/gitpulse.db)
    GITPULSE_GITHUB_TOKEN     GitHub personal access token
    GITHUB_TOKEN              Fallback token variable
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Sync tracked repositories into the database
    Sync {
        #[command(flatten)]
        opts: SyncArgs,
    },
    /// Write JSON snapshots of tracked repositories
    Snapshot {
        #[command(flatten)]
        opts: SnapshotArgs,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

/// Fetch options shared by sync and snapshot.
#[derive(Debug, Clone, clap::Args)]
struct FetchArgs {
    /// Tracked repositories file
    #[arg(short, long, default_value = "config.properties")]
    repos: PathBuf,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    since: Option<String>,

    /// End date (YYYY-MM-DD)
    #[arg(long)]
    until: Option<String>,

    /// Maximum items to fetch per endpoint (default from config, unlimited otherwise)
    #[arg(short, long)]
    cap: Option<usize>,

    /// Maximum pull requests to expand reviews for (default from config, all otherwise)
    #[arg(long)]
    max_review_prs: Option<usize>,
}

#[derive(Debug, Clone, clap::Args)]
struct SyncArgs {
    #[command(flatten)]
    fetch: FetchArgs,

    /// Insert everything fetched, skipping natural-key deduplication
    #[arg(long)]
    no_dedupe: bool,
}

#[derive(Debug, Clone, clap::Args)]
struct SnapshotArgs {
    #[command(flatten)]
    fetch: FetchArgs,

    /// Output directory for snapshot documents
    #[arg(short, long, default_value = "snapshots")]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Structured logging for non-TTY runs; the TTY gets console markers.
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("gitpulse=info,gitpulse_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    let config = config::Config::load();

    let cli = Cli::parse();

    // Completions need neither config nor database.
    if let Commands::Completions { shell } = &cli.command {
        commands::meta::handle_completions(*shell)?;
        return Ok(());
    }

    let database_url = config
        .database_url()
        .expect("Failed to determine database URL - this should not happen");

    // Ensure the database directory exists for SQLite.
    if database_url.starts_with("sqlite://") {
        let db_path = database_url.trim_start_matches("sqlite://");
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        let db_path = std::path::Path::new(db_path);

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    match cli.command {
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Sync { opts } => {
            commands::sync::handle_sync(opts, &config, &database_url).await?;
        }
        Commands::Snapshot { opts } => {
            commands::snapshot::handle_snapshot(opts, &config).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
