//! timeline-ingest binary entrypoint.
//! Parses the command line, loads configuration and runs one ingestion command to completion.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use timeline_ingest::bootstrap::Runtime;
use timeline_ingest::config::{load_tuning_default, Settings};
use timeline_ingest::debug::{default_export_path, export_records};
use timeline_ingest::ingest::stats::RunStats;
use timeline_ingest::ingest::{run_subjects, IngestMode};
use timeline_ingest::refresh::UserRefresher;
use timeline_ingest::store::Subject;

/// Ingest user timelines into the tweet store.
#[derive(Parser)]
#[command(name = "timeline-ingest")]
#[command(about = "Timeline ingestion pipeline")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the latest page for every enabled subject (AI-gated classification)
    Incremental {
        /// Max subjects to process
        #[arg(long, env = "USER_LIMIT")]
        limit: Option<usize>,

        /// Read subjects and existing tweets from the store; discard every write
        #[arg(long)]
        dry_run: bool,
    },

    /// Walk one user's timeline without the age filter (rule-table classification)
    History {
        /// Screen name of the user
        handle: String,

        /// Upstream rest id; resolved from the handle when omitted
        user_id: Option<String>,

        /// Export persisted records as JSON (default debug/all_tweet_{handle}.json)
        #[arg(long)]
        export: Option<Option<PathBuf>>,

        /// Check existing tweets against the store; discard every write
        #[arg(long)]
        dry_run: bool,
    },

    /// Re-resolve every named author and update the stored profile
    RefreshUsers,
}

/// Compact logs; `RUST_LOG` wins, otherwise `DEBUG=true` raises the crate to debug.
fn init_tracing() {
    let debug = std::env::var("DEBUG")
        .ok()
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"));
    let default = if debug {
        "timeline_ingest=debug,ingest=debug,info"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before anything reads the environment.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let tuning = load_tuning_default().context("loading ingest tunables")?;

    match cli.command {
        Commands::Incremental { limit, dry_run } => {
            let settings = Settings::from_env(!dry_run)?;
            let limit = limit.unwrap_or(settings.user_limit);
            let rt = Runtime::build(settings, tuning, dry_run)?;

            let subjects = rt.store.list_subjects(limit).await.context("listing subjects")?;
            tracing::info!(count = subjects.len(), limit, "subjects loaded");

            let driver = rt.driver(IngestMode::Incremental)?;
            let mut stats = RunStats::default();
            run_subjects(&driver, &subjects, rt.tuning.subject_delay(), &mut stats).await;
            println!("{stats}");
        }

        Commands::History {
            handle,
            user_id,
            export,
            dry_run,
        } => {
            let settings = Settings::from_env(!dry_run)?;
            let rt = Runtime::build(settings, tuning, dry_run)?;

            let rest_id = match user_id {
                Some(id) => id,
                None => match rt.timeline.lookup_user(&handle).await {
                    Ok(user) => match user.rest_id.filter(|id| !id.is_empty()) {
                        Some(id) => id,
                        None => bail!("could not resolve a user id for @{handle}; pass USER_ID explicitly\n\nUsage: timeline-ingest history <HANDLE> [USER_ID]"),
                    },
                    Err(e) => bail!("could not resolve @{handle}: {e}; pass USER_ID explicitly\n\nUsage: timeline-ingest history <HANDLE> [USER_ID]"),
                },
            };
            let subject = Subject {
                rest_id,
                screen_name: handle.clone(),
                name: None,
            };

            let driver = rt.driver(IngestMode::FullHistory)?;
            let mut stats = RunStats::default();
            let records =
                run_subjects(&driver, std::slice::from_ref(&subject), rt.tuning.subject_delay(), &mut stats)
                    .await;

            if let Some(path) = export {
                let path = path.unwrap_or_else(|| default_export_path(&handle));
                export_records(&path, &records)?;
                println!("Exported {} records to {}", records.len(), path.display());
            }
            println!("{stats}");
        }

        Commands::RefreshUsers => {
            let settings = Settings::from_env(true)?;
            let rt = Runtime::build(settings, tuning, false)?;
            let refresher =
                UserRefresher::new(rt.store.clone(), rt.timeline.clone(), rt.tuning.refresh_delay());
            let stats = refresher.run().await.context("listing authors")?;
            println!("{stats}");
        }
    }

    Ok(())
}
