//! Buildeta CLI - predicts when queued builds will start

mod logging;

use anyhow::{Context, Result};
use buildeta_core::application::{DispatchEstimate, DispatchEstimator, EstimatorConfig};
use buildeta_core::domain::{Job, Worker};
use buildeta_core::port::time_provider::{FixedTimeProvider, SystemTimeProvider};
use buildeta_core::port::TimeProvider;
use buildeta_infra_sqlite::{
    create_pool, load_snapshot, run_migrations, SqliteBuildQueue, SqliteWorkerRegistry,
};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tabled::{Table, Tabled};
use tracing::info;

const DEFAULT_DB_PATH: &str = "~/.buildeta/snapshot.db";

#[derive(Parser)]
#[command(name = "buildeta")]
#[command(about = "Build dispatch-time estimator", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Snapshot database path
    #[arg(long, env = "BUILDETA_DB_PATH", default_value = DEFAULT_DB_PATH)]
    db: String,

    /// Minimum reported dispatch delay, in seconds
    #[arg(long, env = "BUILDETA_MIN_DELAY_SECS", default_value = "5")]
    min_delay_secs: i64,

    /// Remaining time assumed for builds past their estimate, in seconds
    #[arg(long, env = "BUILDETA_OVERRUN_SECS", default_value = "120")]
    overrun_secs: i64,

    /// Emit JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate when one waiting job will start
    Estimate {
        /// Job ID
        job_id: i64,

        /// Estimate as of this instant (epoch ms) instead of now
        #[arg(long)]
        at: Option<i64>,
    },

    /// Estimate every waiting job, in dispatch order
    Queue,

    /// Show builder capacity per platform
    Workers,

    /// Replace the snapshot database with a JSON export of the farm
    Import {
        /// File with `{"workers": [...], "jobs": [...]}`
        path: PathBuf,
    },
}

/// JSON export of the farm accepted by `import`
#[derive(Debug, Deserialize)]
struct FarmExport {
    #[serde(default)]
    workers: Vec<Worker>,
    #[serde(default)]
    jobs: Vec<Job>,
}

#[derive(Serialize, Tabled)]
struct QueueRow {
    job_id: i64,
    score: i64,
    platform: String,
    wait: String,
    delay: String,
    starts: String,
}

#[derive(Serialize, Tabled)]
struct CapacityRow {
    platform: String,
    builders: usize,
}

fn format_secs(ms: i64) -> String {
    format!("{}s", ms / 1000)
}

fn format_instant(epoch_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| epoch_ms.to_string())
}

fn database_url(db: &str) -> Result<String> {
    let path = PathBuf::from(shellexpand::tilde(db).into_owned());
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    Ok(format!("sqlite://{}", path.display()))
}

fn print_estimate(job_id: i64, estimate: Option<&DispatchEstimate>, now: i64) {
    match estimate {
        Some(e) => {
            println!(
                "{} job {} starts around {} (in {})",
                "✓".green().bold(),
                job_id,
                format_instant(e.start_at).bold(),
                format_secs(e.start_at - now)
            );
            println!("  {} {}", "Platform:".bold(), e.platform);
            println!("  {} {}", "Head of queue:".bold(), e.head_platform);
            println!("  {} {}", "Wait for worker:".bold(), format_secs(e.wait_ms));
            println!("  {} {}", "Queue delay:".bold(), format_secs(e.delay_ms));
        }
        None => {
            println!(
                "{} job {}: unknown, no capable worker",
                "?".yellow().bold(),
                job_id
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init()?;
    let cli = Cli::parse();

    let config = EstimatorConfig {
        min_dispatch_delay_ms: cli.min_delay_secs.saturating_mul(1000),
        overrun_fallback_ms: cli.overrun_secs.saturating_mul(1000),
    };

    let url = database_url(&cli.db)?;
    info!(db = %url, "Opening snapshot database");
    let pool = create_pool(&url).await?;
    run_migrations(&pool).await?;

    let time_provider: Arc<dyn TimeProvider> = match &cli.command {
        Commands::Estimate { at: Some(at), .. } => Arc::new(FixedTimeProvider(*at)),
        _ => Arc::new(SystemTimeProvider),
    };

    let estimator = DispatchEstimator::new(
        Arc::new(SqliteWorkerRegistry::new(pool.clone())),
        Arc::new(SqliteBuildQueue::new(pool.clone())),
        time_provider.clone(),
    )
    .with_config(config)?;

    match cli.command {
        Commands::Estimate { job_id, .. } => {
            let now = time_provider.now_millis();
            let estimate = estimator.estimate_job(job_id).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&estimate)?);
            } else {
                print_estimate(job_id, estimate.as_ref(), now);
            }
        }

        Commands::Queue => {
            let now = time_provider.now_millis();
            let entries = estimator.estimate_queue().await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("{}", "No waiting jobs".yellow());
            } else {
                let rows: Vec<QueueRow> = entries
                    .iter()
                    .map(|entry| match &entry.estimate {
                        Some(e) => QueueRow {
                            job_id: entry.job.id,
                            score: entry.job.score,
                            platform: e.platform.to_string(),
                            wait: format_secs(e.wait_ms),
                            delay: format_secs(e.delay_ms),
                            starts: format!("in {}", format_secs(e.start_at - now)),
                        },
                        None => QueueRow {
                            job_id: entry.job.id,
                            score: entry.job.score,
                            platform: entry.job.platform().to_string(),
                            wait: "-".to_string(),
                            delay: "-".to_string(),
                            starts: "unknown".to_string(),
                        },
                    })
                    .collect();
                println!("{}", Table::new(rows));
            }
        }

        Commands::Workers => {
            let capacity = estimator.capacity().await?;

            let mut rows: Vec<CapacityRow> = [false, true]
                .into_iter()
                .map(|virtualized| CapacityRow {
                    platform: buildeta_core::domain::Platform::independent(virtualized)
                        .to_string(),
                    builders: capacity.total(virtualized),
                })
                .collect();
            rows.extend(capacity.platforms().map(|(platform, builders)| CapacityRow {
                platform: platform.to_string(),
                builders,
            }));

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("{}", Table::new(rows));
            }
        }

        Commands::Import { path } => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let export: FarmExport =
                serde_json::from_str(&raw).context("Invalid farm export JSON")?;

            load_snapshot(&pool, &export.workers, &export.jobs).await?;

            println!(
                "{} imported {} workers and {} jobs",
                "✓".green().bold(),
                export.workers.len(),
                export.jobs.len()
            );
        }
    }

    Ok(())
}
