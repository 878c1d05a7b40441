use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cronloop::{
    config::{Config, JobEntry},
    scheduling::{CronJob, CronSpec, JobId, Scheduler},
};

#[derive(Parser)]
#[command(name = "cronloop")]
#[command(version)]
#[command(about = "Cron-style job scheduler daemon")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("cronloop={}", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cronloop v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load_from_file(&cli.config)?;
    info!("Configuration loaded from: {}", cli.config);

    let scheduler = Scheduler::new();

    for (index, entry) in config.jobs.iter().enumerate() {
        let schedule: CronSpec = entry.schedule.parse().with_context(|| {
            format!(
                "job '{}' has an invalid schedule '{}'",
                entry.name, entry.schedule
            )
        })?;
        scheduler.add_or_update(Arc::new(command_job(index as JobId, schedule, entry)));
        info!("Registered job '{}' ({})", entry.name, entry.schedule);
    }

    if config.jobs.is_empty() {
        warn!("No jobs configured, scheduler will idle");
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Received shutdown signal, stopping scheduler");
    scheduler.shutdown();

    Ok(())
}

/// Build a job that runs the entry's command through `sh -c`.
///
/// Exit status is the dispatched task's own concern: it is logged here and
/// never reported back to the scheduler.
fn command_job(id: JobId, schedule: CronSpec, entry: &JobEntry) -> CronJob {
    let name = entry.name.clone();
    let command = entry.command.clone();
    CronJob::new(id, schedule, move || {
        let name = name.clone();
        let command = command.clone();
        Box::pin(async move {
            info!("Running job '{}'", name);
            match tokio::process::Command::new("sh")
                .arg("-c")
                .arg(&command)
                .status()
                .await
            {
                Ok(status) if status.success() => info!("Job '{}' finished", name),
                Ok(status) => error!("Job '{}' exited with {}", name, status),
                Err(e) => error!("Job '{}' failed to start: {}", name, e),
            }
        })
    })
}
