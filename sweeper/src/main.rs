// File: sweeper/src/main.rs
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use sweeper::config::validation::validate_schedule;
use sweeper::constants::config::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use sweeper::{
    ConfigManager, CronRecurrence, Database, JobRegistry, JobSchedulerTimer, MaintenanceSweep,
    RecurringScheduler, SqliteRegistry, Validation,
};

#[tokio::main]
async fn main() -> Result<()> {
    let env_filter = EnvFilter::from_default_env()
        .add_directive("sweeper=info".parse()?)
        .add_directive("tokio_cron_scheduler=warn".parse()?)
        .add_directive("sqlx=warn".parse()?);

    fmt().with_env_filter(env_filter).init();

    info!("Starting stale job sweeper");

    // Load configuration
    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config_manager = Arc::new(ConfigManager::new(&config_path).await?);
    let schedule = config_manager.get().await;
    info!(
        "Configuration loaded from {}: enabled={}, cron='{}' ({}), age threshold {} days",
        config_path,
        schedule.enabled,
        schedule.cron_spec,
        schedule.timezone,
        schedule.age_threshold_days
    );

    // Initialize database
    let database = Arc::new(Database::new(config_manager.database_path()).await?);
    info!("Database initialized");

    let registry = Arc::new(SqliteRegistry::new(database.clone()));
    report_validation(&config_manager, registry.as_ref()).await;

    let sweep = MaintenanceSweep::new(registry.clone()).with_history(database.clone());
    let timer = Arc::new(JobSchedulerTimer::new().await?);

    let scheduler = RecurringScheduler::new(config_manager.clone(), CronRecurrence, sweep, timer);
    scheduler.start().await?;
    info!("Maintenance sweep scheduler started");

    let mut hangup = signal(SignalKind::hangup())?;
    let mut terminate = signal(SignalKind::terminate())?;

    loop {
        tokio::select! {
            _ = hangup.recv() => {
                info!("SIGHUP received, reloading configuration");
                match config_manager.reload().await {
                    Ok(_) => {
                        report_validation(&config_manager, registry.as_ref()).await;
                        if let Err(e) = scheduler.start().await {
                            error!("Failed to re-arm maintenance sweep: {}", e);
                        }
                    }
                    Err(e) => error!("Failed to reload configuration, keeping current schedule: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, shutting down");
                break;
            }
            _ = terminate.recv() => {
                info!("SIGTERM received, shutting down");
                break;
            }
        }
    }

    scheduler.cancel().await;
    if let Some(report) = scheduler.last_report().await {
        info!(
            "Last sweep {} acted on {} job(s), excluded {}, failed {}",
            report.id,
            report.acted(),
            report.excluded(),
            report.failed()
        );
    }
    info!("Stale job sweeper stopped after {} sweep(s)", scheduler.fire_count());

    Ok(())
}

async fn report_validation(config_manager: &ConfigManager, registry: &dyn JobRegistry) {
    let job_names: Vec<String> = match registry.list_jobs().await {
        Ok(jobs) => jobs.into_iter().map(|job| job.name).collect(),
        Err(e) => {
            warn!("Could not list jobs for configuration checks: {}", e);
            Vec::new()
        }
    };

    let schedule = config_manager.get().await;
    match validate_schedule(&schedule, &job_names, Utc::now()) {
        Validation::Ok(Some(message)) => info!("{}", message),
        Validation::Ok(None) => {}
        Validation::Warning(message) => warn!("{}", message),
        Validation::Error(message) => error!("{}", message),
    }
}
