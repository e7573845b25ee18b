//! Laurel reconciliation worker runtime.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use laurel_application::{AchievementService, AuthorizationService, ReconciliationReport};
use laurel_core::{AppError, AppResult};
use laurel_infrastructure::{
    InMemoryPermissionCache, MongoAchievementStore, PostgresProfileRepository,
    PostgresReferenceLedger, PostgresRolePermissionRepository,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct WorkerConfig {
    database_url: String,
    mongodb_url: String,
    mongodb_database: String,
    document_store_timeout: Duration,
    run_once: bool,
    interval: Duration,
    grace: chrono::Duration,
    lookback: chrono::Duration,
    batch_size: u32,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;
    let pool = connect_pool(config.database_url.as_str()).await?;
    let achievement_service = build_achievement_service(pool, &config).await?;

    info!(
        interval_seconds = config.interval.as_secs(),
        grace_seconds = config.grace.num_seconds(),
        lookback_seconds = config.lookback.num_seconds(),
        batch_size = config.batch_size,
        "laurel-worker started"
    );

    if config.run_once {
        let report = reconcile(&achievement_service, &config).await?;
        log_report(report);
        return Ok(());
    }

    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match reconcile(&achievement_service, &config).await {
                    Ok(report) => log_report(report),
                    Err(reconcile_error) => {
                        error!(error = %reconcile_error, "reconciliation pass failed");
                    }
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(signal_error) = signal {
                    warn!(error = %signal_error, "failed to listen for shutdown signal");
                }
                info!("laurel-worker stopping");
                return Ok(());
            }
        }
    }
}

async fn reconcile(
    achievement_service: &AchievementService,
    config: &WorkerConfig,
) -> AppResult<ReconciliationReport> {
    achievement_service
        .reconcile_orphans(Utc::now(), config.grace, config.lookback, config.batch_size)
        .await
}

fn log_report(report: ReconciliationReport) {
    if report.repaired > 0 {
        warn!(
            scanned = report.scanned,
            repaired = report.repaired,
            "repaired orphaned achievements"
        );
    } else {
        info!(scanned = report.scanned, "reconciliation pass found no orphans");
    }
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

async fn build_achievement_service(
    pool: PgPool,
    config: &WorkerConfig,
) -> AppResult<AchievementService> {
    let store = MongoAchievementStore::connect(
        config.mongodb_url.as_str(),
        config.mongodb_database.as_str(),
        config.document_store_timeout,
    )
    .await?;

    let authorization_service = AuthorizationService::new(
        Arc::new(PostgresRolePermissionRepository::new(pool.clone())),
        Arc::new(InMemoryPermissionCache::default()),
    );

    Ok(AchievementService::new(
        authorization_service,
        Arc::new(store),
        Arc::new(PostgresReferenceLedger::new(pool.clone())),
        Arc::new(PostgresProfileRepository::new(pool)),
    ))
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;
        let mongodb_url = required_env("MONGODB_URL")?;
        let mongodb_database =
            env::var("MONGODB_DATABASE").unwrap_or_else(|_| "laurel".to_owned());
        let run_once = env::args().nth(1).as_deref() == Some("once");

        let document_store_timeout = parse_env_u64("DOCUMENT_STORE_TIMEOUT_SECONDS", 10)?;
        let interval = parse_env_u64("RECONCILE_INTERVAL_SECONDS", 60)?;
        let grace = parse_env_i64("RECONCILE_GRACE_SECONDS", 300)?;
        let lookback = parse_env_i64("RECONCILE_LOOKBACK_SECONDS", 86_400)?;
        let batch_size = parse_env_u32("RECONCILE_BATCH_SIZE", 200)?;

        if document_store_timeout == 0 {
            return Err(AppError::Validation(
                "DOCUMENT_STORE_TIMEOUT_SECONDS must be greater than zero".to_owned(),
            ));
        }

        if interval == 0 {
            return Err(AppError::Validation(
                "RECONCILE_INTERVAL_SECONDS must be greater than zero".to_owned(),
            ));
        }

        if grace < 0 || lookback <= grace {
            return Err(AppError::Validation(
                "RECONCILE_LOOKBACK_SECONDS must exceed a non-negative RECONCILE_GRACE_SECONDS"
                    .to_owned(),
            ));
        }

        if batch_size == 0 {
            return Err(AppError::Validation(
                "RECONCILE_BATCH_SIZE must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            mongodb_url,
            mongodb_database,
            document_store_timeout: Duration::from_secs(document_store_timeout),
            run_once,
            interval: Duration::from_secs(interval),
            grace: chrono::Duration::seconds(grace),
            lookback: chrono::Duration::seconds(lookback),
            batch_size,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

fn parse_env_u32(name: &str, default: u32) -> AppResult<u32> {
    match env::var(name) {
        Ok(value) => value.parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_i64(name: &str, default: i64) -> AppResult<i64> {
    match env::var(name) {
        Ok(value) => value.parse::<i64>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
