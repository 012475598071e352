//! TicketFlow Daemon - Main Entry Point
//! Runs crash recovery, then a pool of pipeline workers over the durable
//! run queue.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ticketflow_core::application::recovery::RecoveryService;
use ticketflow_core::application::retry::RetryPolicy;
use ticketflow_core::application::worker::constants::DEFAULT_RETRY_BASE_DELAY_MS;
use ticketflow_core::application::{
    shutdown_channel, AnalysisClient, NotificationDispatcher, PipelineWorker, TicketPipeline,
};
use ticketflow_core::port::time_provider::SystemTimeProvider;
use ticketflow_infra_ai::{AiConfig, HttpAnalysisProvider};
use ticketflow_infra_mail::{HttpMailer, MailConfig};
use ticketflow_infra_sqlite::{
    create_pool, run_migrations, SqliteRunRepository, SqliteTicketRepository, SqliteUserRepository,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_DB_PATH: &str = "~/.ticketflow/tickets.db";
const DEFAULT_WORKERS: usize = 2;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    let log_format = env_or("TICKETFLOW_LOG_FORMAT", "pretty");

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("ticketflow=info"))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("TicketFlow v{} starting...", VERSION);

    // 2. Load configuration
    let db_path = std::env::var("TICKETFLOW_DB_PATH")
        .unwrap_or_else(|_| shellexpand::tilde(DEFAULT_DB_PATH).into_owned());

    let workers: usize = std::env::var("TICKETFLOW_WORKERS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_WORKERS);

    let ai_config = AiConfig {
        endpoint: env_or("TICKETFLOW_AI_ENDPOINT", &AiConfig::default().endpoint),
        api_key: env_or("TICKETFLOW_AI_API_KEY", ""),
        model: env_or("TICKETFLOW_AI_MODEL", &AiConfig::default().model),
        ..AiConfig::default()
    };

    let mail_config = MailConfig {
        endpoint: env_or("TICKETFLOW_MAIL_ENDPOINT", &MailConfig::default().endpoint),
        api_key: env_or("TICKETFLOW_MAIL_API_KEY", ""),
        from: env_or("TICKETFLOW_MAIL_FROM", &MailConfig::default().from),
        ..MailConfig::default()
    };

    info!(db_path = %db_path, "Initializing database...");

    // 3. Initialize database
    let pool = create_pool(&db_path).await?;
    run_migrations(&pool).await?;

    // 4. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let ticket_repo = Arc::new(SqliteTicketRepository::new(pool.clone()));
    let user_repo = Arc::new(SqliteUserRepository::new(pool.clone()));
    let run_repo = Arc::new(SqliteRunRepository::new(pool.clone()));

    let analysis = AnalysisClient::new(Arc::new(HttpAnalysisProvider::new(ai_config)?));
    let dispatcher = NotificationDispatcher::new(Arc::new(HttpMailer::new(mail_config)?));

    let pipeline = Arc::new(TicketPipeline::new(
        analysis,
        ticket_repo,
        user_repo,
        dispatcher,
        time_provider.clone(),
    ));

    let retry_policy = Arc::new(RetryPolicy::new(DEFAULT_RETRY_BASE_DELAY_MS));

    // 5. Run crash recovery
    info!("Running crash recovery...");
    let recovery_service = RecoveryService::new(
        run_repo.clone(),
        time_provider.clone(),
        None, // Use default recovery window
    );

    match recovery_service.recover_orphaned_runs().await {
        Ok(count) => info!(recovered_runs = count, "Crash recovery completed"),
        Err(e) => tracing::error!(error = ?e, "Crash recovery failed"),
    }

    // 6. Start workers
    info!(workers, "Starting pipeline workers...");
    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let mut handles = Vec::with_capacity(workers);
    for n in 0..workers {
        let worker = PipelineWorker::new(
            run_repo.clone(),
            pipeline.clone(),
            retry_policy.clone(),
            time_provider.clone(),
        );
        let shutdown = shutdown_rx.clone();
        handles.push(tokio::spawn(async move {
            if let Err(e) = worker.run(shutdown).await {
                tracing::error!(worker = n, error = ?e, "Worker failed");
            }
        }));
    }

    info!("System ready. Waiting for runs...");
    info!("Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown
    shutdown_tx.shutdown();
    for handle in handles {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    info!("Shutdown complete.");

    Ok(())
}
