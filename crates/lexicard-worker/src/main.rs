//! lexicard-worker - background reminder worker binary.

use std::sync::Arc;

use lexicard_core::{
    DailySummaryTrigger, LexicardConfig, Notifier, ReminderScheduler, SchedulerLoop, SqliteStore,
    StatsService, SystemClock, TracingNotifier, WebhookNotifier,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn load_config() -> Result<LexicardConfig, Box<dyn std::error::Error>> {
    match std::env::var("LEXICARD_CONFIG") {
        Ok(path) => {
            info!(path = %path, "Loading configuration file");
            Ok(LexicardConfig::from_file(path)?)
        }
        Err(_) => Ok(LexicardConfig::from_env()?),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
                .add_directive("lexicard_core=debug".parse()?)
                .add_directive("lexicard_worker=debug".parse()?),
        )
        .init();

    let config = load_config()?;

    let store = Arc::new(
        SqliteStore::new(&config.database_path)?
            .with_default_reminder_interval(config.default_reminder_interval_minutes),
    );
    info!(path = %config.database_path.display(), "Database opened");

    let notifier: Arc<dyn Notifier> = if config.notifier.webhook_url.is_some() {
        let webhook = WebhookNotifier::new(config.notifier.clone())?;
        info!(url = webhook.url(), "Delivering through webhook");
        Arc::new(webhook)
    } else {
        info!("No webhook configured, messages are only logged");
        Arc::new(TracingNotifier::new())
    };

    let mut reminders = ReminderScheduler::new(store.clone(), store.clone(), notifier.clone());
    if let Some(seed) = config.scheduler.rng_seed {
        reminders = reminders.with_rng_seed(seed);
    }
    let summaries = DailySummaryTrigger::new(
        store.clone(),
        StatsService::new(store.clone(), store.clone()),
        notifier,
        &config.scheduler,
    );
    let scheduler = SchedulerLoop::new(
        store,
        reminders,
        summaries,
        Arc::new(SystemClock),
        config.scheduler.clone(),
    );

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            info!("Shutdown signal received, stopping scheduler...");
            shutdown.cancel();
        }
    });

    scheduler.run(shutdown).await;

    info!("Worker stopped cleanly");
    Ok(())
}
