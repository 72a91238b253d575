use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chime_engine::{EngineConfig, Scheduler, TracingReporter};
use chime_eventbus::LocalEventBus;
use chime_sqlite::{db, TimerPersistence};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = EngineConfig::from_env()?;
    let pool = db::init_db(&config.db_url).await?;

    let store = Arc::new(TimerPersistence::new(pool));
    let bus = Arc::new(LocalEventBus::new(config.bus_buffer));
    let scheduler = Arc::new(Scheduler::new(
        store,
        bus,
        Arc::new(TracingReporter),
        config,
    ));

    let handle = scheduler.start();
    info!("✅ chime timer engine running; Ctrl-C to stop");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
        result = handle => result??,
    }
    Ok(())
}
