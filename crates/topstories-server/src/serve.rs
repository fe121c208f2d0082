use crate::app::{DataStore, Services};
use crate::config::Config;
use crate::healthcheck::HealthcheckReporter;
use crate::scheduler::{ExpirySweeper, RefreshScheduler};
use std::sync::Arc;
use tokio::task::JoinHandle;
use topstories_core::{Clock, HttpHnClient, SystemClock};
use tracing::{info, warn};

/// Open the store and build the production service graph.
pub fn build(config: &Config) -> anyhow::Result<Services<HttpHnClient>> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let kv = Arc::new(DataStore::open(config, clock.clone())?);
    let hn = Arc::new(HttpHnClient::new(
        config.hn_api_base.clone(),
        config.http_timeout(),
    )?);
    info!("Hacker News API: {}", hn.base_url());
    Ok(Services::new(kv, hn, clock))
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    info!("Starting topstories server v{}", env!("CARGO_PKG_VERSION"));
    info!("HTTP: {}", config.http_addr);
    if !config.in_memory {
        info!("Data: {:?}", config.data_dir);
    }

    let services = build(&config)?;

    let healthcheck = config.healthcheck_id.as_ref().map(|id| {
        info!("Healthcheck reporting enabled for scheduled refreshes");
        Arc::new(HealthcheckReporter::new(config.healthcheck_base.clone(), id.clone()))
    });

    // Start scheduled refresh
    let scheduler_task: Option<JoinHandle<()>> = match config.refresh_interval() {
        Some(interval) => {
            let scheduler = RefreshScheduler::new(
                services.refresher.clone(),
                interval,
                healthcheck,
                services.tasks.clone(),
            );
            Some(tokio::spawn(scheduler.run()))
        }
        None => {
            info!("Scheduled refresh disabled");
            None
        }
    };

    // Start expired-key sweeper
    let sweeper_task: Option<JoinHandle<()>> = config
        .sweep_interval()
        .map(|interval| tokio::spawn(ExpirySweeper::new(services.kv.clone(), interval).run()));

    let app = crate::http::create_router(services.app_state());
    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    info!("topstories server ready on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(task) = scheduler_task {
        task.abort();
    }
    if let Some(task) = sweeper_task {
        task.abort();
    }

    let pending = services.tasks.inflight();
    if pending > 0 {
        info!("Waiting for {} background writes...", pending);
    }
    if !services.tasks.drain(config.shutdown_grace()).await {
        warn!(
            "Shutdown grace period elapsed with {} background writes still pending",
            services.tasks.inflight()
        );
    }

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, terminating...");
}
