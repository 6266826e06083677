//! Rightsizer server
//!
//! Loads workload data once at startup, then serves scope summaries and
//! recommendations until interrupted.

use anyhow::Result;
use engine_lib::{
    health::{components, HealthRegistry},
    InMemorySource, RecommendationComputer, StructuredLogger, SummarizeService, SummaryCache,
};
use rightsizer_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting rightsizer-server");

    let config = ServerConfig::load()?;
    let logger = StructuredLogger::new(&config.instance_name);
    logger.log_startup(SERVER_VERSION, &config.sub_categories);

    let health_registry = HealthRegistry::new();
    health_registry.register(components::SOURCE).await;
    health_registry.register(components::CACHE).await;

    let computer = RecommendationComputer::new(config.duration_sub_categories()?)?;
    let source = match &config.data_path {
        Some(path) => {
            let source = InMemorySource::load_json(path, &computer).await?;
            logger.log_source_loaded(&path.display().to_string(), source.len());
            source
        }
        None => {
            health_registry
                .set_degraded(components::SOURCE, "RIGHTSIZER_DATA_PATH not set, serving no workloads")
                .await;
            InMemorySource::default()
        }
    };

    let service = Arc::new(SummarizeService::new(
        Arc::new(source),
        Arc::new(SummaryCache::new()),
        health_registry.clone(),
        &config.instance_name,
    ));
    let app_state = Arc::new(api::AppState::new(health_registry.clone(), service));

    health_registry.set_ready(true).await;

    let mut api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            logger.log_shutdown("SIGINT received");
        }
        served = &mut api_handle => {
            match served {
                Ok(Err(err)) => error!(error = %err, "API server exited"),
                Err(err) => error!(error = %err, "API server task failed"),
                Ok(Ok(())) => {}
            }
            logger.log_shutdown("API server stopped");
        }
    }

    info!("Shutting down");
    Ok(())
}
