use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use shared::messaging::{EventPublisher, KafkaClient};
use shared::observability::init_logging;
use tokio::net::TcpListener;
use tracing::info;

mod classifier;
mod config;
mod errors;
mod handlers;
mod models;
mod pipeline;
mod routes;
mod storage;
#[cfg(test)]
mod test_utils;

use config::Config;
use pipeline::IntakePipeline;
use storage::{s3_client::S3Client, ObjectStoreGateway};

/// Application state shared across handlers. The storage and bus clients are
/// created once at startup and reused by every request.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IntakePipeline>,
    pub storage: ObjectStoreGateway,
    pub publisher: EventPublisher,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    config.validate()?;

    init_logging(config.logging.log_config())?;

    info!("Starting Intake Service...");

    let s3_client = S3Client::new(config.storage.s3_config()).await;
    let storage = ObjectStoreGateway::new(Arc::new(s3_client), config.storage.buckets());
    info!("S3 client initialized successfully");

    let kafka_client = KafkaClient::new(config.kafka.kafka_config())?;
    let publisher = EventPublisher::new(Arc::new(kafka_client));
    info!("Kafka producer initialized successfully");

    let state = AppState {
        pipeline: Arc::new(IntakePipeline::new(storage.clone(), publisher.clone())),
        storage,
        publisher,
    };

    let app = routes::router(state, config.server.max_upload_bytes());

    let addr: SocketAddr = config
        .server
        .bind_address()
        .parse()
        .context("Invalid SERVER_HOST/SERVER_PORT")?;
    info!("Intake Service listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Intake Service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
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

    info!("Shutdown signal received");
}
