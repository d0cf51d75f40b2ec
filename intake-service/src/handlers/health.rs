use axum::{extract::State, response::Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl ServiceStatus {
    fn from_ready(ready: bool) -> Self {
        if ready {
            ServiceStatus::Healthy
        } else {
            ServiceStatus::Unhealthy
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ServiceStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub services: ServiceHealth,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub storage: ServiceStatus,
    pub message_bus: ServiceStatus,
}

/// GET /health
///
/// Always answers 200; a dependency being down only degrades the status.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (storage_ready, bus_ready) =
        tokio::join!(state.storage.health_check(), state.publisher.health_check());

    let status = if storage_ready && bus_ready {
        ServiceStatus::Healthy
    } else {
        ServiceStatus::Degraded
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        services: ServiceHealth {
            storage: ServiceStatus::from_ready(storage_ready),
            message_bus: ServiceStatus::from_ready(bus_ready),
        },
    })
}
