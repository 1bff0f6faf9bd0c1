//! Version and health endpoints.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::EdgeState;
use crate::domain::booking::{VersionQuery, VersionSnapshot};

/// Response of `GET /versions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionResponse {
    #[serde(flatten)]
    pub counters: VersionSnapshot,
    /// False when the counter store could not be read; counters are then 0.
    pub store_connected: bool,
}

/// Handle `GET /versions`.
///
/// Never fails: an unreachable counter store yields zeros, which pollers
/// read as "no change".
pub async fn versions_handler(
    State(state): State<EdgeState>,
    Query(query): Query<VersionQuery>,
) -> Json<VersionResponse> {
    let now = state.clock.now().as_unix_secs();

    let response = match state.versions.current(&query).await {
        Ok(counters) => VersionResponse {
            counters: VersionSnapshot {
                timestamp: now,
                ..counters
            },
            store_connected: true,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Version store unavailable");
            VersionResponse {
                counters: VersionSnapshot {
                    timestamp: now,
                    ..VersionSnapshot::default()
                },
                store_connected: false,
            }
        }
    };

    Json(response)
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub clients: usize,
    pub channels: usize,
}

/// Handle `GET /health`.
pub async fn health_handler(State(state): State<EdgeState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        clients: state.hub.total_client_count().await,
        channels: state.hub.active_channels().await.len(),
    })
}
