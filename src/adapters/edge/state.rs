//! Shared state and errors of the edge service.

use std::sync::Arc;
use std::time::Duration;

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::Serialize;

use super::ChannelHub;
use crate::ports::{Clock, VersionStore};

/// Keep-alive period of stream connections.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// State shared by every edge handler.
#[derive(Clone)]
pub struct EdgeState {
    pub hub: Arc<ChannelHub>,
    pub versions: Arc<dyn VersionStore>,
    pub clock: Arc<dyn Clock>,
    pub heartbeat_interval: Duration,
}

impl EdgeState {
    pub fn new(hub: Arc<ChannelHub>, versions: Arc<dyn VersionStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            hub,
            versions,
            clock,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }
}

/// Error body returned by edge endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

/// Edge API error that implements IntoResponse.
#[derive(Debug)]
pub enum EdgeApiError {
    BadRequest(String),
}

impl IntoResponse for EdgeApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            EdgeApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    code: "BAD_REQUEST".to_string(),
                    message,
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}
