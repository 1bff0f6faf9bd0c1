//! HTTP routes of the edge service.

use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::stream::stream_handler;
use super::versions::{health_handler, versions_handler};
use super::EdgeState;

/// Creates the edge router with all routes.
pub fn edge_router(state: EdgeState) -> Router {
    Router::new()
        // GET /events/:scope/:id (server-sent events)
        .route("/events/:scope/:id", get(stream_handler))
        // GET /versions?specialist_id=&work_location_id=&supervisor_mode=
        .route("/versions", get(versions_handler))
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
