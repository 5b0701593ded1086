//! REST API
//!
//! HTTP surface for the player: playback control, motion control, volume,
//! playlist, and the SSE event stream. All state changes go through the
//! coordinator handle; handlers never hold player state of their own.

pub mod handlers;
pub mod sse;

use crate::catalog::TrackCatalog;
use crate::events::EventBus;
use crate::motion::SensorFeed;
use crate::player::PlayerHandle;
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppContext {
    /// Coordinator handle
    pub player: PlayerHandle,
    /// Event broadcast for SSE subscribers
    pub events: EventBus,
    /// Immutable playlist
    pub catalog: Arc<TrackCatalog>,
    /// Injection point for motion samples (demo clients and tests)
    pub sensor_feed: SensorFeed,
    /// Server port
    pub port: u16,
}

/// Create the API router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health check (no prefix for health endpoint)
        .route("/health", get(health_check))
        // API v1 routes
        .nest(
            "/api/v1",
            Router::new()
                // Player status and playlist
                .route("/status", get(handlers::get_status))
                .route("/playlist", get(handlers::get_playlist))
                // Playback control endpoints
                .route("/playback/play", post(handlers::play))
                .route("/playback/pause", post(handlers::pause))
                .route("/playback/next", post(handlers::next_track))
                .route("/playback/previous", post(handlers::previous_track))
                .route("/playback/select", post(handlers::select_track))
                .route("/playback/seek", post(handlers::seek))
                .route("/playback/auto-advance", post(handlers::set_auto_advance))
                // Volume endpoints
                .route("/audio/volume", get(handlers::get_volume))
                .route("/audio/volume", post(handlers::set_volume))
                // Motion control endpoints
                .route("/motion/mode", post(handlers::set_control_mode))
                .route("/motion/permission", post(handlers::request_permission))
                .route("/motion/sensitivity", post(handlers::set_sensitivity))
                .route("/motion/sample", post(handlers::inject_sample))
                // Client visibility notifications
                .route("/visibility", post(handlers::set_visibility))
                // SSE events
                .route("/events", get(sse::event_stream)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

/// Health check endpoint
async fn health_check(State(ctx): State<AppContext>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "kinetune",
        "version": env!("CARGO_PKG_VERSION"),
        "port": ctx.port,
        "tracks": ctx.catalog.len(),
    }))
}
