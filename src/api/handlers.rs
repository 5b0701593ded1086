//! HTTP request handlers
//!
//! Request/response types plus the thin glue between axum and the
//! coordinator handle. Errors map onto HTTP status codes here and nowhere
//! else.

use crate::api::AppContext;
use crate::catalog::Track;
use crate::error::Error;
use crate::events::ControlMode;
use crate::motion::MotionSample;
use crate::player::PlayerStatus;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    status: String,
}

impl StatusMessage {
    fn ok() -> Json<Self> {
        Json(Self {
            status: "ok".to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectTrackRequest {
    pub track_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    pub position_s: f64,
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    /// Linear volume 0.0-1.0; safety-limited before it takes effect
    pub volume: f64,
}

#[derive(Debug, Serialize)]
pub struct VolumeResponse {
    pub volume: f64,
}

#[derive(Debug, Deserialize)]
pub struct AutoAdvanceRequest {
    pub enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct ControlModeRequest {
    pub mode: ControlMode,
}

#[derive(Debug, Serialize)]
pub struct ControlModeResponse {
    pub mode: ControlMode,
}

#[derive(Debug, Serialize)]
pub struct PermissionResponse {
    pub granted: bool,
    /// Mode in effect after the grant policy ran
    pub mode: ControlMode,
}

#[derive(Debug, Deserialize)]
pub struct SensitivityRequest {
    pub sensitivity: u8,
}

#[derive(Debug, Deserialize)]
pub struct SampleRequest {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SampleResponse {
    /// False when no subscriber is listening (manual mode)
    pub delivered: bool,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub visible: bool,
}

#[derive(Debug, Serialize)]
pub struct PlaylistResponse {
    pub tracks: Vec<Track>,
}

type ApiError = (StatusCode, Json<StatusMessage>);

fn error_response(error: Error) -> ApiError {
    let status = match &error {
        Error::TrackNotFound(_) => StatusCode::NOT_FOUND,
        Error::BadRequest(_) => StatusCode::BAD_REQUEST,
        Error::InvalidState(_) | Error::MotionUnavailable => StatusCode::CONFLICT,
        Error::PermissionDenied => StatusCode::FORBIDDEN,
        Error::ChannelClosed => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(StatusMessage {
            status: error.to_string(),
        }),
    )
}

// ============================================================================
// Status and Playlist
// ============================================================================

/// GET /api/v1/status - full player snapshot
pub async fn get_status(State(ctx): State<AppContext>) -> Result<Json<PlayerStatus>, ApiError> {
    ctx.player.status().await.map(Json).map_err(error_response)
}

/// GET /api/v1/playlist - the immutable track catalog
pub async fn get_playlist(State(ctx): State<AppContext>) -> Json<PlaylistResponse> {
    Json(PlaylistResponse {
        tracks: ctx.catalog.tracks().to_vec(),
    })
}

// ============================================================================
// Playback Control
// ============================================================================

/// POST /api/v1/playback/play
pub async fn play(State(ctx): State<AppContext>) -> Result<Json<StatusMessage>, ApiError> {
    ctx.player.play().await.map_err(error_response)?;
    Ok(StatusMessage::ok())
}

/// POST /api/v1/playback/pause
pub async fn pause(State(ctx): State<AppContext>) -> Result<Json<StatusMessage>, ApiError> {
    ctx.player.pause().await.map_err(error_response)?;
    Ok(StatusMessage::ok())
}

/// POST /api/v1/playback/next
pub async fn next_track(State(ctx): State<AppContext>) -> Result<Json<StatusMessage>, ApiError> {
    ctx.player.next_track().await.map_err(error_response)?;
    Ok(StatusMessage::ok())
}

/// POST /api/v1/playback/previous
pub async fn previous_track(
    State(ctx): State<AppContext>,
) -> Result<Json<StatusMessage>, ApiError> {
    ctx.player.previous_track().await.map_err(error_response)?;
    Ok(StatusMessage::ok())
}

/// POST /api/v1/playback/select
pub async fn select_track(
    State(ctx): State<AppContext>,
    Json(req): Json<SelectTrackRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    info!("Track selected via API: {}", req.track_id);
    ctx.player
        .select_track(req.track_id)
        .await
        .map_err(error_response)?;
    Ok(StatusMessage::ok())
}

/// POST /api/v1/playback/seek
pub async fn seek(
    State(ctx): State<AppContext>,
    Json(req): Json<SeekRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    ctx.player
        .seek(req.position_s)
        .await
        .map_err(error_response)?;
    Ok(StatusMessage::ok())
}

/// POST /api/v1/playback/auto-advance
pub async fn set_auto_advance(
    State(ctx): State<AppContext>,
    Json(req): Json<AutoAdvanceRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    ctx.player
        .set_auto_advance(req.enabled)
        .await
        .map_err(error_response)?;
    Ok(StatusMessage::ok())
}

// ============================================================================
// Volume
// ============================================================================

/// GET /api/v1/audio/volume
pub async fn get_volume(State(ctx): State<AppContext>) -> Result<Json<VolumeResponse>, ApiError> {
    let status = ctx.player.status().await.map_err(error_response)?;
    Ok(Json(VolumeResponse {
        volume: status.volume,
    }))
}

/// POST /api/v1/audio/volume
pub async fn set_volume(
    State(ctx): State<AppContext>,
    Json(req): Json<VolumeRequest>,
) -> Result<Json<VolumeResponse>, ApiError> {
    let applied = ctx
        .player
        .set_volume(req.volume)
        .await
        .map_err(error_response)?;
    Ok(Json(VolumeResponse { volume: applied }))
}

// ============================================================================
// Motion Control
// ============================================================================

/// POST /api/v1/motion/mode
pub async fn set_control_mode(
    State(ctx): State<AppContext>,
    Json(req): Json<ControlModeRequest>,
) -> Result<Json<ControlModeResponse>, ApiError> {
    let mode = ctx
        .player
        .set_control_mode(req.mode)
        .await
        .map_err(error_response)?;
    Ok(Json(ControlModeResponse { mode }))
}

/// POST /api/v1/motion/permission
///
/// Asks the sensor platform for access; a grant switches to motion mode
/// immediately so the user gesture that triggered the prompt carries
/// through to motion control.
pub async fn request_permission(
    State(ctx): State<AppContext>,
) -> Result<Json<PermissionResponse>, ApiError> {
    let granted = ctx
        .player
        .request_permission()
        .await
        .map_err(error_response)?;

    let mode = if granted {
        ctx.player
            .set_control_mode(ControlMode::Motion)
            .await
            .map_err(error_response)?
    } else {
        ControlMode::Manual
    };

    Ok(Json(PermissionResponse { granted, mode }))
}

/// POST /api/v1/motion/sensitivity
pub async fn set_sensitivity(
    State(ctx): State<AppContext>,
    Json(req): Json<SensitivityRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    ctx.player
        .set_sensitivity(req.sensitivity)
        .await
        .map_err(error_response)?;
    Ok(StatusMessage::ok())
}

/// POST /api/v1/motion/sample
///
/// Feeds one accelerometer reading into the sensor. Readings sent while in
/// manual mode are reported as undelivered rather than rejected.
pub async fn inject_sample(
    State(ctx): State<AppContext>,
    Json(req): Json<SampleRequest>,
) -> Json<SampleResponse> {
    let sample = MotionSample {
        x: req.x,
        y: req.y,
        z: req.z,
    };
    let delivered = ctx.sensor_feed.feed(sample);
    Json(SampleResponse { delivered })
}

// ============================================================================
// Visibility
// ============================================================================

/// POST /api/v1/visibility
pub async fn set_visibility(
    State(ctx): State<AppContext>,
    Json(req): Json<VisibilityRequest>,
) -> Result<Json<StatusMessage>, ApiError> {
    ctx.player
        .set_visibility(req.visible)
        .map_err(error_response)?;
    Ok(StatusMessage::ok())
}
