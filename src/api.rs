//! HTTP endpoints for the client-facing operations.
//!
//! This is a thin request layer: each handler forwards to the session
//! service and returns the sanitized projection for the calling player.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::GameError;
use crate::protocol::*;
use crate::session::GameService;
use crate::types::{unix_millis, ConfigPatch};

pub fn router() -> Router<Arc<GameService>> {
    Router::new()
        .route("/api/time", get(server_time))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_state))
        .route("/api/sessions/{id}/join", post(join))
        .route("/api/sessions/{id}/start", post(start_round))
        .route("/api/sessions/{id}/answers", post(submit_answers))
        .route("/api/sessions/{id}/end", post(end_round))
        .route("/api/sessions/{id}/leave", post(leave))
        .route("/api/sessions/{id}/category", post(set_category))
        .route("/api/sessions/{id}/config", post(update_config))
        .route("/api/sessions/{id}/reset", post(reset))
        .route("/api/sessions/{id}/close", post(close))
}

/// GET /api/time
///
/// Clock sample for RTT calibration.
async fn server_time() -> Json<TimeResponse> {
    Json(TimeResponse {
        server_now: unix_millis(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ViewerQuery {
    player_id: Option<String>,
}

/// POST /api/sessions
async fn create_session(
    State(service): State<Arc<GameService>>,
    body: Option<Json<CreateSessionRequest>>,
) -> Result<Json<SessionView>, GameError> {
    let config = body.and_then(|Json(req)| req.config);
    let session = service.create_session(config).await?;
    Ok(Json(SessionView::project(&session, None)))
}

/// GET /api/sessions/{id}?player_id=...
async fn get_state(
    State(service): State<Arc<GameService>>,
    Path(id): Path<String>,
    Query(viewer): Query<ViewerQuery>,
) -> Result<Json<SessionView>, GameError> {
    let session = service.get_session(&id).await?;
    Ok(Json(SessionView::project(
        &session,
        viewer.player_id.as_deref(),
    )))
}

/// POST /api/sessions/{id}/join
async fn join(
    State(service): State<Arc<GameService>>,
    Path(id): Path<String>,
    Json(req): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, GameError> {
    let (session, player_id) = service
        .join(&id, req.player_id.as_deref(), &req.name)
        .await?;
    Ok(Json(JoinResponse {
        session: SessionView::project(&session, Some(&player_id)),
        player_id,
    }))
}

/// POST /api/sessions/{id}/start
async fn start_round(
    State(service): State<Arc<GameService>>,
    Path(id): Path<String>,
    body: Option<Json<StartRoundRequest>>,
) -> Result<Json<SessionView>, GameError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let session = service
        .start_round(&id, req.category.as_deref(), req.round_millis, req.total_rounds)
        .await?;
    Ok(Json(SessionView::project(&session, None)))
}

/// POST /api/sessions/{id}/answers
async fn submit_answers(
    State(service): State<Arc<GameService>>,
    Path(id): Path<String>,
    Json(req): Json<SubmitAnswersRequest>,
) -> Result<Json<SessionView>, GameError> {
    let session = service
        .submit_answers(&id, &req.player_id, req.words, req.forced_pass)
        .await?;
    Ok(Json(SessionView::project(&session, Some(&req.player_id))))
}

/// POST /api/sessions/{id}/end
async fn end_round(
    State(service): State<Arc<GameService>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, GameError> {
    let session = service.end_round(&id).await?;
    Ok(Json(SessionView::project(&session, None)))
}

/// POST /api/sessions/{id}/leave
async fn leave(
    State(service): State<Arc<GameService>>,
    Path(id): Path<String>,
    Json(req): Json<LeaveRequest>,
) -> Result<Json<SessionView>, GameError> {
    let session = service.leave(&id, &req.player_id).await?;
    Ok(Json(SessionView::project(&session, None)))
}

/// POST /api/sessions/{id}/category
async fn set_category(
    State(service): State<Arc<GameService>>,
    Path(id): Path<String>,
    Json(req): Json<SetCategoryRequest>,
) -> Result<Json<SessionView>, GameError> {
    let session = service.set_category(&id, &req.category).await?;
    Ok(Json(SessionView::project(&session, None)))
}

/// POST /api/sessions/{id}/config
async fn update_config(
    State(service): State<Arc<GameService>>,
    Path(id): Path<String>,
    Json(patch): Json<ConfigPatch>,
) -> Result<Json<SessionView>, GameError> {
    let session = service.update_config(&id, patch).await?;
    Ok(Json(SessionView::project(&session, None)))
}

/// POST /api/sessions/{id}/reset
async fn reset(
    State(service): State<Arc<GameService>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, GameError> {
    let session = service.reset(&id).await?;
    Ok(Json(SessionView::project(&session, None)))
}

/// POST /api/sessions/{id}/close
async fn close(
    State(service): State<Arc<GameService>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, GameError> {
    let session = service.close(&id).await?;
    service.remove(&id).await?;
    Ok(Json(SessionView::project(&session, None)))
}
