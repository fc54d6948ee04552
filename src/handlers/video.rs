use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::{
    extractors::UserGuard,
    models::VideoKind,
    rejections::{AppError, ResultExt},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/video/{kind}", get(video))
        .route("/api/video/{kind}/watched", post(mark_watched))
}

pub(crate) fn parse_kind(kind: &str) -> Result<VideoKind, AppError> {
    kind.parse()
        .map_err(|_| AppError::Input("video type must be intro or case"))
}

async fn video(
    _guard: UserGuard,
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    let video = state
        .db
        .get_video(kind)
        .await
        .reject("could not load video")?
        .ok_or(AppError::NotFound("Video not found"))?;

    Ok(Json(video))
}

async fn mark_watched(
    UserGuard { user, .. }: UserGuard,
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    state
        .db
        .mark_video_watched(user.id, kind)
        .await
        .reject("could not record video progress")?;

    Ok(Json(json!({ "message": "Video marked as watched" })))
}
