use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    extractors::{AdminGuard, JsonBody},
    handlers::video::parse_kind,
    rejections::{AppError, ResultExt},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/video", get(list_videos).post(create_video))
        .route(
            "/api/admin/video/{kind}",
            get(get_video).put(update_video).delete(delete_video),
        )
}

#[derive(Deserialize)]
struct NewVideo {
    #[serde(rename = "type")]
    kind: String,
    url: String,
}

#[derive(Deserialize)]
struct VideoUrl {
    url: String,
}

fn checked_url(url: &str) -> Result<&str, AppError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::Validation(vec!["url is required".to_string()]));
    }
    Ok(url)
}

async fn list_videos(
    _: AdminGuard,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let videos = state.db.videos().await.reject("could not list videos")?;
    Ok(Json(videos))
}

async fn create_video(
    _: AdminGuard,
    State(state): State<AppState>,
    JsonBody(body): JsonBody<NewVideo>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&body.kind)?;
    let url = checked_url(&body.url)?;

    if !state
        .db
        .create_video(kind, url)
        .await
        .reject("could not create video")?
    {
        return Err(AppError::Input("A video of this type already exists"));
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Video created" })),
    ))
}

async fn get_video(
    _: AdminGuard,
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let video = state
        .db
        .get_video(parse_kind(&kind)?)
        .await
        .reject("could not load video")?
        .ok_or(AppError::NotFound("Video not found"))?;

    Ok(Json(video))
}

async fn update_video(
    _: AdminGuard,
    State(state): State<AppState>,
    Path(kind): Path<String>,
    JsonBody(body): JsonBody<VideoUrl>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    let url = checked_url(&body.url)?;

    if !state
        .db
        .update_video(kind, url)
        .await
        .reject("could not update video")?
    {
        return Err(AppError::NotFound("Video not found"));
    }

    Ok(Json(json!({ "message": "Video updated" })))
}

async fn delete_video(
    _: AdminGuard,
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !state
        .db
        .delete_video(parse_kind(&kind)?)
        .await
        .reject("could not delete video")?
    {
        return Err(AppError::NotFound("Video not found"));
    }

    Ok(Json(json!({ "message": "Video deleted" })))
}
