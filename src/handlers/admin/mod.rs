use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    extractors::{AdminGuard, JsonBody},
    models::Assessment,
    rejections::{AppError, ResultExt},
    services::{auth::LoginOutcome, results::merge_leaderboard},
    AppState,
};

use super::per_assessment;

mod attempts;
mod questions;
mod users;
mod videos;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/login", post(login))
        .route("/api/admin/logout", post(logout))
        .route("/api/admin/stats", get(stats))
        .route("/api/admin/schools", get(schools))
        .route("/api/admin/results", get(results))
        .route("/api/admin/leaderboard", get(leaderboard))
        .merge(users::routes())
        .merge(videos::routes())
        .merge(per_assessment(questions::routes))
        .merge(per_assessment(attempts::routes))
}

/// Optional `?schoolName=` filter shared by listings and bulk deletes.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SchoolQuery {
    pub school_name: Option<String>,
}

#[derive(Deserialize)]
struct LoginBody {
    password: String,
}

async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginBody>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state
        .auth
        .admin_login(&body.password)
        .await
        .reject("could not log in admin")?;

    match outcome {
        LoginOutcome::Success(token) => Ok(Json(json!({
            "message": "Login successful",
            "token": token,
        }))),
        LoginOutcome::InvalidCredentials => Err(AppError::Input("Invalid password")),
    }
}

async fn logout(
    guard: AdminGuard,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth
        .admin_logout(&guard.token)
        .await
        .reject("could not log out admin")?;

    Ok(Json(json!({ "message": "Logged out" })))
}

async fn stats(_: AdminGuard, State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let stats = state
        .db
        .admin_stats()
        .await
        .reject("could not get admin stats")?;

    Ok(Json(stats))
}

async fn schools(_: AdminGuard, State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let schools = state
        .db
        .school_names()
        .await
        .reject("could not list schools")?;

    Ok(Json(schools))
}

async fn results(_: AdminGuard, State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let quiz = state
        .db
        .school_rollup(Assessment::Quiz)
        .await
        .reject("could not compute quiz results")?;
    let case = state
        .db
        .school_rollup(Assessment::Case)
        .await
        .reject("could not compute case results")?;

    Ok(Json(json!({ "quiz": quiz, "case": case })))
}

async fn leaderboard(
    _: AdminGuard,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = state
        .db
        .marks_by_user(Assessment::Quiz)
        .await
        .reject("could not sum quiz marks")?;
    let case = state
        .db
        .marks_by_user(Assessment::Case)
        .await
        .reject("could not sum case marks")?;

    Ok(Json(merge_leaderboard(quiz, case)))
}
