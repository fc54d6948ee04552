use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use serde_json::json;

use super::SchoolQuery;
use crate::{
    extractors::AdminGuard,
    models::Assessment,
    rejections::{AppError, ResultExt},
    utils::non_blank,
    AppState,
};

/// Attempt review for one assessment, e.g. `/api/admin/quiz-status`.
pub fn routes(assessment: Assessment) -> Router<AppState> {
    Router::new()
        .route(
            &format!("/api/admin/{assessment}-status"),
            get(list_attempts).delete(delete_school_attempts),
        )
        .route(
            &format!("/api/admin/{assessment}-status/{{id}}"),
            get(get_attempt).delete(delete_attempt),
        )
}

async fn list_attempts(
    _: AdminGuard,
    Extension(assessment): Extension<Assessment>,
    State(state): State<AppState>,
    Query(query): Query<SchoolQuery>,
) -> Result<impl IntoResponse, AppError> {
    let school = non_blank(query.school_name.as_deref());
    let rows = state
        .db
        .attempt_status(assessment, school.as_deref())
        .await
        .reject("could not list attempts")?;

    Ok(Json(rows))
}

async fn delete_school_attempts(
    _: AdminGuard,
    Extension(assessment): Extension<Assessment>,
    State(state): State<AppState>,
    Query(query): Query<SchoolQuery>,
) -> Result<impl IntoResponse, AppError> {
    let school = non_blank(query.school_name.as_deref())
        .ok_or(AppError::Input("schoolName is required"))?;

    let deleted = state
        .db
        .delete_attempts_by_school(assessment, &school)
        .await
        .reject("could not delete attempts")?;

    Ok(Json(json!({ "message": "Attempts deleted", "deleted": deleted })))
}

async fn get_attempt(
    _: AdminGuard,
    Extension(assessment): Extension<Assessment>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = state
        .db
        .get_attempt(assessment, id)
        .await
        .reject("could not load attempt")?
        .ok_or(AppError::NotFound("Attempt not found"))?;

    Ok(Json(attempt))
}

async fn delete_attempt(
    _: AdminGuard,
    Extension(assessment): Extension<Assessment>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !state
        .db
        .delete_attempt(assessment, id)
        .await
        .reject("could not delete attempt")?
    {
        return Err(AppError::NotFound("Attempt not found"));
    }

    Ok(Json(json!({ "message": "Attempt deleted" })))
}
