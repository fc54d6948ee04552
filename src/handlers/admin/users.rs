use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::SchoolQuery;
use crate::{
    db::UpdateUser,
    extractors::{AdminGuard, JsonBody},
    models::{Registration, UserEdit},
    names,
    rejections::{AppError, ResultExt},
    services::auth::BulkAddOutcome,
    utils::non_blank,
    validate, AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/admin/users",
            get(list_users).post(add_users).delete(delete_school_users),
        )
        .route(
            "/api/admin/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

async fn list_users(
    _: AdminGuard,
    State(state): State<AppState>,
    Query(query): Query<SchoolQuery>,
) -> Result<impl IntoResponse, AppError> {
    let school = non_blank(query.school_name.as_deref());
    let users = state
        .db
        .list_users(school.as_deref())
        .await
        .reject("could not list users")?;

    Ok(Json(users))
}

#[derive(Deserialize)]
struct BulkAdd {
    users: Vec<Registration>,
}

async fn add_users(
    _: AdminGuard,
    State(state): State<AppState>,
    JsonBody(body): JsonBody<BulkAdd>,
) -> Result<impl IntoResponse, AppError> {
    if body.users.is_empty() {
        return Err(AppError::Input("users must not be empty"));
    }

    let outcome = state
        .auth
        .add_users(body.users)
        .await
        .reject("could not add users")?;

    match outcome {
        BulkAddOutcome::Added { created, skipped } => Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": format!("{} user(s) added", created.len()),
                "created": created,
                "skipped": skipped,
            })),
        )),
        BulkAddOutcome::Invalid(errors) => Err(AppError::Validation(errors)),
    }
}

async fn delete_school_users(
    _: AdminGuard,
    State(state): State<AppState>,
    Query(query): Query<SchoolQuery>,
) -> Result<impl IntoResponse, AppError> {
    let school = non_blank(query.school_name.as_deref())
        .ok_or(AppError::Input("schoolName is required"))?;

    let deleted = state
        .db
        .delete_users_by_school(&school)
        .await
        .reject("could not delete users")?;

    Ok(Json(json!({ "message": "Users deleted", "deleted": deleted })))
}

async fn get_user(
    _: AdminGuard,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let profile = state
        .db
        .get_user_profile(id)
        .await
        .reject("could not load user")?
        .ok_or(AppError::NotFound("User not found"))?;

    Ok(Json(profile))
}

async fn update_user(
    _: AdminGuard,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(edit): JsonBody<UserEdit>,
) -> Result<impl IntoResponse, AppError> {
    let update = validate::user_edit(edit).map_err(AppError::Validation)?;

    match state
        .db
        .update_user(id, &update)
        .await
        .reject("could not update user")?
    {
        UpdateUser::Updated => Ok(Json(json!({ "message": "User updated" }))),
        UpdateUser::EmailTaken => Err(AppError::Input(names::EMAIL_TAKEN)),
        UpdateUser::NotFound => Err(AppError::NotFound("User not found")),
    }
}

async fn delete_user(
    _: AdminGuard,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !state
        .db
        .delete_user(id)
        .await
        .reject("could not delete user")?
    {
        return Err(AppError::NotFound("User not found"));
    }

    Ok(Json(json!({ "message": "User deleted" })))
}
