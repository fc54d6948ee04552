use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    extractors::{AdminGuard, JsonBody},
    models::{Assessment, Language, QuestionInput},
    rejections::{AppError, ResultExt},
    utils::non_blank,
    validate, AppState,
};

/// Question CRUD for one assessment, e.g. `/api/admin/quiz/{id}`.
pub fn routes(assessment: Assessment) -> Router<AppState> {
    Router::new()
        .route(
            &format!("/api/admin/{assessment}"),
            get(list_questions).post(create_question),
        )
        .route(
            &format!("/api/admin/{assessment}/{{id}}"),
            get(get_question).put(update_question).delete(delete_question),
        )
}

#[derive(Deserialize)]
struct LanguageFilter {
    language: Option<String>,
}

async fn list_questions(
    _: AdminGuard,
    Extension(assessment): Extension<Assessment>,
    State(state): State<AppState>,
    Query(filter): Query<LanguageFilter>,
) -> Result<impl IntoResponse, AppError> {
    let language = non_blank(filter.language.as_deref())
        .map(|l| l.parse::<Language>())
        .transpose()
        .reject_input("language must be English or Sinhala")?;

    let questions = state
        .db
        .list_questions(assessment, language)
        .await
        .reject("could not list questions")?;

    Ok(Json(questions))
}

async fn create_question(
    _: AdminGuard,
    Extension(assessment): Extension<Assessment>,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<QuestionInput>,
) -> Result<impl IntoResponse, AppError> {
    let question = validate::question(assessment, input).map_err(AppError::Validation)?;

    let id = state
        .db
        .create_question(assessment, &question)
        .await
        .reject("could not create question")?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Question created", "id": id })),
    ))
}

async fn get_question(
    _: AdminGuard,
    Extension(assessment): Extension<Assessment>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let question = state
        .db
        .get_question(assessment, id)
        .await
        .reject("could not load question")?
        .ok_or(AppError::NotFound("Question not found"))?;

    Ok(Json(question))
}

async fn update_question(
    _: AdminGuard,
    Extension(assessment): Extension<Assessment>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(input): JsonBody<QuestionInput>,
) -> Result<impl IntoResponse, AppError> {
    let question = validate::question(assessment, input).map_err(AppError::Validation)?;

    if !state
        .db
        .update_question(assessment, id, &question)
        .await
        .reject("could not update question")?
    {
        return Err(AppError::NotFound("Question not found"));
    }

    Ok(Json(json!({ "message": "Question updated" })))
}

async fn delete_question(
    _: AdminGuard,
    Extension(assessment): Extension<Assessment>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !state
        .db
        .delete_question(assessment, id)
        .await
        .reject("could not delete question")?
    {
        return Err(AppError::NotFound("Question not found"));
    }

    Ok(Json(json!({ "message": "Question deleted" })))
}
