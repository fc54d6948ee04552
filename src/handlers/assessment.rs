use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    db::AuthUser,
    extractors::{JsonBody, UserGuard},
    models::{Assessment, Language, PublicQuestion},
    rejections::{AppError, ResultExt},
    services::assessment::Submission,
    utils::non_blank,
    AppState,
};

/// Participant routes for one assessment, e.g. `/api/quiz/questions`.
pub fn routes(assessment: Assessment) -> Router<AppState> {
    Router::new()
        .route(&format!("/api/{assessment}/questions"), get(questions))
        .route(&format!("/api/{assessment}/submit"), post(submit))
        .route(&format!("/api/{assessment}/has-attempted"), get(has_attempted))
}

#[derive(Deserialize)]
struct LanguageQuery {
    language: Option<String>,
}

/// An explicit language wins over the one chosen at registration.
fn resolve_language(requested: Option<&str>, user: &AuthUser) -> Result<Language, AppError> {
    match non_blank(requested) {
        Some(language) => language
            .parse::<Language>()
            .reject_input("language must be English or Sinhala"),
        None => Ok(user.preferred_language()),
    }
}

async fn questions(
    UserGuard { user, .. }: UserGuard,
    Extension(assessment): Extension<Assessment>,
    State(state): State<AppState>,
    Query(query): Query<LanguageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let language = resolve_language(query.language.as_deref(), &user)?;

    let questions: Vec<PublicQuestion> = state
        .assessments
        .questions_for(&user, assessment, language)
        .await?
        .into_iter()
        .map(PublicQuestion::from)
        .collect();

    Ok(Json(json!({
        "count": questions.len(),
        "questions": questions,
        "timeLimitSeconds": assessment.time_limit_seconds(),
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBody {
    answers: Vec<i64>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    time_taken: Option<i64>,
}

async fn submit(
    UserGuard { user, .. }: UserGuard,
    Extension(assessment): Extension<Assessment>,
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SubmitBody>,
) -> Result<impl IntoResponse, AppError> {
    let language = resolve_language(body.language.as_deref(), &user)?;
    if body.time_taken.is_some_and(|t| t < 0) {
        return Err(AppError::Validation(vec![
            "timeTaken must not be negative".to_string()
        ]));
    }

    let receipt = state
        .assessments
        .submit(
            &user,
            assessment,
            language,
            Submission {
                answers: body.answers,
                time_taken: body.time_taken,
            },
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Submitted successfully",
            "attemptId": receipt.attempt_id,
            "score": receipt.score,
            "totalQuestions": receipt.total,
        })),
    ))
}

async fn has_attempted(
    UserGuard { user, .. }: UserGuard,
    Extension(assessment): Extension<Assessment>,
    State(state): State<AppState>,
    Query(query): Query<LanguageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let language = resolve_language(query.language.as_deref(), &user)?;

    let attempted = state
        .assessments
        .has_attempted(user.id, assessment, language)
        .await?;

    Ok(Json(json!({ "hasAttempted": attempted })))
}
