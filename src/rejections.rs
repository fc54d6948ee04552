use std::fmt::Display;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{names, services::assessment::AssessmentError};

/// Every error a handler can answer with. Bodies are `{message}` or, for
/// validation failures, `{message, errors}`.
#[derive(Debug)]
pub enum AppError {
    Input(&'static str),
    Validation(Vec<String>),
    Unauthorized,
    Forbidden(&'static str),
    Conflict(&'static str),
    NotFound(&'static str),
    Internal(&'static str),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, body) = match self {
            AppError::Input(message) => (StatusCode::BAD_REQUEST, json!({ "message": message })),
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "message": "Validation failed", "errors": errors }),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "message": "Not authorized" }),
            ),
            AppError::Forbidden(message) | AppError::Conflict(message) => {
                (StatusCode::FORBIDDEN, json!({ "message": message }))
            }
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "message": message })),
            AppError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "message": message }),
            ),
        };

        (code, Json(body)).into_response()
    }
}

impl From<AssessmentError> for AppError {
    fn from(e: AssessmentError) -> Self {
        match e {
            AssessmentError::AlreadyAttempted => AppError::Conflict(names::ALREADY_ATTEMPTED),
            AssessmentError::VideoLocked => AppError::Forbidden(names::VIDEO_LOCKED),
            AssessmentError::MalformedSubmission { .. } | AssessmentError::InvalidAnswerIndex { .. } => {
                tracing::warn!("rejected submission: {e}");
                AppError::Validation(vec![e.to_string()])
            }
            AssessmentError::InsufficientQuestions { .. } => {
                tracing::error!("{e}");
                AppError::Internal("Not enough questions are available")
            }
            AssessmentError::Storage(report) => {
                tracing::error!("storage error: {report:?}");
                AppError::Internal("Something went wrong")
            }
        }
    }
}

pub trait ResultExt<T> {
    /// Logs the underlying error and answers with a generic 500.
    fn reject(self, message: &'static str) -> Result<T, AppError>;

    /// Logs the underlying error and answers with a 400.
    fn reject_input(self, message: &'static str) -> Result<T, AppError>;
}

impl<T, E: Display> ResultExt<T> for Result<T, E> {
    fn reject(self, message: &'static str) -> Result<T, AppError> {
        self.map_err(|e| {
            tracing::error!("{message}: {e}");
            AppError::Internal(message)
        })
    }

    fn reject_input(self, message: &'static str) -> Result<T, AppError> {
        self.map_err(|e| {
            tracing::warn!("{message}: {e}");
            AppError::Input(message)
        })
    }
}
