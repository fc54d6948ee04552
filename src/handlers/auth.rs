use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    extractors::{JsonBody, UserGuard},
    models::Registration,
    names,
    rejections::{AppError, ResultExt},
    services::auth::{LoginOutcome, RegisterOutcome},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}

async fn register(
    State(state): State<AppState>,
    JsonBody(registration): JsonBody<Registration>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state
        .auth
        .register(registration)
        .await
        .reject("could not register user")?;

    match outcome {
        RegisterOutcome::LoggedIn { token, user_id } => Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": "Registration successful",
                "token": token,
                "userId": user_id,
            })),
        )),
        RegisterOutcome::Invalid(errors) => Err(AppError::Validation(errors)),
        RegisterOutcome::EmailTaken => Err(AppError::Input(names::EMAIL_TAKEN)),
    }
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginBody>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state
        .auth
        .login(&body.email, &body.password)
        .await
        .reject("could not log in")?;

    match outcome {
        LoginOutcome::Success(token) => Ok(Json(json!({
            "message": "Login successful",
            "token": token,
        }))),
        LoginOutcome::InvalidCredentials => Err(AppError::Input("Invalid email or password")),
    }
}

async fn logout(
    guard: UserGuard,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth
        .logout(&guard.token)
        .await
        .reject("could not log out")?;

    Ok(Json(json!({ "message": "Logged out" })))
}

async fn me(guard: UserGuard, State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let profile = state
        .db
        .get_user_profile(guard.user.id)
        .await
        .reject("could not load profile")?
        .ok_or(AppError::NotFound("User not found"))?;

    Ok(Json(profile))
}
