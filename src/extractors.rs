use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::de::DeserializeOwned;

use crate::{
    db::AuthUser,
    rejections::{AppError, ResultExt},
    AppState,
};

async fn bearer_token(parts: &mut Parts, state: &AppState) -> Result<String, AppError> {
    let TypedHeader(Authorization(bearer)) =
        TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Unauthorized)?;
    Ok(bearer.token().to_string())
}

/// Guard extractor that resolves the user bearer token against the session table.
/// Carries the authenticated user and the token itself (for logout).
pub struct UserGuard {
    pub user: AuthUser,
    pub token: String,
}

impl FromRequestParts<AppState> for UserGuard {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts, state).await?;

        match state
            .db
            .get_user_by_session(&token)
            .await
            .reject("could not check session")?
        {
            Some(user) => Ok(UserGuard { user, token }),
            None => Err(AppError::Unauthorized),
        }
    }
}

/// Admin tokens live in their own table, so a user token never passes here.
pub struct AdminGuard {
    pub token: String,
}

impl FromRequestParts<AppState> for AdminGuard {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts, state).await?;

        if state
            .db
            .admin_session_exists(&token)
            .await
            .reject("could not check admin session")?
        {
            Ok(AdminGuard { token })
        } else {
            Err(AppError::Unauthorized)
        }
    }
}

/// `Json` whose rejection is a 400 validation body instead of axum's plain-text reply.
pub struct JsonBody<T>(pub T);

impl<T: DeserializeOwned, S: Send + Sync> FromRequest<S> for JsonBody<T> {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                tracing::warn!("malformed request body: {rejection}");
                Err(AppError::Validation(vec![rejection.body_text()]))
            }
        }
    }
}
