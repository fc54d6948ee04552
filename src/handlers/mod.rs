use axum::{routing::get, Extension, Json, Router};
use serde_json::{json, Value};

use crate::{models::Assessment, utils, AppState};

pub mod admin;
pub mod assessment;
pub mod auth;
pub mod video;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health))
        .merge(auth::routes())
        .merge(per_assessment(assessment::routes))
        .merge(video::routes())
        .merge(admin::routes())
}

/// Builds one copy of the routes per assessment, each with its `Assessment`
/// available as an `Extension`.
fn per_assessment(routes: fn(Assessment) -> Router<AppState>) -> Router<AppState> {
    Assessment::ALL
        .into_iter()
        .fold(Router::new(), |router, assessment| {
            router.merge(routes(assessment).layer(Extension(assessment)))
        })
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": utils::VERSION }))
}
