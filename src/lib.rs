pub mod db;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod names;
pub mod rejections;
pub mod services;
pub mod utils;
pub mod validate;

use axum::Router;

use services::{assessment::AssessmentService, auth::AuthService};

#[derive(Clone)]
pub struct AppState {
    pub db: db::Db,
    pub auth: AuthService,
    pub assessments: AssessmentService,
}

impl AppState {
    pub fn new(db: db::Db) -> Self {
        Self {
            auth: AuthService::new(db.clone()),
            assessments: AssessmentService::new(db.clone()),
            db,
        }
    }
}

pub fn router(state: AppState) -> Router {
    handlers::routes().with_state(state)
}
