// Database module - provides data access layer

use std::sync::Arc;

use color_eyre::{
    eyre::{eyre, OptionExt},
    Result,
};

pub mod models;
pub use models::*;

mod admin;
mod attempt;
mod helpers;
mod question;
mod report;
mod schema;
mod user;
mod video;

pub use attempt::InsertAttempt;
pub use user::{InsertUser, UpdateUser, UserUpdate};

#[derive(Clone)]
pub struct Db {
    db: Arc<libsql::Database>,
}

impl Db {
    pub async fn new(url: String, auth_token: Option<String>) -> Result<Self> {
        let db = if let Some(path) = url.strip_prefix("file:") {
            libsql::Builder::new_local(path).build().await?
        } else {
            let auth_token =
                auth_token.ok_or_else(|| eyre!("a remote database needs an auth token"))?;
            libsql::Builder::new_remote(url, auth_token).build().await?
        };

        let conn = db.connect()?;

        let one = conn
            .query("SELECT 1", ())
            .await?
            .next()
            .await?
            .ok_or_eyre("connection check failed")?
            .get::<i32>(0)?;
        if one != 1 {
            return Err(eyre!("connection check returned {one}"));
        }

        schema::create_schema(&conn).await?;

        tracing::info!("database connection has been verified");

        Ok(Self { db: Arc::new(db) })
    }

    fn connect(&self) -> Result<libsql::Connection> {
        Ok(self.db.connect()?)
    }
}
