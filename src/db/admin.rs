use color_eyre::Result;
use libsql::params;
use ulid::Ulid;

use super::helpers::query_i64;
use super::models::AdminStats;
use super::user::{hash_password, verify_password};
use super::Db;

impl Db {
    pub async fn admin_password_set(&self) -> Result<bool> {
        let conn = self.connect()?;
        let exists = query_i64(&conn, "SELECT EXISTS(SELECT 1 FROM admin WHERE id = 1)", ()).await?;
        Ok(exists == 1)
    }

    pub async fn set_admin_password(&self, password: &str) -> Result<()> {
        let password_hash = hash_password(password).await?;
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO admin (id, password_hash) VALUES (1, ?) ON CONFLICT(id) DO UPDATE SET password_hash = excluded.password_hash",
            params![password_hash],
        )
        .await?;

        tracing::info!("new admin password set");
        Ok(())
    }

    pub async fn verify_admin_password(&self, password: &str) -> Result<bool> {
        let conn = self.connect()?;
        let row = conn
            .query("SELECT password_hash FROM admin WHERE id = 1", ())
            .await?
            .next()
            .await?;

        match row {
            Some(row) => {
                let stored_hash = row.get::<String>(0)?;
                Ok(verify_password(password, &stored_hash).await)
            }
            None => Ok(false),
        }
    }

    pub async fn create_admin_session(&self) -> Result<String> {
        let session = Ulid::new().to_string();
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO admin_sessions (id) VALUES (?)",
            params![session.clone()],
        )
        .await?;

        tracing::info!("new admin session created");
        Ok(session)
    }

    pub async fn admin_session_exists(&self, session: &str) -> Result<bool> {
        let conn = self.connect()?;
        let exists = query_i64(
            &conn,
            "SELECT EXISTS(SELECT 1 FROM admin_sessions WHERE id = ?)",
            params![session],
        )
        .await?;
        Ok(exists == 1)
    }

    pub async fn delete_admin_session(&self, session: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute("DELETE FROM admin_sessions WHERE id = ?", params![session])
            .await?;
        Ok(())
    }

    /// Headline counts for the admin dashboard.
    pub async fn admin_stats(&self) -> Result<AdminStats> {
        let conn = self.connect()?;

        Ok(AdminStats {
            users: count_rows(&conn, "users").await?,
            members: count_rows(&conn, "members").await?,
            quiz_questions: count_rows(&conn, "quiz_questions").await?,
            case_questions: count_rows(&conn, "case_questions").await?,
            videos: count_rows(&conn, "videos").await?,
            quiz_attempts: count_rows(&conn, "quiz_attempts").await?,
            case_attempts: count_rows(&conn, "case_attempts").await?,
        })
    }
}

async fn count_rows(conn: &libsql::Connection, table: &str) -> Result<i64> {
    query_i64(conn, &format!("SELECT COUNT(*) FROM {table}"), ()).await
}
