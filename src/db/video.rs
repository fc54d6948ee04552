use color_eyre::Result;
use libsql::params;

use super::helpers::{is_unique_violation, query_all, query_i64, query_optional};
use super::models::Video;
use super::Db;
use crate::models::VideoKind;

const VIDEO_COLUMNS: &str = "type AS kind, url, updated_at";

impl Db {
    /// Returns `false` when a video of this type already exists.
    pub async fn create_video(&self, kind: VideoKind, url: &str) -> Result<bool> {
        let conn = self.connect()?;
        match conn
            .execute(
                "INSERT INTO videos (type, url) VALUES (?, ?)",
                params![kind.as_str(), url],
            )
            .await
        {
            Ok(_) => {
                tracing::info!("{} video created", kind.as_str());
                Ok(true)
            }
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn videos(&self) -> Result<Vec<Video>> {
        let conn = self.connect()?;
        query_all(
            &conn,
            &format!("SELECT {VIDEO_COLUMNS} FROM videos ORDER BY type"),
            (),
        )
        .await
    }

    pub async fn get_video(&self, kind: VideoKind) -> Result<Option<Video>> {
        let conn = self.connect()?;
        query_optional(
            &conn,
            &format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE type = ?"),
            params![kind.as_str()],
        )
        .await
    }

    pub async fn update_video(&self, kind: VideoKind, url: &str) -> Result<bool> {
        let conn = self.connect()?;
        let updated = conn
            .execute(
                "UPDATE videos SET url = ?, updated_at = CURRENT_TIMESTAMP WHERE type = ?",
                params![url, kind.as_str()],
            )
            .await?;

        tracing::info!("{} video updated: {updated} row(s)", kind.as_str());
        Ok(updated > 0)
    }

    pub async fn delete_video(&self, kind: VideoKind) -> Result<bool> {
        let conn = self.connect()?;
        let deleted = conn
            .execute("DELETE FROM videos WHERE type = ?", params![kind.as_str()])
            .await?;

        tracing::info!("{} video deleted: {deleted} row(s)", kind.as_str());
        Ok(deleted > 0)
    }

    pub async fn mark_video_watched(&self, user_id: i64, kind: VideoKind) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO video_watches (user_id, type) VALUES (?, ?) ON CONFLICT(user_id, type) DO NOTHING",
            params![user_id, kind.as_str()],
        )
        .await?;

        tracing::info!("user {user_id} watched the {} video", kind.as_str());
        Ok(())
    }

    /// An assessment is locked only while its video exists and is unwatched.
    pub async fn video_unlocked(&self, user_id: i64, kind: VideoKind) -> Result<bool> {
        let conn = self.connect()?;
        let unlocked = query_i64(
            &conn,
            r#"
            SELECT NOT EXISTS(SELECT 1 FROM videos WHERE type = ?1)
                OR EXISTS(SELECT 1 FROM video_watches WHERE user_id = ?2 AND type = ?1)
            "#,
            params![kind.as_str(), user_id],
        )
        .await?;
        Ok(unlocked == 1)
    }
}
