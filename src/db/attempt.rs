use color_eyre::Result;
use libsql::params;

use super::helpers::{from_json, is_unique_violation, query_all, query_i64, query_optional, to_json};
use super::models::{Attempt, AttemptRow, AttemptStatus, AttemptStatusRow};
use super::Db;
use crate::models::{Assessment, Language, NewAttempt};
use crate::names;

const ATTEMPT_COLUMNS: &str =
    "id, user_id, question_ids, answers, score, language, school_name, time_taken, submitted_at";

/// Result of writing an attempt. `Duplicate` means the one-attempt key is taken.
#[derive(Debug, PartialEq, Eq)]
pub enum InsertAttempt {
    Inserted(i64),
    Duplicate,
}

/// Column value for the gate key; case attempts ignore language.
fn gate_key(language: Option<Language>) -> &'static str {
    language.map(Language::as_str).unwrap_or("")
}

/// Attempts without a school snapshot are reported under the placeholder bucket.
pub(super) fn school_bucket(column: &str) -> String {
    format!(
        "COALESCE(NULLIF(TRIM({column}), ''), '{}')",
        names::UNKNOWN_SCHOOL
    )
}

impl Db {
    pub async fn attempt_exists(
        &self,
        user_id: i64,
        assessment: Assessment,
        language: Option<Language>,
    ) -> Result<bool> {
        let conn = self.connect()?;
        let table = assessment.attempts_table();
        let exists = match language {
            Some(language) => {
                query_i64(
                    &conn,
                    &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE user_id = ? AND language = ?)"),
                    params![user_id, language.as_str()],
                )
                .await?
            }
            None => {
                query_i64(
                    &conn,
                    &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE user_id = ?)"),
                    params![user_id],
                )
                .await?
            }
        };
        Ok(exists == 1)
    }

    /// Writes the attempt; a collision on the unique key is reported as
    /// `Duplicate` rather than an error.
    pub async fn insert_attempt(&self, attempt: &NewAttempt) -> Result<InsertAttempt> {
        let conn = self.connect()?;
        let table = attempt.assessment.attempts_table();

        let inserted = conn
            .query(
                &format!(
                    "INSERT INTO {table} (user_id, question_ids, answers, score, language, school_name, time_taken) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING id"
                ),
                params![
                    attempt.user_id,
                    to_json(&attempt.question_ids)?,
                    to_json(&attempt.answers)?,
                    attempt.score,
                    attempt.language.as_str(),
                    attempt.school_name.as_deref(),
                    attempt.time_taken
                ],
            )
            .await;

        let id = match inserted {
            Ok(mut rows) => match rows.next().await? {
                Some(row) => row.get::<i64>(0)?,
                None => return Err(color_eyre::eyre::eyre!("could not get attempt id")),
            },
            Err(e) if is_unique_violation(&e) => return Ok(InsertAttempt::Duplicate),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            "{} attempt {id} recorded for user={} language={} score={}",
            attempt.assessment,
            attempt.user_id,
            attempt.language,
            attempt.score
        );
        Ok(InsertAttempt::Inserted(id))
    }

    pub async fn get_attempt(&self, assessment: Assessment, id: i64) -> Result<Option<Attempt>> {
        let conn = self.connect()?;
        let row: Option<AttemptRow> = query_optional(
            &conn,
            &format!(
                "SELECT {ATTEMPT_COLUMNS} FROM {} WHERE id = ?",
                assessment.attempts_table()
            ),
            params![id],
        )
        .await?;
        row.map(Attempt::try_from).transpose()
    }

    pub async fn delete_attempt(&self, assessment: Assessment, id: i64) -> Result<bool> {
        let conn = self.connect()?;
        let deleted = conn
            .execute(
                &format!("DELETE FROM {} WHERE id = ?", assessment.attempts_table()),
                params![id],
            )
            .await?;

        tracing::info!("{assessment} attempt {id} deleted: {deleted} row(s)");
        Ok(deleted > 0)
    }

    /// Deletes every attempt filed under `school_name`, using the same bucketing
    /// as the per-school rollup (so `N/A` clears attempts without a school).
    pub async fn delete_attempts_by_school(
        &self,
        assessment: Assessment,
        school_name: &str,
    ) -> Result<u64> {
        let conn = self.connect()?;
        let deleted = conn
            .execute(
                &format!(
                    "DELETE FROM {} WHERE {} = ?",
                    assessment.attempts_table(),
                    school_bucket("school_name")
                ),
                params![school_name.trim()],
            )
            .await?;

        tracing::info!("deleted {deleted} {assessment} attempt(s) of school {school_name:?}");
        Ok(deleted)
    }

    /// One row per attempt, newest first, with owner details or placeholders.
    pub async fn attempt_status(
        &self,
        assessment: Assessment,
        school_name: Option<&str>,
    ) -> Result<Vec<AttemptStatus>> {
        let conn = self.connect()?;
        let select = format!(
            r#"
            SELECT a.id, a.user_id, a.question_ids, a.answers, a.score, a.language, a.school_name,
                   a.time_taken, a.submitted_at,
                   u.first_name AS owner_first_name, u.last_name AS owner_last_name,
                   u.email AS owner_email, u.school_name AS owner_school
            FROM {} a
            LEFT JOIN users u ON u.id = a.user_id
            "#,
            assessment.attempts_table()
        );

        let rows: Vec<AttemptStatusRow> = match school_name {
            Some(school) => {
                query_all(
                    &conn,
                    &format!(
                        "{select} WHERE {} = ? ORDER BY a.submitted_at DESC, a.id DESC",
                        school_bucket("a.school_name")
                    ),
                    params![school.trim()],
                )
                .await?
            }
            None => {
                query_all(
                    &conn,
                    &format!("{select} ORDER BY a.submitted_at DESC, a.id DESC"),
                    (),
                )
                .await?
            }
        };

        rows.into_iter().map(AttemptStatus::try_from).collect()
    }

    pub async fn find_draft(
        &self,
        user_id: i64,
        assessment: Assessment,
        language: Option<Language>,
    ) -> Result<Option<Vec<i64>>> {
        #[derive(serde::Deserialize)]
        struct Draft {
            question_ids: String,
        }

        let conn = self.connect()?;
        let draft: Option<Draft> = query_optional(
            &conn,
            "SELECT question_ids FROM attempt_drafts WHERE user_id = ? AND assessment = ? AND gate_language = ?",
            params![user_id, assessment.as_str(), gate_key(language)],
        )
        .await?;

        draft.map(|d| from_json(&d.question_ids)).transpose()
    }

    /// Stores the drawn set unless one is already stored, and returns whichever
    /// set is stored afterwards.
    pub async fn save_draft(
        &self,
        user_id: i64,
        assessment: Assessment,
        language: Option<Language>,
        question_ids: &[i64],
    ) -> Result<Vec<i64>> {
        let conn = self.connect()?;
        conn.execute(
            r#"INSERT INTO attempt_drafts (user_id, assessment, gate_language, question_ids)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(user_id, assessment, gate_language) DO NOTHING"#,
            params![
                user_id,
                assessment.as_str(),
                gate_key(language),
                to_json(question_ids)?
            ],
        )
        .await?;

        match self.find_draft(user_id, assessment, language).await? {
            Some(stored) => Ok(stored),
            None => Ok(question_ids.to_vec()),
        }
    }

    pub async fn clear_draft(
        &self,
        user_id: i64,
        assessment: Assessment,
        language: Option<Language>,
    ) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "DELETE FROM attempt_drafts WHERE user_id = ? AND assessment = ? AND gate_language = ?",
            params![user_id, assessment.as_str(), gate_key(language)],
        )
        .await?;
        Ok(())
    }
}
