use color_eyre::Result;

use super::attempt::school_bucket;
use super::helpers::query_all;
use super::models::{SchoolRollup, UserMarks};
use super::Db;
use crate::models::Assessment;

impl Db {
    /// Attempt count and mean score per school, mean rounded to two places.
    pub async fn school_rollup(&self, assessment: Assessment) -> Result<Vec<SchoolRollup>> {
        let conn = self.connect()?;
        query_all(
            &conn,
            &format!(
                r#"
                SELECT {bucket} AS school_name,
                       COUNT(*) AS attempt_count,
                       ROUND(AVG(a.score), 2) AS average_score
                FROM {table} a
                GROUP BY {bucket}
                ORDER BY school_name
                "#,
                bucket = school_bucket("a.school_name"),
                table = assessment.attempts_table()
            ),
            (),
        )
        .await
    }

    /// Summed score per user for one assessment. Owner columns are NULL for
    /// attempts whose user was deleted.
    pub async fn marks_by_user(&self, assessment: Assessment) -> Result<Vec<UserMarks>> {
        let conn = self.connect()?;
        query_all(
            &conn,
            &format!(
                r#"
                SELECT m.user_id, m.marks, u.first_name, u.last_name, u.email,
                       COALESCE(u.school_name, m.school_name) AS school_name
                FROM (
                    SELECT a.user_id, SUM(a.score) AS marks, MAX(a.school_name) AS school_name
                    FROM {} a
                    GROUP BY a.user_id
                ) m
                LEFT JOIN users u ON u.id = m.user_id
                ORDER BY m.user_id
                "#,
                assessment.attempts_table()
            ),
            (),
        )
        .await
    }
}
