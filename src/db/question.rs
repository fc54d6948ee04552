use std::collections::HashMap;

use color_eyre::Result;
use libsql::params;

use super::helpers::{query_all, query_i64, query_optional, to_json};
use super::models::QuestionRow;
use super::Db;
use crate::models::{Assessment, Language, NewQuestion, Question};

const QUESTION_COLUMNS: &str = "id, question, options, correct_answer, language, school_name";

fn decode(rows: Vec<QuestionRow>) -> Result<Vec<Question>> {
    rows.into_iter().map(Question::try_from).collect()
}

impl Db {
    pub async fn create_question(
        &self,
        assessment: Assessment,
        question: &NewQuestion,
    ) -> Result<i64> {
        let conn = self.connect()?;
        let id = query_i64(
            &conn,
            &format!(
                "INSERT INTO {} (question, options, correct_answer, language, school_name) VALUES (?, ?, ?, ?, ?) RETURNING id",
                assessment.questions_table()
            ),
            params![
                question.question.as_str(),
                to_json(&question.options)?,
                question.correct_answer,
                question.language.as_str(),
                question.school_name.as_deref()
            ],
        )
        .await?;

        tracing::info!("{assessment} question {id} created");
        Ok(id)
    }

    pub async fn list_questions(
        &self,
        assessment: Assessment,
        language: Option<Language>,
    ) -> Result<Vec<Question>> {
        let conn = self.connect()?;
        let table = assessment.questions_table();
        let rows = match language {
            Some(language) => {
                query_all(
                    &conn,
                    &format!("SELECT {QUESTION_COLUMNS} FROM {table} WHERE language = ? ORDER BY id"),
                    params![language.as_str()],
                )
                .await?
            }
            None => {
                query_all(
                    &conn,
                    &format!("SELECT {QUESTION_COLUMNS} FROM {table} ORDER BY id"),
                    (),
                )
                .await?
            }
        };
        decode(rows)
    }

    pub async fn get_question(&self, assessment: Assessment, id: i64) -> Result<Option<Question>> {
        let conn = self.connect()?;
        let row: Option<QuestionRow> = query_optional(
            &conn,
            &format!(
                "SELECT {QUESTION_COLUMNS} FROM {} WHERE id = ?",
                assessment.questions_table()
            ),
            params![id],
        )
        .await?;
        row.map(Question::try_from).transpose()
    }

    /// Returns the questions in the order of `ids`, skipping ids that no longer exist.
    pub async fn questions_by_ids(&self, assessment: Assessment, ids: &[i64]) -> Result<Vec<Question>> {
        let conn = self.connect()?;
        let rows = query_all(
            &conn,
            &format!(
                "SELECT {QUESTION_COLUMNS} FROM {} WHERE id IN (SELECT value FROM json_each(?))",
                assessment.questions_table()
            ),
            params![to_json(ids)?],
        )
        .await?;

        let mut by_id: HashMap<i64, Question> = decode(rows)?
            .into_iter()
            .map(|q| (q.id, q))
            .collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    pub async fn update_question(
        &self,
        assessment: Assessment,
        id: i64,
        question: &NewQuestion,
    ) -> Result<bool> {
        let conn = self.connect()?;
        let updated = conn
            .execute(
                &format!(
                    "UPDATE {} SET question = ?, options = ?, correct_answer = ?, language = ?, school_name = ? WHERE id = ?",
                    assessment.questions_table()
                ),
                params![
                    question.question.as_str(),
                    to_json(&question.options)?,
                    question.correct_answer,
                    question.language.as_str(),
                    question.school_name.as_deref(),
                    id
                ],
            )
            .await?;

        tracing::info!("{assessment} question {id} updated: {updated} row(s)");
        Ok(updated > 0)
    }

    pub async fn delete_question(&self, assessment: Assessment, id: i64) -> Result<bool> {
        let conn = self.connect()?;
        let deleted = conn
            .execute(
                &format!("DELETE FROM {} WHERE id = ?", assessment.questions_table()),
                params![id],
            )
            .await?;

        tracing::info!("{assessment} question {id} deleted: {deleted} row(s)");
        Ok(deleted > 0)
    }
}
