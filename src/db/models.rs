// Database model structs

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};

use super::helpers::from_json;
use crate::{
    models::{Language, Question},
    names,
    utils::non_blank,
};

/// The user behind a bearer token.
#[derive(Clone, Debug, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub school_name: String,
    pub language: String,
}

impl AuthUser {
    /// Stored values are validated on write; anything unreadable falls back to English.
    pub fn preferred_language(&self) -> Language {
        self.language.parse().unwrap_or(Language::English)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct UserRecord {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub whatsapp_number: String,
    pub gender: String,
    pub age: i64,
    pub grade: String,
    pub school_name: String,
    pub language: String,
    pub last_login_at: Option<String>,
    pub created_at: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct MemberRecord {
    pub id: i64,
    pub position: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub whatsapp_number: String,
    pub gender: String,
    pub age: i64,
    pub grade: String,
    pub school_name: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: UserRecord,
    pub members: Vec<MemberRecord>,
}

#[derive(Deserialize)]
pub(super) struct QuestionRow {
    pub id: i64,
    pub question: String,
    pub options: String,
    pub correct_answer: i64,
    pub language: String,
    pub school_name: Option<String>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = color_eyre::Report;

    fn try_from(row: QuestionRow) -> Result<Self> {
        let language = row
            .language
            .parse()
            .map_err(|e| eyre!("question {}: {e}", row.id))?;
        Ok(Question {
            id: row.id,
            question: row.question,
            options: from_json(&row.options)?,
            correct_answer: row.correct_answer,
            language,
            school_name: row.school_name,
        })
    }
}

#[derive(Deserialize)]
pub(super) struct AttemptRow {
    pub id: i64,
    pub user_id: i64,
    pub question_ids: String,
    pub answers: String,
    pub score: i64,
    pub language: String,
    pub school_name: Option<String>,
    pub time_taken: Option<i64>,
    pub submitted_at: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Attempt {
    pub id: i64,
    pub user_id: i64,
    pub question_ids: Vec<i64>,
    pub answers: Vec<i64>,
    pub score: i64,
    pub language: String,
    pub school_name: Option<String>,
    pub time_taken: Option<i64>,
    pub submitted_at: String,
}

impl TryFrom<AttemptRow> for Attempt {
    type Error = color_eyre::Report;

    fn try_from(row: AttemptRow) -> Result<Self> {
        Ok(Attempt {
            id: row.id,
            user_id: row.user_id,
            question_ids: from_json(&row.question_ids)?,
            answers: from_json(&row.answers)?,
            score: row.score,
            language: row.language,
            school_name: row.school_name,
            time_taken: row.time_taken,
            submitted_at: row.submitted_at,
        })
    }
}

/// Attempt joined with its owner; owner columns are NULL once the user is deleted.
#[derive(Deserialize)]
pub(super) struct AttemptStatusRow {
    pub id: i64,
    pub user_id: i64,
    pub question_ids: String,
    pub answers: String,
    pub score: i64,
    pub language: String,
    pub school_name: Option<String>,
    pub time_taken: Option<i64>,
    pub submitted_at: String,
    pub owner_first_name: Option<String>,
    pub owner_last_name: Option<String>,
    pub owner_email: Option<String>,
    pub owner_school: Option<String>,
}

/// One row of the admin attempt review.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct AttemptStatus {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub email: String,
    pub school_name: String,
    pub score: i64,
    pub total_questions: usize,
    pub language: String,
    pub time_taken: Option<i64>,
    pub submitted_at: String,
    pub questions: Vec<i64>,
    pub answers: Vec<i64>,
}

impl TryFrom<AttemptStatusRow> for AttemptStatus {
    type Error = color_eyre::Report;

    fn try_from(row: AttemptStatusRow) -> Result<Self> {
        let questions: Vec<i64> = from_json(&row.question_ids)?;
        let user_name = match (row.owner_first_name, row.owner_last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            _ => names::DELETED_USER.to_string(),
        };
        let school_name = non_blank(row.school_name.as_deref())
            .or_else(|| non_blank(row.owner_school.as_deref()))
            .unwrap_or_else(|| names::UNKNOWN_SCHOOL.to_string());

        Ok(AttemptStatus {
            id: row.id,
            user_id: row.user_id,
            user_name,
            email: row
                .owner_email
                .unwrap_or_else(|| names::UNKNOWN_EMAIL.to_string()),
            school_name,
            score: row.score,
            total_questions: questions.len(),
            language: row.language,
            time_taken: row.time_taken,
            submitted_at: row.submitted_at,
            questions,
            answers: from_json(&row.answers)?,
        })
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct SchoolRollup {
    pub school_name: String,
    pub attempt_count: i64,
    pub average_score: f64,
}

/// Summed marks of one user for one assessment, with whatever owner fields still exist.
#[derive(Clone, Debug, Deserialize)]
pub struct UserMarks {
    pub user_id: i64,
    pub marks: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub school_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct LeaderboardEntry {
    pub user_id: i64,
    pub user_name: String,
    pub email: String,
    pub school_name: String,
    pub quiz_marks: i64,
    pub case_marks: i64,
    pub total_marks: i64,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct AdminStats {
    pub users: i64,
    pub members: i64,
    pub quiz_questions: i64,
    pub case_questions: i64,
    pub videos: i64,
    pub quiz_attempts: i64,
    pub case_attempts: i64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct Video {
    #[serde(rename(serialize = "type"))]
    pub kind: String,
    pub url: String,
    pub updated_at: String,
}
