use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::names;

/// The two assessments a registrant sits. They share one flow and differ in
/// question count, option rules and how attempts are keyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assessment {
    Quiz,
    Case,
}

impl Assessment {
    pub const ALL: [Assessment; 2] = [Assessment::Quiz, Assessment::Case];

    pub fn as_str(self) -> &'static str {
        match self {
            Assessment::Quiz => "quiz",
            Assessment::Case => "case",
        }
    }

    pub fn question_count(self) -> usize {
        match self {
            Assessment::Quiz => names::QUIZ_QUESTION_COUNT,
            Assessment::Case => names::CASE_QUESTION_COUNT,
        }
    }

    pub fn time_limit_seconds(self) -> i64 {
        match self {
            Assessment::Quiz => names::QUIZ_TIME_LIMIT_SECONDS,
            Assessment::Case => names::CASE_TIME_LIMIT_SECONDS,
        }
    }

    /// Language component of the one-attempt key. Quiz attempts are unique per
    /// language, case attempts per user.
    pub fn gate_language(self, language: Language) -> Option<Language> {
        match self {
            Assessment::Quiz => Some(language),
            Assessment::Case => None,
        }
    }

    /// Video that has to be watched before questions are served.
    pub fn unlocked_by(self) -> VideoKind {
        match self {
            Assessment::Quiz => VideoKind::Intro,
            Assessment::Case => VideoKind::Case,
        }
    }

    pub(crate) fn questions_table(self) -> &'static str {
        match self {
            Assessment::Quiz => "quiz_questions",
            Assessment::Case => "case_questions",
        }
    }

    pub(crate) fn attempts_table(self) -> &'static str {
        match self {
            Assessment::Quiz => "quiz_attempts",
            Assessment::Case => "case_attempts",
        }
    }
}

impl fmt::Display for Assessment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    English,
    Sinhala,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("language must be English or Sinhala")]
pub struct InvalidLanguage;

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Sinhala => "Sinhala",
        }
    }
}

impl FromStr for Language {
    type Err = InvalidLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            s if s.eq_ignore_ascii_case("english") => Ok(Language::English),
            s if s.eq_ignore_ascii_case("sinhala") => Ok(Language::Sinhala),
            _ => Err(InvalidLanguage),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoKind {
    Intro,
    Case,
}

impl VideoKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VideoKind::Intro => "intro",
            VideoKind::Case => "case",
        }
    }
}

impl FromStr for VideoKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intro" => Ok(VideoKind::Intro),
            "case" => Ok(VideoKind::Case),
            _ => Err(()),
        }
    }
}

/// A stored question with its answer key. Quiz questions carry exactly five
/// options, case questions at least two.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: i64,
    pub language: Language,
    pub school_name: Option<String>,
}

/// A validated question ready to be written.
#[derive(Clone, Debug, PartialEq)]
pub struct NewQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: i64,
    pub language: Language,
    pub school_name: Option<String>,
}

/// What a participant sees of a question.
#[derive(Clone, Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question: String,
    pub options: Vec<String>,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            question: q.question,
            options: q.options,
        }
    }
}

/// Attempt about to be persisted by the recorder.
#[derive(Clone, Debug, PartialEq)]
pub struct NewAttempt {
    pub user_id: i64,
    pub assessment: Assessment,
    pub question_ids: Vec<i64>,
    pub answers: Vec<i64>,
    pub score: i64,
    pub language: Language,
    pub school_name: Option<String>,
    pub time_taken: Option<i64>,
}

/// Personal fields shared by a registering user and their team members.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub whatsapp_number: String,
    pub gender: String,
    pub age: i64,
    pub grade: String,
    pub school_name: String,
}

impl Person {
    pub fn normalized(mut self) -> Self {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.email = normalize_email(&self.email);
        self.whatsapp_number = self.whatsapp_number.trim().to_string();
        self.gender = self.gender.trim().to_lowercase();
        self.grade = self.grade.trim().to_string();
        self.school_name = self.school_name.trim().to_string();
        self
    }
}

/// Registration payload, also used by admin bulk-add.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(flatten)]
    pub person: Person,
    pub password: String,
    pub language: String,
    #[serde(default)]
    pub members: Vec<Person>,
}

/// Admin edit of a user. Omitting `password` keeps the current one.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEdit {
    #[serde(flatten)]
    pub person: Person,
    pub language: String,
    #[serde(default)]
    pub password: Option<String>,
}

/// Question body as sent by the admin console.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: i64,
    pub language: String,
    #[serde(default)]
    pub school_name: Option<String>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_parses_case_insensitively() {
        assert_eq!("english".parse(), Ok(Language::English));
        assert_eq!(" Sinhala ".parse(), Ok(Language::Sinhala));
        assert_eq!("Tamil".parse::<Language>(), Err(InvalidLanguage));
    }

    #[test]
    fn only_quiz_attempts_are_keyed_by_language() {
        assert_eq!(
            Assessment::Quiz.gate_language(Language::Sinhala),
            Some(Language::Sinhala)
        );
        assert_eq!(Assessment::Case.gate_language(Language::Sinhala), None);
    }

    #[test]
    fn registration_accepts_flattened_person_fields() {
        let body = serde_json::json!({
            "firstName": "Ann",
            "lastName": "Lee",
            "email": "A@X.com ",
            "whatsappNumber": "0771234567",
            "gender": "female",
            "age": 16,
            "grade": "11",
            "schoolName": "Lincoln High",
            "password": "password123",
            "language": "English"
        });
        let reg: Registration = serde_json::from_value(body).unwrap();
        assert!(reg.members.is_empty());
        assert_eq!(reg.person.normalized().email, "a@x.com");
    }
}
