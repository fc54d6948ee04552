// Assessment shape
pub const QUIZ_QUESTION_COUNT: usize = 15;
pub const CASE_QUESTION_COUNT: usize = 10;
pub const QUIZ_OPTION_COUNT: usize = 5;
pub const MIN_CASE_OPTION_COUNT: usize = 2;
pub const QUIZ_TIME_LIMIT_SECONDS: i64 = 15 * 60;
pub const CASE_TIME_LIMIT_SECONDS: i64 = 20 * 60;

// Registration rules
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_TEAM_MEMBERS: usize = 4;
pub const MIN_AGE: i64 = 1;
pub const MAX_AGE: i64 = 150;
pub const GENDERS: &[&str] = &["male", "female", "other", "prefer-not-to-say"];
pub const GRADES: &[&str] = &["9", "10", "11", "12", "13", "University", "College"];

// Placeholders for reports
pub const UNKNOWN_SCHOOL: &str = "N/A";
pub const DELETED_USER: &str = "Deleted User";
pub const UNKNOWN_EMAIL: &str = "N/A";

// Messages shared between handlers and tests
pub const ALREADY_ATTEMPTED: &str = "You have already attempted this assessment";
pub const VIDEO_LOCKED: &str = "Please watch the video first";
pub const EMAIL_TAKEN: &str = "Email already registered";
