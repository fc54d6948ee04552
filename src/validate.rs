//! Request validation. Every check runs and all problems are reported together.

use crate::db::UserUpdate;
use crate::models::{
    normalize_email, Assessment, Language, NewQuestion, Person, QuestionInput, Registration,
    UserEdit,
};
use crate::names;
use crate::utils::non_blank;

fn is_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

fn is_whatsapp_number(number: &str) -> bool {
    let digits = number.strip_prefix('+').unwrap_or(number);
    (9..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// Personal-field rules shared by users and members. Expects a normalized person.
fn check_person(person: &Person, label: &str, errors: &mut Vec<String>) {
    let required = [
        (&person.first_name, "first name"),
        (&person.last_name, "last name"),
        (&person.school_name, "school name"),
    ];
    for (value, field) in required {
        if value.is_empty() {
            errors.push(format!("{label}: {field} is required"));
        }
    }

    if person.whatsapp_number.is_empty() {
        errors.push(format!("{label}: WhatsApp number is required"));
    } else if !is_whatsapp_number(&person.whatsapp_number) {
        errors.push(format!("{label}: WhatsApp number must be 9-15 digits"));
    }

    if !is_email(&person.email) {
        errors.push(format!("{label}: a valid email is required"));
    }
    if !names::GENDERS.contains(&person.gender.as_str()) {
        errors.push(format!(
            "{label}: gender must be one of {}",
            names::GENDERS.join(", ")
        ));
    }
    if !(names::MIN_AGE..=names::MAX_AGE).contains(&person.age) {
        errors.push(format!(
            "{label}: age must be between {} and {}",
            names::MIN_AGE,
            names::MAX_AGE
        ));
    }
    if !names::GRADES.contains(&person.grade.as_str()) {
        errors.push(format!(
            "{label}: grade must be one of {}",
            names::GRADES.join(", ")
        ));
    }
}

fn check_password(password: &str, errors: &mut Vec<String>) {
    if password.chars().count() < names::MIN_PASSWORD_LENGTH {
        errors.push(format!(
            "password must be at least {} characters",
            names::MIN_PASSWORD_LENGTH
        ));
    }
}

fn check_language(language: &str, errors: &mut Vec<String>) -> Option<Language> {
    match language.parse() {
        Ok(language) => Some(language),
        Err(e) => {
            errors.push(e.to_string());
            None
        }
    }
}

/// Normalizes and checks a registration, returning it with its parsed language.
pub fn registration(registration: Registration) -> Result<(Registration, Language), Vec<String>> {
    let registration = Registration {
        person: registration.person.normalized(),
        members: registration
            .members
            .into_iter()
            .map(Person::normalized)
            .collect(),
        ..registration
    };

    let mut errors = Vec::new();
    check_person(&registration.person, "user", &mut errors);
    check_password(&registration.password, &mut errors);
    let language = check_language(&registration.language, &mut errors);

    if registration.members.len() > names::MAX_TEAM_MEMBERS {
        errors.push(format!(
            "at most {} team members are allowed",
            names::MAX_TEAM_MEMBERS
        ));
    }

    let mut seen: Vec<&str> = Vec::with_capacity(registration.members.len());
    for (i, member) in registration.members.iter().enumerate() {
        let label = format!("member {}", i + 1);
        check_person(member, &label, &mut errors);

        if member.email == registration.person.email {
            errors.push(format!("{label}: email must differ from the registering user's"));
        } else if seen.contains(&member.email.as_str()) {
            errors.push(format!("{label}: email is used by another member"));
        }
        seen.push(&member.email);
    }

    match language {
        Some(language) if errors.is_empty() => Ok((registration, language)),
        _ => Err(errors),
    }
}

pub fn user_edit(edit: UserEdit) -> Result<UserUpdate, Vec<String>> {
    let person = edit.person.normalized();
    let password = non_blank(edit.password.as_deref());

    let mut errors = Vec::new();
    check_person(&person, "user", &mut errors);
    if let Some(password) = &password {
        check_password(password, &mut errors);
    }
    let language = check_language(&edit.language, &mut errors);

    match language {
        Some(language) if errors.is_empty() => Ok(UserUpdate {
            person,
            language,
            password,
        }),
        _ => Err(errors),
    }
}

/// Quiz questions need exactly five options, case questions at least two, and
/// the answer key must point at one of them.
pub fn question(assessment: Assessment, input: QuestionInput) -> Result<NewQuestion, Vec<String>> {
    let mut errors = Vec::new();

    let text = input.question.trim().to_string();
    if text.is_empty() {
        errors.push("question text is required".to_string());
    }

    let options: Vec<String> = input.options.iter().map(|o| o.trim().to_string()).collect();
    match assessment {
        Assessment::Quiz if options.len() != names::QUIZ_OPTION_COUNT => errors.push(format!(
            "quiz questions need exactly {} options",
            names::QUIZ_OPTION_COUNT
        )),
        Assessment::Case if options.len() < names::MIN_CASE_OPTION_COUNT => errors.push(format!(
            "case study questions need at least {} options",
            names::MIN_CASE_OPTION_COUNT
        )),
        _ => {}
    }
    if options.iter().any(String::is_empty) {
        errors.push("options must not be empty".to_string());
    }

    let in_range = usize::try_from(input.correct_answer).is_ok_and(|i| i < options.len());
    if !in_range {
        errors.push("correct answer must be the index of an option".to_string());
    }

    let language = check_language(&input.language, &mut errors);

    match language {
        Some(language) if errors.is_empty() => Ok(NewQuestion {
            question: text,
            options,
            correct_answer: input.correct_answer,
            language,
            school_name: non_blank(input.school_name.as_deref()),
        }),
        _ => Err(errors),
    }
}

/// Bulk-add rows are registrations without a guaranteed normalized email list;
/// duplicates inside one batch are caught here, clashes with stored users by the database.
pub fn batch_emails(registrations: &[Registration]) -> Vec<String> {
    let mut seen = Vec::new();
    let mut errors = Vec::new();
    for (i, registration) in registrations.iter().enumerate() {
        let email = normalize_email(&registration.person.email);
        if seen.contains(&email) {
            errors.push(format!("user {}: email {email} appears twice", i + 1));
        }
        seen.push(email);
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(email: &str) -> Person {
        Person {
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            email: email.to_string(),
            whatsapp_number: "+94771234567".to_string(),
            gender: "female".to_string(),
            age: 16,
            grade: "10".to_string(),
            school_name: "Lincoln High".to_string(),
        }
    }

    fn registration_with(members: Vec<Person>) -> Registration {
        Registration {
            person: person(" A@X.com "),
            password: "password123".to_string(),
            language: "english".to_string(),
            members,
        }
    }

    #[test]
    fn accepts_and_normalizes_a_valid_registration() {
        let (reg, language) = registration(registration_with(vec![person("b@x.com")])).unwrap();
        assert_eq!(reg.person.email, "a@x.com");
        assert_eq!(language, Language::English);
        assert_eq!(reg.members.len(), 1);
    }

    #[test]
    fn rejects_duplicate_member_emails_ignoring_case() {
        let errors =
            registration(registration_with(vec![person("b@x.com"), person("B@X.COM")])).unwrap_err();
        assert_eq!(errors, vec!["member 2: email is used by another member"]);
    }

    #[test]
    fn rejects_member_sharing_the_users_email() {
        let errors = registration(registration_with(vec![person("a@x.com")])).unwrap_err();
        assert_eq!(
            errors,
            vec!["member 1: email must differ from the registering user's"]
        );
    }

    #[test]
    fn reports_every_problem_at_once() {
        let mut reg = registration_with(Vec::new());
        reg.person.age = 0;
        reg.person.grade = "8".to_string();
        reg.person.whatsapp_number = "12ab".to_string();
        reg.password = "short".to_string();
        reg.language = "Tamil".to_string();

        let errors = registration(reg).unwrap_err();
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn caps_team_size() {
        let members = (0..5).map(|i| person(&format!("m{i}@x.com"))).collect();
        let errors = registration(registration_with(members)).unwrap_err();
        assert_eq!(errors, vec!["at most 4 team members are allowed"]);
    }

    #[test]
    fn email_shape() {
        assert!(is_email("a@x.com"));
        assert!(!is_email("a@x"));
        assert!(!is_email("@x.com"));
        assert!(!is_email("a@@x.com"));
        assert!(!is_email("a b@x.com"));
    }

    #[test]
    fn quiz_questions_need_five_options_and_a_valid_key() {
        let input = QuestionInput {
            question: "2 + 2?".to_string(),
            options: vec!["1", "2", "3", "4"].into_iter().map(String::from).collect(),
            correct_answer: 4,
            language: "English".to_string(),
            school_name: Some("  ".to_string()),
        };
        assert_eq!(question(Assessment::Quiz, input.clone()).unwrap_err().len(), 2);

        let case = question(Assessment::Case, QuestionInput {
            correct_answer: 3,
            ..input
        })
        .unwrap();
        assert_eq!(case.options.len(), 4);
        assert_eq!(case.school_name, None);
    }

    #[test]
    fn user_edit_keeps_password_when_blank() {
        let update = user_edit(UserEdit {
            person: person("c@x.com"),
            language: "Sinhala".to_string(),
            password: Some(String::new()),
        })
        .unwrap();
        assert!(update.password.is_none());
        assert_eq!(update.language, Language::Sinhala);
    }

    #[test]
    fn batch_flags_repeated_emails() {
        let a = registration_with(Vec::new());
        let errors = batch_emails(&[a.clone(), a]);
        assert_eq!(errors, vec!["user 2: email a@x.com appears twice"]);
    }
}
