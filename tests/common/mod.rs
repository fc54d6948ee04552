#![allow(dead_code)]

use quizcase::db::{Db, InsertUser};
use quizcase::models::{Assessment, Language, NewQuestion, Person, Registration};

pub async fn create_test_db() -> Db {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let id = COUNTER.fetch_add(1, Ordering::SeqCst);
    let path =
        std::env::temp_dir().join(format!("quizcase_test_{}_{}.db", std::process::id(), id));
    // Clean up leftover file from previous runs
    let _ = std::fs::remove_file(&path);
    let url = format!("file:{}", path.display());
    Db::new(url, None)
        .await
        .expect("failed to create test database")
}

pub fn person(email: &str, school: &str) -> Person {
    Person {
        first_name: "Ann".to_string(),
        last_name: "Lee".to_string(),
        email: email.to_string(),
        whatsapp_number: "0771234567".to_string(),
        gender: "female".to_string(),
        age: 16,
        grade: "10".to_string(),
        school_name: school.to_string(),
    }
}

pub fn registration(email: &str, school: &str) -> Registration {
    Registration {
        person: person(email, school),
        password: "password123".to_string(),
        language: "English".to_string(),
        members: Vec::new(),
    }
}

pub async fn create_user(db: &Db, email: &str, school: &str) -> i64 {
    match db
        .create_user(&registration(email, school), Language::English)
        .await
        .expect("create user")
    {
        InsertUser::Created(id) => id,
        InsertUser::EmailTaken => panic!("email {email} already taken"),
    }
}

/// Seeds `n` questions whose answer key is option 0.
pub async fn seed_questions(db: &Db, assessment: Assessment, language: Language, n: usize) -> Vec<i64> {
    let option_count = match assessment {
        Assessment::Quiz => 5,
        Assessment::Case => 3,
    };
    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        let question = NewQuestion {
            question: format!("{assessment} question {i}"),
            options: (0..option_count).map(|o| format!("Option {o}")).collect(),
            correct_answer: 0,
            language,
            school_name: None,
        };
        ids.push(
            db.create_question(assessment, &question)
                .await
                .expect("create question"),
        );
    }
    ids
}
