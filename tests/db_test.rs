mod common;

use common::{create_test_db, create_user, registration, seed_questions};
use quizcase::db::{Db, InsertAttempt, InsertUser};
use quizcase::models::{Assessment, Language, NewAttempt, VideoKind};
use quizcase::services::assessment::{AssessmentError, AssessmentService, Submission};

fn attempt(user_id: i64, assessment: Assessment, language: Language, score: i64, school: Option<&str>) -> NewAttempt {
    let count = assessment.question_count();
    NewAttempt {
        user_id,
        assessment,
        question_ids: (1..=count as i64).collect(),
        answers: vec![0; count],
        score,
        language,
        school_name: school.map(str::to_string),
        time_taken: Some(120),
    }
}

async fn insert(db: &Db, attempt: &NewAttempt) -> i64 {
    match db.insert_attempt(attempt).await.unwrap() {
        InsertAttempt::Inserted(id) => id,
        InsertAttempt::Duplicate => panic!("unexpected duplicate"),
    }
}

// ----- users -----

#[tokio::test]
async fn registering_the_same_email_twice_is_rejected() {
    let db = create_test_db().await;
    create_user(&db, "a@x.com", "Lincoln High").await;

    let again = db
        .create_user(&registration("a@x.com", "Other"), Language::English)
        .await
        .unwrap();
    assert!(matches!(again, InsertUser::EmailTaken));
    assert!(db.email_exists("a@x.com").await.unwrap());
}

#[tokio::test]
async fn members_are_stored_in_order_with_the_user() {
    let db = create_test_db().await;
    let mut reg = registration("lead@x.com", "Lincoln High");
    reg.members = vec![
        common::person("m1@x.com", "Lincoln High"),
        common::person("m2@x.com", "Lincoln High"),
    ];
    let InsertUser::Created(id) = db.create_user(&reg, Language::Sinhala).await.unwrap() else {
        panic!("user not created");
    };

    let profile = db.get_user_profile(id).await.unwrap().unwrap();
    assert_eq!(profile.user.language, "Sinhala");
    let emails: Vec<&str> = profile.members.iter().map(|m| m.email.as_str()).collect();
    assert_eq!(emails, vec!["m1@x.com", "m2@x.com"]);
}

#[tokio::test]
async fn sessions_resolve_to_their_user_until_logout() {
    let db = create_test_db().await;
    let id = create_user(&db, "a@x.com", "Lincoln High").await;

    assert!(db.verify_user_password("a@x.com", "password123").await.unwrap());
    assert!(!db.verify_user_password("a@x.com", "wrong-password").await.unwrap());

    let token = db.create_user_session(id).await.unwrap();
    let user = db.get_user_by_session(&token).await.unwrap().unwrap();
    assert_eq!(user.id, id);
    assert_eq!(user.school_name, "Lincoln High");

    db.delete_user_session(&token).await.unwrap();
    assert!(db.get_user_by_session(&token).await.unwrap().is_none());
}

// ----- attempts -----

#[tokio::test]
async fn storage_allows_one_quiz_attempt_per_language() {
    let db = create_test_db().await;
    let id = create_user(&db, "a@x.com", "Lincoln High").await;

    insert(&db, &attempt(id, Assessment::Quiz, Language::English, 7, Some("Lincoln High"))).await;
    let dup = db
        .insert_attempt(&attempt(id, Assessment::Quiz, Language::English, 9, Some("Lincoln High")))
        .await
        .unwrap();
    assert_eq!(dup, InsertAttempt::Duplicate);

    insert(&db, &attempt(id, Assessment::Quiz, Language::Sinhala, 3, Some("Lincoln High"))).await;
    assert!(db
        .attempt_exists(id, Assessment::Quiz, Some(Language::Sinhala))
        .await
        .unwrap());
}

#[tokio::test]
async fn case_attempts_are_one_per_user_whatever_the_language() {
    let db = create_test_db().await;
    let id = create_user(&db, "a@x.com", "Lincoln High").await;

    insert(&db, &attempt(id, Assessment::Case, Language::English, 4, None)).await;
    let dup = db
        .insert_attempt(&attempt(id, Assessment::Case, Language::Sinhala, 4, None))
        .await
        .unwrap();
    assert_eq!(dup, InsertAttempt::Duplicate);
}

#[tokio::test]
async fn double_record_leaves_one_attempt() {
    let db = create_test_db().await;
    let id = create_user(&db, "a@x.com", "Lincoln High").await;
    let service = AssessmentService::new(db.clone());
    let new = attempt(id, Assessment::Quiz, Language::English, 5, Some("Lincoln High"));

    service.record(&new).await.unwrap();
    let second = service.record(&new).await.unwrap_err();
    assert!(matches!(second, AssessmentError::AlreadyAttempted));

    let rows = db.attempt_status(Assessment::Quiz, None).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn submit_grades_the_questions_that_were_served() {
    let db = create_test_db().await;
    seed_questions(&db, Assessment::Case, Language::English, 12).await;
    let id = create_user(&db, "a@x.com", "Lincoln High").await;
    let user = db.find_user_by_email("a@x.com").await.unwrap().unwrap();
    let service = AssessmentService::new(db.clone());

    let served = service
        .questions_for(&user, Assessment::Case, Language::English)
        .await
        .unwrap();
    let again = service
        .questions_for(&user, Assessment::Case, Language::English)
        .await
        .unwrap();
    assert_eq!(served, again);

    // Every seeded question is keyed to option 0.
    let receipt = service
        .submit(
            &user,
            Assessment::Case,
            Language::English,
            Submission {
                answers: vec![0; 10],
                time_taken: Some(600),
            },
        )
        .await
        .unwrap();
    assert_eq!(receipt.score, 10);

    let stored = db
        .get_attempt(Assessment::Case, receipt.attempt_id)
        .await
        .unwrap()
        .unwrap();
    let served_ids: Vec<i64> = served.iter().map(|q| q.id).collect();
    assert_eq!(stored.question_ids, served_ids);
    assert_eq!(stored.answers.len(), stored.question_ids.len());
    assert!(db
        .find_draft(id, Assessment::Case, None)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn case_study_switching_language_serves_and_records_that_language() {
    let db = create_test_db().await;
    let english = seed_questions(&db, Assessment::Case, Language::English, 10).await;
    let sinhala = seed_questions(&db, Assessment::Case, Language::Sinhala, 10).await;
    create_user(&db, "a@x.com", "Lincoln High").await;
    let user = db.find_user_by_email("a@x.com").await.unwrap().unwrap();
    let service = AssessmentService::new(db.clone());

    let first = service
        .questions_for(&user, Assessment::Case, Language::English)
        .await
        .unwrap();
    assert!(first.iter().all(|q| q.language == Language::English));

    let switched = service
        .questions_for(&user, Assessment::Case, Language::Sinhala)
        .await
        .unwrap();
    assert!(switched.iter().all(|q| q.language == Language::Sinhala));

    let receipt = service
        .submit(
            &user,
            Assessment::Case,
            Language::Sinhala,
            Submission {
                answers: vec![0; 10],
                time_taken: None,
            },
        )
        .await
        .unwrap();

    let stored = db
        .get_attempt(Assessment::Case, receipt.attempt_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.language, "Sinhala");
    assert!(stored.question_ids.iter().all(|id| sinhala.contains(id)));
    assert!(!stored.question_ids.iter().any(|id| english.contains(id)));
    assert_eq!(
        stored.question_ids,
        switched.iter().map(|q| q.id).collect::<Vec<_>>()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submits_record_one_attempt() {
    let db = create_test_db().await;
    seed_questions(&db, Assessment::Quiz, Language::English, 20).await;
    create_user(&db, "a@x.com", "Lincoln High").await;
    let user = db.find_user_by_email("a@x.com").await.unwrap().unwrap();
    let service = AssessmentService::new(db.clone());

    let submission = || Submission {
        answers: vec![0; 15],
        time_taken: Some(120),
    };
    let (a, b) = tokio::join!(
        service.submit(&user, Assessment::Quiz, Language::English, submission()),
        service.submit(&user, Assessment::Quiz, Language::English, submission()),
    );

    let (ok, rejected) = match (a, b) {
        (Ok(receipt), Err(e)) | (Err(e), Ok(receipt)) => (receipt, e),
        (a, b) => panic!("expected one success and one rejection, got {a:?} and {b:?}"),
    };
    assert_eq!(ok.score, 15);
    assert!(matches!(rejected, AssessmentError::AlreadyAttempted));

    let rows = db.attempt_status(Assessment::Quiz, None).await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn first_draft_wins() {
    let db = create_test_db().await;
    let id = create_user(&db, "a@x.com", "Lincoln High").await;

    let first = db
        .save_draft(id, Assessment::Quiz, Some(Language::English), &[3, 1, 2])
        .await
        .unwrap();
    let second = db
        .save_draft(id, Assessment::Quiz, Some(Language::English), &[9, 8, 7])
        .await
        .unwrap();
    assert_eq!(first, vec![3, 1, 2]);
    assert_eq!(second, vec![3, 1, 2]);

    // A different language is a different key.
    let sinhala = db
        .save_draft(id, Assessment::Quiz, Some(Language::Sinhala), &[4])
        .await
        .unwrap();
    assert_eq!(sinhala, vec![4]);
}

// ----- questions -----

#[tokio::test]
async fn questions_by_ids_keeps_the_requested_order() {
    let db = create_test_db().await;
    let ids = seed_questions(&db, Assessment::Quiz, Language::English, 4).await;

    let wanted = vec![ids[2], ids[0], 999_999, ids[3]];
    let found = db.questions_by_ids(Assessment::Quiz, &wanted).await.unwrap();
    let found_ids: Vec<i64> = found.iter().map(|q| q.id).collect();
    assert_eq!(found_ids, vec![ids[2], ids[0], ids[3]]);
}

#[tokio::test]
async fn question_lists_filter_by_language() {
    let db = create_test_db().await;
    seed_questions(&db, Assessment::Quiz, Language::English, 3).await;
    seed_questions(&db, Assessment::Quiz, Language::Sinhala, 2).await;

    let sinhala = db
        .list_questions(Assessment::Quiz, Some(Language::Sinhala))
        .await
        .unwrap();
    assert_eq!(sinhala.len(), 2);
    assert!(sinhala.iter().all(|q| q.language == Language::Sinhala));
    assert_eq!(db.list_questions(Assessment::Quiz, None).await.unwrap().len(), 5);
    assert!(db.list_questions(Assessment::Case, None).await.unwrap().is_empty());
}

// ----- reports -----

#[tokio::test]
async fn rollup_counts_every_attempt_once() {
    let db = create_test_db().await;
    let a = create_user(&db, "a@x.com", "Lincoln High").await;
    let b = create_user(&db, "b@x.com", "Lincoln High").await;
    let c = create_user(&db, "c@x.com", "Hill College").await;
    let d = create_user(&db, "d@x.com", "").await;

    insert(&db, &attempt(a, Assessment::Quiz, Language::English, 10, Some("Lincoln High"))).await;
    insert(&db, &attempt(b, Assessment::Quiz, Language::English, 5, Some("Lincoln High"))).await;
    insert(&db, &attempt(c, Assessment::Quiz, Language::English, 9, Some("Hill College"))).await;
    insert(&db, &attempt(d, Assessment::Quiz, Language::English, 2, None)).await;

    let rollup = db.school_rollup(Assessment::Quiz).await.unwrap();
    let total: i64 = rollup.iter().map(|r| r.attempt_count).sum();
    assert_eq!(total, 4);

    let find = |school: &str| rollup.iter().find(|r| r.school_name == school).unwrap();
    assert_eq!(find("Lincoln High").average_score, 7.5);
    assert_eq!(find("Hill College").average_score, 9.0);
    assert_eq!(find("N/A").attempt_count, 1);
}

#[tokio::test]
async fn deleting_a_schools_attempts_removes_its_bucket() {
    let db = create_test_db().await;
    let a = create_user(&db, "a@x.com", "Lincoln High").await;
    let c = create_user(&db, "c@x.com", "Hill College").await;
    insert(&db, &attempt(a, Assessment::Quiz, Language::English, 10, Some("Lincoln High"))).await;
    insert(&db, &attempt(c, Assessment::Quiz, Language::English, 9, Some("Hill College"))).await;

    let deleted = db
        .delete_attempts_by_school(Assessment::Quiz, "Lincoln High")
        .await
        .unwrap();
    assert_eq!(deleted, 1);

    let rollup = db.school_rollup(Assessment::Quiz).await.unwrap();
    assert!(rollup.iter().all(|r| r.school_name != "Lincoln High"));
    assert_eq!(rollup.len(), 1);
    assert!(!db
        .attempt_exists(a, Assessment::Quiz, Some(Language::English))
        .await
        .unwrap());
}

#[tokio::test]
async fn attempts_of_deleted_users_show_placeholders() {
    let db = create_test_db().await;
    let a = create_user(&db, "a@x.com", "Lincoln High").await;
    insert(&db, &attempt(a, Assessment::Case, Language::English, 6, None)).await;

    assert!(db.delete_user(a).await.unwrap());

    let rows = db.attempt_status(Assessment::Case, None).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_name, "Deleted User");
    assert_eq!(rows[0].email, "N/A");
    assert_eq!(rows[0].school_name, "N/A");
    assert_eq!(rows[0].total_questions, 10);

    let marks = db.marks_by_user(Assessment::Case).await.unwrap();
    assert_eq!(marks.len(), 1);
    assert_eq!(marks[0].marks, 6);
    assert!(marks[0].email.is_none());
}

#[tokio::test]
async fn schools_come_from_users_and_attempts() {
    let db = create_test_db().await;
    let a = create_user(&db, "a@x.com", "Lincoln High").await;
    create_user(&db, "b@x.com", "Hill College").await;
    insert(&db, &attempt(a, Assessment::Quiz, Language::English, 1, Some("Old School"))).await;

    let schools = db.school_names().await.unwrap();
    assert_eq!(schools, vec!["Hill College", "Lincoln High", "Old School"]);
}

// ----- videos -----

#[tokio::test]
async fn assessments_lock_only_behind_an_unwatched_video() {
    let db = create_test_db().await;
    let a = create_user(&db, "a@x.com", "Lincoln High").await;

    assert!(db.video_unlocked(a, VideoKind::Intro).await.unwrap());

    assert!(db.create_video(VideoKind::Intro, "https://v.example/intro").await.unwrap());
    assert!(!db.create_video(VideoKind::Intro, "https://v.example/again").await.unwrap());
    assert!(!db.video_unlocked(a, VideoKind::Intro).await.unwrap());
    assert!(db.video_unlocked(a, VideoKind::Case).await.unwrap());

    db.mark_video_watched(a, VideoKind::Intro).await.unwrap();
    db.mark_video_watched(a, VideoKind::Intro).await.unwrap();
    assert!(db.video_unlocked(a, VideoKind::Intro).await.unwrap());
}

#[tokio::test]
async fn admin_stats_count_rows() {
    let db = create_test_db().await;
    create_user(&db, "a@x.com", "Lincoln High").await;
    seed_questions(&db, Assessment::Quiz, Language::English, 3).await;
    db.create_video(VideoKind::Case, "https://v.example/case").await.unwrap();

    let stats = db.admin_stats().await.unwrap();
    assert_eq!(stats.users, 1);
    assert_eq!(stats.quiz_questions, 3);
    assert_eq!(stats.case_questions, 0);
    assert_eq!(stats.videos, 1);
}
