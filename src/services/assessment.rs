use color_eyre::{eyre::eyre, Result};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use thiserror::Error;

use crate::db::{AuthUser, Db, InsertAttempt};
use crate::models::{Assessment, Language, NewAttempt, Question, VideoKind};
use crate::names;

// ---------------------------------------------------------------------------
// AssessmentRepository trait (what the attempt flow needs from storage)
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait AssessmentRepository: Send + Sync {
    fn question_pool(
        &self,
        assessment: Assessment,
        language: Language,
    ) -> impl std::future::Future<Output = Result<Vec<Question>>> + Send;

    fn questions_by_ids(
        &self,
        assessment: Assessment,
        ids: &[i64],
    ) -> impl std::future::Future<Output = Result<Vec<Question>>> + Send;

    fn attempt_exists(
        &self,
        user_id: i64,
        assessment: Assessment,
        language: Option<Language>,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn find_draft(
        &self,
        user_id: i64,
        assessment: Assessment,
        language: Option<Language>,
    ) -> impl std::future::Future<Output = Result<Option<Vec<i64>>>> + Send;

    fn save_draft(
        &self,
        user_id: i64,
        assessment: Assessment,
        language: Option<Language>,
        question_ids: &[i64],
    ) -> impl std::future::Future<Output = Result<Vec<i64>>> + Send;

    fn clear_draft(
        &self,
        user_id: i64,
        assessment: Assessment,
        language: Option<Language>,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn insert_attempt(
        &self,
        attempt: &NewAttempt,
    ) -> impl std::future::Future<Output = Result<InsertAttempt>> + Send;

    fn video_unlocked(
        &self,
        user_id: i64,
        kind: VideoKind,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;
}

impl AssessmentRepository for Db {
    async fn question_pool(&self, assessment: Assessment, language: Language) -> Result<Vec<Question>> {
        Db::list_questions(self, assessment, Some(language)).await
    }

    async fn questions_by_ids(&self, assessment: Assessment, ids: &[i64]) -> Result<Vec<Question>> {
        Db::questions_by_ids(self, assessment, ids).await
    }

    async fn attempt_exists(
        &self,
        user_id: i64,
        assessment: Assessment,
        language: Option<Language>,
    ) -> Result<bool> {
        Db::attempt_exists(self, user_id, assessment, language).await
    }

    async fn find_draft(
        &self,
        user_id: i64,
        assessment: Assessment,
        language: Option<Language>,
    ) -> Result<Option<Vec<i64>>> {
        Db::find_draft(self, user_id, assessment, language).await
    }

    async fn save_draft(
        &self,
        user_id: i64,
        assessment: Assessment,
        language: Option<Language>,
        question_ids: &[i64],
    ) -> Result<Vec<i64>> {
        Db::save_draft(self, user_id, assessment, language, question_ids).await
    }

    async fn clear_draft(
        &self,
        user_id: i64,
        assessment: Assessment,
        language: Option<Language>,
    ) -> Result<()> {
        Db::clear_draft(self, user_id, assessment, language).await
    }

    async fn insert_attempt(&self, attempt: &NewAttempt) -> Result<InsertAttempt> {
        Db::insert_attempt(self, attempt).await
    }

    async fn video_unlocked(&self, user_id: i64, kind: VideoKind) -> Result<bool> {
        Db::video_unlocked(self, user_id, kind).await
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum AssessmentError {
    /// An attempt already exists for the gate key.
    #[error("{}", names::ALREADY_ATTEMPTED)]
    AlreadyAttempted,
    /// The unlocking video exists and has not been watched.
    #[error("{}", names::VIDEO_LOCKED)]
    VideoLocked,
    /// The question store holds fewer matching questions than one draw needs.
    #[error("not enough questions: {available} available, {required} required")]
    InsufficientQuestions { available: usize, required: usize },
    #[error("expected {expected} answers, got {got}")]
    MalformedSubmission { expected: usize, got: usize },
    #[error("answer {} has invalid option index {value}", position + 1)]
    InvalidAnswerIndex { position: usize, value: i64 },
    #[error(transparent)]
    Storage(#[from] color_eyre::Report),
}

// ---------------------------------------------------------------------------
// Sampling & scoring
// ---------------------------------------------------------------------------

/// Whether a question is offered to a participant of `school_name`. Questions
/// without a school are offered to everyone.
fn offered_to(question: &Question, school_name: Option<&str>) -> bool {
    match (&question.school_name, school_name) {
        (None, _) => true,
        (Some(only), Some(school)) => only.trim().eq_ignore_ascii_case(school.trim()),
        (Some(_), None) => false,
    }
}

/// Uniform draw of `count` distinct questions from the pool, in random order.
pub fn draw<R: Rng + ?Sized>(
    pool: Vec<Question>,
    count: usize,
    school_name: Option<&str>,
    rng: &mut R,
) -> Result<Vec<Question>, AssessmentError> {
    let mut pool: Vec<Question> = pool
        .into_iter()
        .filter(|q| offered_to(q, school_name))
        .collect();

    if pool.len() < count {
        return Err(AssessmentError::InsufficientQuestions {
            available: pool.len(),
            required: count,
        });
    }

    pool.shuffle(rng);
    pool.truncate(count);
    Ok(pool)
}

/// One mark per answer matching the presented question's key. Quiz answers
/// must be valid option indexes; case answers out of range simply score zero.
pub fn score(
    assessment: Assessment,
    presented: &[Question],
    answers: &[i64],
) -> Result<i64, AssessmentError> {
    let expected = assessment.question_count();
    if presented.len() != expected {
        return Err(AssessmentError::InsufficientQuestions {
            available: presented.len(),
            required: expected,
        });
    }
    if answers.len() != expected {
        return Err(AssessmentError::MalformedSubmission {
            expected,
            got: answers.len(),
        });
    }

    if assessment == Assessment::Quiz {
        let max = names::QUIZ_OPTION_COUNT as i64;
        if let Some(position) = answers.iter().position(|a| !(0..max).contains(a)) {
            return Err(AssessmentError::InvalidAnswerIndex {
                position,
                value: answers[position],
            });
        }
    }

    let marks = presented
        .iter()
        .zip(answers)
        .filter(|pair| {
            let (question, answer) = *pair;
            usize::try_from(*answer).is_ok_and(|i| i < question.options.len())
                && *answer == question.correct_answer
        })
        .count();

    Ok(marks as i64)
}

// ---------------------------------------------------------------------------
// AssessmentService
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct Submission {
    pub answers: Vec<i64>,
    pub time_taken: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptReceipt {
    pub attempt_id: i64,
    pub score: i64,
    pub total: usize,
}

#[derive(Clone)]
pub struct AssessmentService<R: AssessmentRepository = Db> {
    repo: R,
}

impl<R: AssessmentRepository> AssessmentService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn has_attempted(
        &self,
        user_id: i64,
        assessment: Assessment,
        language: Language,
    ) -> Result<bool, AssessmentError> {
        Ok(self
            .repo
            .attempt_exists(user_id, assessment, assessment.gate_language(language))
            .await?)
    }

    pub async fn guard_or_reject(
        &self,
        user_id: i64,
        assessment: Assessment,
        language: Language,
    ) -> Result<(), AssessmentError> {
        if self.has_attempted(user_id, assessment, language).await? {
            tracing::warn!("user {user_id} already attempted the {assessment} ({language})");
            return Err(AssessmentError::AlreadyAttempted);
        }
        Ok(())
    }

    /// Fresh random draw of the fixed question count for this assessment.
    pub async fn sample(
        &self,
        assessment: Assessment,
        language: Language,
        school_name: Option<&str>,
    ) -> Result<Vec<Question>, AssessmentError> {
        let pool = self.repo.question_pool(assessment, language).await?;
        let mut rng = StdRng::seed_from_u64(rand::random::<u64>());

        draw(pool, assessment.question_count(), school_name, &mut rng).inspect_err(|e| {
            if let AssessmentError::InsufficientQuestions { .. } = e {
                tracing::error!("cannot sample {assessment} questions in {language}: {e}");
            }
        })
    }

    /// The question set to show a participant. The first draw is kept as a
    /// draft so later requests and the submission see the same questions.
    pub async fn questions_for(
        &self,
        user: &AuthUser,
        assessment: Assessment,
        language: Language,
    ) -> Result<Vec<Question>, AssessmentError> {
        self.guard_or_reject(user.id, assessment, language).await?;

        if !self
            .repo
            .video_unlocked(user.id, assessment.unlocked_by())
            .await?
        {
            return Err(AssessmentError::VideoLocked);
        }

        if let Some(questions) = self.pending_questions(user, assessment, language).await? {
            return Ok(questions);
        }

        let drawn = self
            .sample(assessment, language, Some(&user.school_name))
            .await?;
        let drawn_ids: Vec<i64> = drawn.iter().map(|q| q.id).collect();
        let gate_language = assessment.gate_language(language);

        for _ in 0..2 {
            let stored_ids = self
                .repo
                .save_draft(user.id, assessment, gate_language, &drawn_ids)
                .await?;
            if stored_ids == drawn_ids {
                return Ok(drawn);
            }

            // A concurrent request stored its draw first. Serve it when it fits
            // this request; otherwise it has been cleared and ours goes in.
            if let Some(questions) = self.pending_questions(user, assessment, language).await? {
                return Ok(questions);
            }
        }

        Err(eyre!("{assessment} draft of user {} keeps changing", user.id).into())
    }

    /// Whether a drafted set can still be served for this request: complete,
    /// in the requested language and offered to the user's school.
    fn draft_fits(
        assessment: Assessment,
        ids: &[i64],
        questions: &[Question],
        language: Language,
        school_name: &str,
    ) -> bool {
        ids.len() == assessment.question_count()
            && questions.len() == ids.len()
            && questions
                .iter()
                .all(|q| q.language == language && offered_to(q, Some(school_name)))
    }

    /// Questions of the stored draft, or `None` when there is no usable draft.
    /// A draft that no longer fits is discarded.
    async fn pending_questions(
        &self,
        user: &AuthUser,
        assessment: Assessment,
        language: Language,
    ) -> Result<Option<Vec<Question>>, AssessmentError> {
        let gate_language = assessment.gate_language(language);
        let Some(ids) = self
            .repo
            .find_draft(user.id, assessment, gate_language)
            .await?
        else {
            return Ok(None);
        };

        let questions = self.repo.questions_by_ids(assessment, &ids).await?;
        if Self::draft_fits(assessment, &ids, &questions, language, &user.school_name) {
            return Ok(Some(questions));
        }

        tracing::warn!(
            "discarding {assessment} draft of user {} that no longer fits {language}",
            user.id
        );
        self.repo
            .clear_draft(user.id, assessment, gate_language)
            .await?;
        Ok(None)
    }

    /// Persists exactly one attempt. A storage-level duplicate is reported the
    /// same way as a failed gate check.
    pub async fn record(&self, attempt: &NewAttempt) -> Result<i64, AssessmentError> {
        match self.repo.insert_attempt(attempt).await? {
            InsertAttempt::Inserted(id) => Ok(id),
            InsertAttempt::Duplicate => {
                tracing::warn!(
                    "duplicate {} submission from user {} rejected by storage",
                    attempt.assessment,
                    attempt.user_id
                );
                Err(AssessmentError::AlreadyAttempted)
            }
        }
    }

    pub async fn submit(
        &self,
        user: &AuthUser,
        assessment: Assessment,
        language: Language,
        submission: Submission,
    ) -> Result<AttemptReceipt, AssessmentError> {
        self.guard_or_reject(user.id, assessment, language).await?;

        let expected = assessment.question_count();
        if submission.answers.len() != expected {
            return Err(AssessmentError::MalformedSubmission {
                expected,
                got: submission.answers.len(),
            });
        }

        let presented = match self.pending_questions(user, assessment, language).await? {
            Some(questions) => questions,
            None => {
                tracing::warn!(
                    "user {} submitted the {assessment} without a served question set; drawing a new one",
                    user.id
                );
                self.sample(assessment, language, Some(&user.school_name))
                    .await?
            }
        };

        let marks = score(assessment, &presented, &submission.answers)?;

        let attempt = NewAttempt {
            user_id: user.id,
            assessment,
            question_ids: presented.iter().map(|q| q.id).collect(),
            answers: submission.answers,
            score: marks,
            language,
            school_name: Some(user.school_name.clone()),
            time_taken: submission.time_taken,
        };
        let attempt_id = self.record(&attempt).await?;

        if let Err(e) = self
            .repo
            .clear_draft(user.id, assessment, assessment.gate_language(language))
            .await
        {
            tracing::warn!("could not clear {assessment} draft of user {}: {e}", user.id);
        }

        Ok(AttemptReceipt {
            attempt_id,
            score: marks,
            total: presented.len(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
