use color_eyre::Result;

use crate::db::{AuthUser, Db, InsertUser};
use crate::models::{normalize_email, Language, Registration};
use crate::validate;

// ---------------------------------------------------------------------------
// AuthRepository trait (DIP: service defines the abstraction it needs)
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait AuthRepository: Send + Sync {
    fn email_exists(&self, email: &str) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn create_user(
        &self,
        registration: &Registration,
        language: Language,
    ) -> impl std::future::Future<Output = Result<InsertUser>> + Send;

    fn create_user_session(
        &self,
        user_id: i64,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    fn verify_user_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<AuthUser>>> + Send;

    fn delete_user_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn verify_admin_password(
        &self,
        password: &str,
    ) -> impl std::future::Future<Output = Result<bool>> + Send;

    fn create_admin_session(&self) -> impl std::future::Future<Output = Result<String>> + Send;

    fn delete_admin_session(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

impl AuthRepository for Db {
    async fn email_exists(&self, email: &str) -> Result<bool> {
        Db::email_exists(self, email).await
    }

    async fn create_user(&self, registration: &Registration, language: Language) -> Result<InsertUser> {
        Db::create_user(self, registration, language).await
    }

    async fn create_user_session(&self, user_id: i64) -> Result<String> {
        Db::create_user_session(self, user_id).await
    }

    async fn verify_user_password(&self, email: &str, password: &str) -> Result<bool> {
        Db::verify_user_password(self, email, password).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>> {
        Db::find_user_by_email(self, email).await
    }

    async fn delete_user_session(&self, session_id: &str) -> Result<()> {
        Db::delete_user_session(self, session_id).await
    }

    async fn verify_admin_password(&self, password: &str) -> Result<bool> {
        Db::verify_admin_password(self, password).await
    }

    async fn create_admin_session(&self) -> Result<String> {
        Db::create_admin_session(self).await
    }

    async fn delete_admin_session(&self, session_id: &str) -> Result<()> {
        Db::delete_admin_session(self, session_id).await
    }
}

// ---------------------------------------------------------------------------
// Outcome enums
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum RegisterOutcome {
    /// User and members created and a session started. Contains the session token.
    LoggedIn { token: String, user_id: i64 },
    /// The request failed validation.
    Invalid(Vec<String>),
    /// Email already in use.
    EmailTaken,
}

#[derive(Debug)]
pub enum LoginOutcome {
    /// Login succeeded. Contains the session token.
    Success(String),
    /// Password was incorrect (or email not found).
    InvalidCredentials,
}

#[derive(Debug)]
pub enum BulkAddOutcome {
    /// Ids of created users, and the emails skipped because they were already registered.
    Added {
        created: Vec<i64>,
        skipped: Vec<String>,
    },
    /// Nothing was written; the whole batch failed validation.
    Invalid(Vec<String>),
}

// ---------------------------------------------------------------------------
// AuthService
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AuthService<R: AuthRepository = Db> {
    repo: R,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Ok(LoginOutcome::InvalidCredentials);
        }

        let verified = self.repo.verify_user_password(&email, password).await?;

        if !verified {
            return Ok(LoginOutcome::InvalidCredentials);
        }

        let user =
            self.repo.find_user_by_email(&email).await?.ok_or_else(|| {
                color_eyre::eyre::eyre!("user not found after password verification")
            })?;

        let session_token = self.repo.create_user_session(user.id).await?;

        Ok(LoginOutcome::Success(session_token))
    }

    pub async fn register(&self, registration: Registration) -> Result<RegisterOutcome> {
        let (registration, language) = match validate::registration(registration) {
            Ok(valid) => valid,
            Err(errors) => return Ok(RegisterOutcome::Invalid(errors)),
        };

        if self.repo.email_exists(&registration.person.email).await? {
            return Ok(RegisterOutcome::EmailTaken);
        }

        // The pre-check can race with another registration; the unique index decides.
        let user_id = match self.repo.create_user(&registration, language).await? {
            InsertUser::Created(id) => id,
            InsertUser::EmailTaken => return Ok(RegisterOutcome::EmailTaken),
        };

        let token = self.repo.create_user_session(user_id).await?;
        Ok(RegisterOutcome::LoggedIn { token, user_id })
    }

    /// Admin bulk-add. The batch is validated as a whole before anything is written.
    pub async fn add_users(&self, registrations: Vec<Registration>) -> Result<BulkAddOutcome> {
        let mut errors = validate::batch_emails(&registrations);
        let mut valid = Vec::with_capacity(registrations.len());

        for (i, registration) in registrations.into_iter().enumerate() {
            match validate::registration(registration) {
                Ok(ok) => valid.push(ok),
                Err(problems) => errors.extend(
                    problems
                        .into_iter()
                        .map(|p| format!("user {}: {p}", i + 1)),
                ),
            }
        }
        if !errors.is_empty() {
            return Ok(BulkAddOutcome::Invalid(errors));
        }

        let mut created = Vec::new();
        let mut skipped = Vec::new();
        for (registration, language) in valid {
            match self.repo.create_user(&registration, language).await? {
                InsertUser::Created(id) => created.push(id),
                InsertUser::EmailTaken => skipped.push(registration.person.email),
            }
        }

        tracing::info!(
            "bulk add: {} user(s) created, {} skipped",
            created.len(),
            skipped.len()
        );
        Ok(BulkAddOutcome::Added { created, skipped })
    }

    pub async fn logout(&self, session_id: &str) -> Result<()> {
        self.repo.delete_user_session(session_id).await
    }

    pub async fn admin_login(&self, password: &str) -> Result<LoginOutcome> {
        if password.is_empty() || !self.repo.verify_admin_password(password).await? {
            tracing::warn!("failed admin login");
            return Ok(LoginOutcome::InvalidCredentials);
        }

        let token = self.repo.create_admin_session().await?;
        Ok(LoginOutcome::Success(token))
    }

    pub async fn admin_logout(&self, session_id: &str) -> Result<()> {
        self.repo.delete_admin_session(session_id).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::Person;

    fn service(mock_repo: MockAuthRepository) -> AuthService<MockAuthRepository> {
        AuthService::new(mock_repo)
    }

    fn registration(email: &str) -> Registration {
        Registration {
            person: Person {
                first_name: "Ann".to_string(),
                last_name: "Lee".to_string(),
                email: email.to_string(),
                whatsapp_number: "0771234567".to_string(),
                gender: "female".to_string(),
                age: 16,
                grade: "10".to_string(),
                school_name: "Lincoln High".to_string(),
            },
            password: "password123".to_string(),
            language: "English".to_string(),
            members: Vec::new(),
        }
    }

    fn auth_user() -> AuthUser {
        AuthUser {
            id: 1,
            email: "test@example.com".to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            school_name: "Lincoln High".to_string(),
            language: "English".to_string(),
        }
    }

    // ----- login tests -----

    #[tokio::test]
    async fn login_success_returns_session_token() {
        let mut mock = MockAuthRepository::new();
        mock.expect_verify_user_password()
            .withf(|email, _| email == "test@example.com")
            .returning(|_, _| Box::pin(async { Ok(true) }));
        mock.expect_find_user_by_email()
            .returning(|_| Box::pin(async { Ok(Some(auth_user())) }));
        mock.expect_create_user_session()
            .returning(|_| Box::pin(async { Ok("session-token-123".to_string()) }));

        let svc = service(mock);
        let outcome = svc.login(" Test@Example.com ", "password").await.unwrap();

        assert!(matches!(outcome, LoginOutcome::Success(ref t) if t == "session-token-123"));
    }

    #[tokio::test]
    async fn login_wrong_password_returns_invalid_credentials() {
        let mut mock = MockAuthRepository::new();
        mock.expect_verify_user_password()
            .returning(|_, _| Box::pin(async { Ok(false) }));

        let svc = service(mock);
        let outcome = svc.login("test@example.com", "wrong").await.unwrap();

        assert!(matches!(outcome, LoginOutcome::InvalidCredentials));
    }

    #[tokio::test]
    async fn login_empty_fields_skip_the_store() {
        let svc = service(MockAuthRepository::new());
        let outcome = svc.login("", "password").await.unwrap();
        assert!(matches!(outcome, LoginOutcome::InvalidCredentials));
    }

    // ----- register tests -----

    #[tokio::test]
    async fn register_invalid_returns_every_error() {
        let mut reg = registration("not-an-email");
        reg.password = "short".to_string();

        let svc = service(MockAuthRepository::new());
        let outcome = svc.register(reg).await.unwrap();

        assert!(matches!(outcome, RegisterOutcome::Invalid(ref e) if e.len() == 2));
    }

    #[tokio::test]
    async fn register_email_taken_returns_email_taken() {
        let mut mock = MockAuthRepository::new();
        mock.expect_email_exists()
            .returning(|_| Box::pin(async { Ok(true) }));

        let svc = service(mock);
        let outcome = svc.register(registration("taken@example.com")).await.unwrap();

        assert!(matches!(outcome, RegisterOutcome::EmailTaken));
    }

    #[tokio::test]
    async fn register_losing_the_insert_race_returns_email_taken() {
        let mut mock = MockAuthRepository::new();
        mock.expect_email_exists()
            .returning(|_| Box::pin(async { Ok(false) }));
        mock.expect_create_user()
            .returning(|_, _| Box::pin(async { Ok(InsertUser::EmailTaken) }));

        let svc = service(mock);
        let outcome = svc.register(registration("new@example.com")).await.unwrap();

        assert!(matches!(outcome, RegisterOutcome::EmailTaken));
    }

    #[tokio::test]
    async fn register_returns_logged_in() {
        let mut mock = MockAuthRepository::new();
        mock.expect_email_exists()
            .withf(|email| email == "new@example.com")
            .returning(|_| Box::pin(async { Ok(false) }));
        mock.expect_create_user()
            .withf(|reg, language| {
                reg.person.email == "new@example.com" && *language == Language::English
            })
            .returning(|_, _| Box::pin(async { Ok(InsertUser::Created(1)) }));
        mock.expect_create_user_session()
            .returning(|_| Box::pin(async { Ok("session-abc".to_string()) }));

        let svc = service(mock);
        let outcome = svc.register(registration("New@Example.com")).await.unwrap();

        assert!(
            matches!(outcome, RegisterOutcome::LoggedIn { ref token, user_id: 1 } if token == "session-abc")
        );
    }

    // ----- bulk add tests -----

    #[tokio::test]
    async fn bulk_add_writes_nothing_when_a_row_is_invalid() {
        let mut bad = registration("b@x.com");
        bad.person.age = 200;

        let svc = service(MockAuthRepository::new());
        let outcome = svc
            .add_users(vec![registration("a@x.com"), bad])
            .await
            .unwrap();

        assert!(
            matches!(outcome, BulkAddOutcome::Invalid(ref e) if e.len() == 1 && e[0].starts_with("user 2:"))
        );
    }

    #[tokio::test]
    async fn bulk_add_skips_registered_emails() {
        let mut mock = MockAuthRepository::new();
        mock.expect_create_user().returning(|reg, _| {
            let outcome = if reg.person.email == "taken@x.com" {
                InsertUser::EmailTaken
            } else {
                InsertUser::Created(5)
            };
            Box::pin(async move { Ok(outcome) })
        });

        let svc = service(mock);
        let outcome = svc
            .add_users(vec![registration("a@x.com"), registration("taken@x.com")])
            .await
            .unwrap();

        match outcome {
            BulkAddOutcome::Added { created, skipped } => {
                assert_eq!(created, vec![5]);
                assert_eq!(skipped, vec!["taken@x.com".to_string()]);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    // ----- logout / admin tests -----

    #[tokio::test]
    async fn logout_deletes_session() {
        let mut mock = MockAuthRepository::new();
        mock.expect_delete_user_session()
            .withf(|id| id == "session-123")
            .returning(|_| Box::pin(async { Ok(()) }));

        let svc = service(mock);
        svc.logout("session-123").await.unwrap();
    }

    #[tokio::test]
    async fn admin_login_checks_the_password() {
        let mut mock = MockAuthRepository::new();
        mock.expect_verify_admin_password()
            .returning(|password| {
                let ok = password == "letmein!";
                Box::pin(async move { Ok(ok) })
            });
        mock.expect_create_admin_session()
            .times(1)
            .returning(|| Box::pin(async { Ok("admin-token".to_string()) }));

        let svc = service(mock);
        assert!(matches!(
            svc.admin_login("nope").await.unwrap(),
            LoginOutcome::InvalidCredentials
        ));
        assert!(matches!(
            svc.admin_login("letmein!").await.unwrap(),
            LoginOutcome::Success(ref t) if t == "admin-token"
        ));
    }
}
