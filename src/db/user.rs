use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use color_eyre::{eyre::eyre, Result};
use libsql::params;
use ulid::Ulid;

use super::helpers::{is_unique_violation, query_all, query_i64, query_optional};
use super::models::{AuthUser, MemberRecord, UserProfile, UserRecord};
use super::Db;
use crate::models::{Language, Person, Registration};

const AUTH_USER_COLUMNS: &str = "id, email, first_name, last_name, school_name, language";

const USER_COLUMNS: &str = "id, first_name, last_name, email, whatsapp_number, gender, age, grade, \
     school_name, language, last_login_at, created_at";

pub enum InsertUser {
    Created(i64),
    EmailTaken,
}

/// Full replacement of a user's editable fields. A `None` password keeps the old one.
pub struct UserUpdate {
    pub person: Person,
    pub language: Language,
    pub password: Option<String>,
}

pub enum UpdateUser {
    Updated,
    EmailTaken,
    NotFound,
}

impl Db {
    /// Creates the user and every member in one transaction. Expects the
    /// registration to be validated and normalized already.
    pub async fn create_user(
        &self,
        registration: &Registration,
        language: Language,
    ) -> Result<InsertUser> {
        let password_hash = hash_password(&registration.password).await?;
        let person = &registration.person;
        let conn = self.connect()?;
        let tx = conn.transaction().await?;

        let inserted = tx
            .query(
                r#"INSERT INTO users (first_name, last_name, email, whatsapp_number, gender, age, grade,
                                      school_name, password_hash, language)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                   RETURNING id"#,
                params![
                    person.first_name.as_str(),
                    person.last_name.as_str(),
                    person.email.as_str(),
                    person.whatsapp_number.as_str(),
                    person.gender.as_str(),
                    person.age,
                    person.grade.as_str(),
                    person.school_name.as_str(),
                    password_hash,
                    language.as_str()
                ],
            )
            .await;

        let user_id = match inserted {
            Ok(mut rows) => rows
                .next()
                .await?
                .ok_or_else(|| eyre!("could not get user id"))?
                .get::<i64>(0)?,
            Err(e) if is_unique_violation(&e) => {
                tracing::warn!("registration rejected, email {} is taken", person.email);
                return Ok(InsertUser::EmailTaken);
            }
            Err(e) => return Err(e.into()),
        };

        for (position, member) in registration.members.iter().enumerate() {
            tx.execute(
                r#"INSERT INTO members (user_id, position, first_name, last_name, email, whatsapp_number,
                                        gender, age, grade, school_name)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
                params![
                    user_id,
                    position as i64,
                    member.first_name.as_str(),
                    member.last_name.as_str(),
                    member.email.as_str(),
                    member.whatsapp_number.as_str(),
                    member.gender.as_str(),
                    member.age,
                    member.grade.as_str(),
                    member.school_name.as_str()
                ],
            )
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            "new user created: id={user_id}, email={}, members={}",
            person.email,
            registration.members.len()
        );
        Ok(InsertUser::Created(user_id))
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let conn = self.connect()?;
        let exists = query_i64(
            &conn,
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)",
            params![email],
        )
        .await?;
        Ok(exists == 1)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>> {
        let conn = self.connect()?;
        query_optional(
            &conn,
            &format!("SELECT {AUTH_USER_COLUMNS} FROM users WHERE email = ?"),
            params![email],
        )
        .await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<bool> {
        let conn = self.connect()?;
        let row = conn
            .query(
                "SELECT password_hash FROM users WHERE email = ?",
                params![email],
            )
            .await?
            .next()
            .await?;

        match row {
            Some(row) => {
                let stored_hash = row.get::<String>(0)?;
                Ok(verify_password(password, &stored_hash).await)
            }
            None => Ok(false),
        }
    }

    /// Issues a bearer token and stamps the login time.
    pub async fn create_user_session(&self, user_id: i64) -> Result<String> {
        let session = Ulid::new().to_string();
        let conn = self.connect()?;

        conn.execute(
            "INSERT INTO user_sessions (id, user_id) VALUES (?, ?)",
            params![session.clone(), user_id],
        )
        .await?;
        conn.execute(
            "UPDATE users SET last_login_at = CURRENT_TIMESTAMP WHERE id = ?",
            params![user_id],
        )
        .await?;

        tracing::info!("new user session created for user_id={user_id}");
        Ok(session)
    }

    pub async fn get_user_by_session(&self, session_id: &str) -> Result<Option<AuthUser>> {
        let conn = self.connect()?;
        query_optional(
            &conn,
            r#"
            SELECT u.id, u.email, u.first_name, u.last_name, u.school_name, u.language
            FROM user_sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = ?
            "#,
            params![session_id],
        )
        .await
    }

    pub async fn delete_user_session(&self, session_id: &str) -> Result<()> {
        let conn = self.connect()?;
        conn.execute(
            "DELETE FROM user_sessions WHERE id = ?",
            params![session_id],
        )
        .await?;
        Ok(())
    }

    pub async fn list_users(&self, school_name: Option<&str>) -> Result<Vec<UserRecord>> {
        let conn = self.connect()?;
        match school_name {
            Some(school) => {
                query_all(
                    &conn,
                    &format!(
                        "SELECT {USER_COLUMNS} FROM users WHERE school_name = ? ORDER BY id"
                    ),
                    params![school],
                )
                .await
            }
            None => {
                query_all(
                    &conn,
                    &format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"),
                    (),
                )
                .await
            }
        }
    }

    pub async fn get_user_profile(&self, user_id: i64) -> Result<Option<UserProfile>> {
        let conn = self.connect()?;
        let user: Option<UserRecord> = query_optional(
            &conn,
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
            params![user_id],
        )
        .await?;

        let Some(user) = user else {
            return Ok(None);
        };

        let members: Vec<MemberRecord> = query_all(
            &conn,
            r#"
            SELECT id, position, first_name, last_name, email, whatsapp_number, gender, age, grade, school_name
            FROM members
            WHERE user_id = ?
            ORDER BY position
            "#,
            params![user_id],
        )
        .await?;

        Ok(Some(UserProfile { user, members }))
    }

    pub async fn update_user(&self, user_id: i64, update: &UserUpdate) -> Result<UpdateUser> {
        let person = &update.person;
        let conn = self.connect()?;

        let result = conn
            .execute(
                r#"UPDATE users
                   SET first_name = ?, last_name = ?, email = ?, whatsapp_number = ?, gender = ?,
                       age = ?, grade = ?, school_name = ?, language = ?
                   WHERE id = ?"#,
                params![
                    person.first_name.as_str(),
                    person.last_name.as_str(),
                    person.email.as_str(),
                    person.whatsapp_number.as_str(),
                    person.gender.as_str(),
                    person.age,
                    person.grade.as_str(),
                    person.school_name.as_str(),
                    update.language.as_str(),
                    user_id
                ],
            )
            .await;

        match result {
            Ok(0) => return Ok(UpdateUser::NotFound),
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => return Ok(UpdateUser::EmailTaken),
            Err(e) => return Err(e.into()),
        }

        if let Some(password) = &update.password {
            let password_hash = hash_password(password).await?;
            conn.execute(
                "UPDATE users SET password_hash = ? WHERE id = ?",
                params![password_hash, user_id],
            )
            .await?;
        }

        tracing::info!("user {user_id} updated");
        Ok(UpdateUser::Updated)
    }

    /// Removes the user with their members, sessions and drafts. Attempts are
    /// kept and show up as belonging to a deleted user.
    pub async fn delete_user(&self, user_id: i64) -> Result<bool> {
        let conn = self.connect()?;
        let tx = conn.transaction().await?;

        for sql in [
            "DELETE FROM members WHERE user_id = ?",
            "DELETE FROM user_sessions WHERE user_id = ?",
            "DELETE FROM attempt_drafts WHERE user_id = ?",
            "DELETE FROM video_watches WHERE user_id = ?",
        ] {
            tx.execute(sql, params![user_id]).await?;
        }
        let deleted = tx
            .execute("DELETE FROM users WHERE id = ?", params![user_id])
            .await?;

        tx.commit().await?;

        tracing::info!("deleted user {user_id}: {deleted} row(s)");
        Ok(deleted > 0)
    }

    pub async fn delete_users_by_school(&self, school_name: &str) -> Result<u64> {
        let conn = self.connect()?;
        let tx = conn.transaction().await?;

        for table in ["members", "user_sessions", "attempt_drafts", "video_watches"] {
            tx.execute(
                &format!(
                    "DELETE FROM {table} WHERE user_id IN (SELECT id FROM users WHERE school_name = ?)"
                ),
                params![school_name],
            )
            .await?;
        }
        let deleted = tx
            .execute(
                "DELETE FROM users WHERE school_name = ?",
                params![school_name],
            )
            .await?;

        tx.commit().await?;

        tracing::info!("deleted {deleted} user(s) of school {school_name:?}");
        Ok(deleted)
    }

    /// Every school that appears on a registration or on a recorded attempt.
    pub async fn school_names(&self) -> Result<Vec<String>> {
        #[derive(serde::Deserialize)]
        struct School {
            school_name: String,
        }

        let conn = self.connect()?;
        let schools: Vec<School> = query_all(
            &conn,
            r#"
            SELECT TRIM(school_name) AS school_name FROM users WHERE TRIM(school_name) <> ''
            UNION
            SELECT TRIM(school_name) FROM quiz_attempts WHERE TRIM(school_name) <> ''
            UNION
            SELECT TRIM(school_name) FROM case_attempts WHERE TRIM(school_name) <> ''
            ORDER BY school_name
            "#,
            (),
        )
        .await?;

        Ok(schools.into_iter().map(|s| s.school_name).collect())
    }
}

/// Hashes on the blocking pool.
pub(super) async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| eyre!("failed to hash password: {e}"))
    })
    .await?
}

pub(super) async fn verify_password(password: &str, hash: &str) -> bool {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || {
        let Ok(parsed_hash) = PasswordHash::new(&hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    })
    .await
    .unwrap_or(false)
}
