use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{Result as HashResult, SaltString, rand_core::OsRng},
};

use bingelog_types::general::ValidEmail;
use garde::Validate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, error::Result};

fn hash_password(password: &str) -> HashResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(password_hash)
}

fn verify_password(password: &str, password_hash: &str) -> HashResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)?;
    let res = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);
    if let Err(e) = res {
        debug!("Invalid password, error {e}");
    }
    Ok(res.is_ok())
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateUser {
    #[garde(dive)]
    pub email: ValidEmail,
    #[garde(length(min = 5, max = 255))]
    pub password: String,
    #[garde(inner(length(max = 255)))]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, Validate)]
pub struct UpdateUser {
    #[garde(inner(length(max = 255)))]
    pub name: Option<String>,
    #[garde(inner(length(min = 5, max = 255)))]
    pub password: Option<String>,
}

/// Credential hash is never selected into this struct, so it cannot leak
/// through serialization.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

const SELECT_USER: &str =
    "SELECT id, email, name, is_active, is_staff, is_superuser FROM users";

pub type UserRepository = UserRepositoryImpl<crate::Pool>;

pub struct UserRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> UserRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateUser) -> Result<User> {
        self.create_internal(payload, false).await
    }

    /// Account with staff and superuser flags set. Not reachable from the
    /// HTTP surface.
    pub async fn create_admin(&self, payload: CreateUser) -> Result<User> {
        self.create_internal(payload, true).await
    }

    async fn create_internal(&self, payload: CreateUser, admin: bool) -> Result<User> {
        let password = hash_password(&payload.password)?;
        let email = payload.email.normalized();
        let result = sqlx::query(
            "INSERT INTO users (email, password, name, is_staff, is_superuser) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&email)
        .bind(&password)
        .bind(&payload.name)
        .bind(admin)
        .bind(admin)
        .execute(&self.executor)
        .await?;

        let id = result.last_insert_rowid();
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<User> {
        let sql = format!("{SELECT_USER} WHERE id = ?");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.executor)
            .await?
            .ok_or_else(|| Error::RecordNotFound("User".to_string()))
    }

    pub async fn find_by_email(&self, email: &str) -> Result<User> {
        let sql = format!("{SELECT_USER} WHERE email = ?");
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.executor)
            .await?
            .ok_or_else(|| Error::RecordNotFound("User".to_string()))
    }

    /// Partial profile update - name and/or password.
    pub async fn update(&self, id: i64, payload: UpdateUser) -> Result<User> {
        if let Some(ref name) = payload.name {
            sqlx::query("UPDATE users SET name = ? WHERE id = ?")
                .bind(name)
                .bind(id)
                .execute(&self.executor)
                .await?;
        }
        if let Some(ref password) = payload.password {
            let hashed = hash_password(password)?;
            sqlx::query("UPDATE users SET password = ? WHERE id = ?")
                .bind(&hashed)
                .bind(id)
                .execute(&self.executor)
                .await?;
        }
        self.get(id).await
    }

    /// Deletes the account; owned tags, characters and series go with it
    /// (FK cascade).
    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::RecordNotFound("User".to_string()));
        }
        Ok(())
    }

    /// Resolves credentials to an account. Unknown email, wrong password and
    /// deactivated account are indistinguishable to the caller.
    pub async fn check_password(&self, email: &str, password: &str) -> Result<User> {
        let row: Option<(i64, Option<String>, bool)> =
            sqlx::query_as("SELECT id, password, is_active FROM users WHERE email = ?")
                .bind(email)
                .fetch_optional(&self.executor)
                .await
                .map_err(|e| {
                    debug!("User check error: {e}");
                    Error::InvalidCredentials
                })?;
        if let Some((id, Some(hashed_password), true)) = row {
            if verify_password(password, &hashed_password).unwrap_or(false) {
                return self.get(id).await;
            }
        }
        Err(Error::InvalidCredentials)
    }
}
