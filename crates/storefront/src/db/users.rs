//! User repository for database operations.
//!
//! Shoppers start as anonymous guests and pick up an email and name from
//! their first checkout.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use giftshop_core::{Email, UserId};

use super::RepositoryError;
use crate::models::User;

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a guest user with no contact details.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create_guest(&self) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r"
            INSERT INTO users (email, name, created_at)
            VALUES (NULL, NULL, ?1)
            RETURNING id, email, name, created_at
            ",
        )
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, created_at FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }
}

/// Fill in a user's email and name if they are not set yet.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the user does not exist.
pub async fn record_contact(
    conn: &mut SqliteConnection,
    id: UserId,
    email: &Email,
    name: &str,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE users
        SET email = COALESCE(email, ?2),
            name  = COALESCE(name, ?3)
        WHERE id = ?1
        ",
    )
    .bind(id)
    .bind(email.as_str())
    .bind(name)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}
