//! Category list repository.
//!
//! The list only feeds the admin product form. Products keep their own
//! free-text category label and are never touched from here.

use sqlx::SqlitePool;

use super::RepositoryError;

/// Repository for the admin-curated category list.
pub struct CategoryRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All category names in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<String>, RepositoryError> {
        let names = sqlx::query_scalar("SELECT name FROM categories ORDER BY position, name")
            .fetch_all(self.pool)
            .await?;
        Ok(names)
    }

    /// Append a category to the end of the list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name already exists.
    pub async fn add(&self, name: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO categories (name, position)
            VALUES (?1, (SELECT COALESCE(MAX(position), 0) + 1 FROM categories))
            ",
        )
        .bind(name)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "category already exists"))?;
        Ok(())
    }

    /// Remove a category by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such category exists.
    pub async fn delete(&self, name: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE name = ?1")
            .bind(name)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
