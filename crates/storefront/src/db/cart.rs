//! Cart repository.
//!
//! Each row is one (user, product) pair; adding an existing pair increments
//! its quantity.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use giftshop_core::{CartItemId, ProductId, UserId};

use super::RepositoryError;
use crate::models::CartLine;

const LINE_SELECT: &str = r"
    SELECT ci.id AS item_id, ci.user_id, ci.product_id AS item_product_id, ci.quantity,
           p.id, p.name, p.description, p.price, p.image, p.category, p.stock,
           p.created_at, p.updated_at
    FROM cart_items ci
    JOIN products p ON p.id = ci.product_id
";

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// All lines in a user's cart, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines_for_user(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let sql = format!("{LINE_SELECT} WHERE ci.user_id = ?1 ORDER BY ci.created_at, ci.id");
        let lines = sqlx::query_as::<_, CartLine>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;
        Ok(lines)
    }

    /// A single cart line by ID, regardless of owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_line(&self, id: CartItemId) -> Result<Option<CartLine>, RepositoryError> {
        let sql = format!("{LINE_SELECT} WHERE ci.id = ?1");
        let line = sqlx::query_as::<_, CartLine>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(line)
    }

    /// Quantity of a product already in the user's cart (0 if none).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn quantity_in_cart(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<i64, RepositoryError> {
        let quantity: Option<i64> = sqlx::query_scalar(
            "SELECT quantity FROM cart_items WHERE user_id = ?1 AND product_id = ?2",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(quantity.unwrap_or(0))
    }

    /// Insert a line or add to the quantity of the existing one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user or product no longer
    /// exists.
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartItemId, RepositoryError> {
        let id = sqlx::query_scalar(
            r"
            INSERT INTO cart_items (user_id, product_id, quantity, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET quantity = cart_items.quantity + excluded.quantity
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "cart references a missing row"))?;
        Ok(id)
    }

    /// Set the quantity of a line. `quantity` must be positive.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line does not exist.
    pub async fn set_quantity(&self, id: CartItemId, quantity: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE cart_items SET quantity = ?2 WHERE id = ?1")
            .bind(id)
            .bind(quantity)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line does not exist.
    pub async fn remove(&self, id: CartItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete every line in a user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        clear_for_user(&mut conn, user_id).await
    }
}

/// Delete every line in a user's cart on the given connection.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the delete fails.
pub async fn clear_for_user(
    conn: &mut SqliteConnection,
    user_id: UserId,
) -> Result<u64, RepositoryError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = ?1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;
    use crate::db::products::{NewProduct, ProductRepository};
    use crate::db::users::UserRepository;
    use giftshop_core::Money;

    async fn fixture(pool: &SqlitePool) -> (UserId, ProductId) {
        let user = UserRepository::new(pool).create_guest().await.unwrap();
        let product = ProductRepository::new(pool)
            .create(&NewProduct {
                name: "Starlight Keychain".to_owned(),
                description: None,
                price: Money::parse("129.99").unwrap(),
                image: None,
                category: "Keychains".to_owned(),
                stock: 25,
            })
            .await
            .unwrap();
        (user.id, product.id)
    }

    #[tokio::test]
    async fn test_add_twice_merges_into_one_line() {
        let pool = connect_in_memory().await.unwrap();
        let (user, product) = fixture(&pool).await;
        let repo = CartRepository::new(&pool);

        let first = repo.add(user, product, 2).await.unwrap();
        let second = repo.add(user, product, 3).await.unwrap();
        assert_eq!(first, second);

        let lines = repo.lines_for_user(user).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
        assert_eq!(lines[0].product.name, "Starlight Keychain");
        assert_eq!(repo.quantity_in_cart(user, product).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_add_unknown_product_is_conflict() {
        let pool = connect_in_memory().await.unwrap();
        let (user, _) = fixture(&pool).await;
        let err = CartRepository::new(&pool)
            .add(user, ProductId::new(999), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let pool = connect_in_memory().await.unwrap();
        let (user, product) = fixture(&pool).await;
        let repo = CartRepository::new(&pool);

        let id = repo.add(user, product, 1).await.unwrap();
        repo.remove(id).await.unwrap();
        assert!(matches!(repo.remove(id).await, Err(RepositoryError::NotFound)));

        repo.add(user, product, 1).await.unwrap();
        assert_eq!(repo.clear(user).await.unwrap(), 1);
        assert!(repo.lines_for_user(user).await.unwrap().is_empty());
    }
}
