//! Product repository.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use giftshop_core::{Money, ProductId};

use super::RepositoryError;
use crate::models::Product;

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, image, category, stock, created_at, updated_at";

/// Filter for product listings. `None` fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Exact category label.
    pub category: Option<String>,
    /// Case-insensitive substring of name or description.
    pub search: Option<String>,
}

/// Validated fields for a new product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub image: Option<String>,
    pub category: String,
    pub stock: i64,
}

/// Validated fields to overwrite on an existing product. `None` keeps the
/// current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub stock: Option<i64>,
}

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    /// Stock was reduced.
    Applied,
    /// The product does not exist.
    Missing,
    /// The product has fewer units than requested.
    Insufficient {
        /// Units currently in stock.
        available: i64,
    },
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List products newest-first.
    ///
    /// Search is matched after the query so case folding covers all of
    /// Unicode; SQLite's `LIKE` only folds ASCII.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE (?1 IS NULL OR category = ?1)
            ORDER BY created_at DESC, id DESC
            "
        );

        let mut products = sqlx::query_as::<_, Product>(&sql)
            .bind(filter.category.as_deref())
            .fetch_all(self.pool)
            .await?;

        if let Some(search) = filter.search.as_deref() {
            let needle = search.to_lowercase();
            products.retain(|product| matches_search(product, &needle));
        }

        Ok(products)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(product)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let now = Utc::now();
        let sql = format!(
            r"
            INSERT INTO products (name, description, price, image, category, stock, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            RETURNING {PRODUCT_COLUMNS}
            "
        );

        let created = sqlx::query_as::<_, Product>(&sql)
            .bind(&product.name)
            .bind(product.description.as_deref())
            .bind(product.price)
            .bind(product.image.as_deref())
            .bind(&product.category)
            .bind(product.stock)
            .bind(now)
            .fetch_one(self.pool)
            .await?;

        Ok(created)
    }

    /// Overwrite the supplied fields of a product.
    ///
    /// Returns `None` if no product has this ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            r"
            UPDATE products SET
                name        = COALESCE(?2, name),
                description = COALESCE(?3, description),
                price       = COALESCE(?4, price),
                image       = COALESCE(?5, image),
                category    = COALESCE(?6, category),
                stock       = COALESCE(?7, stock),
                updated_at  = ?8
            WHERE id = ?1
            RETURNING {PRODUCT_COLUMNS}
            "
        );

        let updated = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(changes.name.as_deref())
            .bind(changes.description.as_deref())
            .bind(changes.price)
            .bind(changes.image.as_deref())
            .bind(changes.category.as_deref())
            .bind(changes.stock)
            .bind(Utc::now())
            .fetch_optional(self.pool)
            .await?;

        Ok(updated)
    }

    /// Delete a product. Cart lines for it are removed by cascade.
    ///
    /// Returns `false` if no product has this ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if order lines reference the product.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_constraint(e, "product has order history"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether any order line references the product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_order_history(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let lines: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_items WHERE product_id = ?1")
            .bind(id)
            .fetch_one(self.pool)
            .await?;
        Ok(lines > 0)
    }

    /// Number of products in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

/// Reduce a product's stock by `quantity` if enough units are available.
///
/// The check and the write are a single statement, so two concurrent
/// checkouts cannot both take the last unit.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn decrement_stock(
    conn: &mut SqliteConnection,
    id: ProductId,
    quantity: i64,
) -> Result<StockDecrement, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE products
        SET stock = stock - ?2, updated_at = ?3
        WHERE id = ?1 AND stock >= ?2
        ",
    )
    .bind(id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() > 0 {
        return Ok(StockDecrement::Applied);
    }

    let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(available.map_or(StockDecrement::Missing, |available| {
        StockDecrement::Insufficient { available }
    }))
}

/// Whether the lowercased `needle` occurs in the product's name or description.
fn matches_search(product: &Product, needle: &str) -> bool {
    product.name.to_lowercase().contains(needle)
        || product
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;

    fn new_product(name: &str, description: Option<&str>, category: &str, stock: i64) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            description: description.map(str::to_owned),
            price: Money::parse("149.99").unwrap(),
            image: None,
            category: category.to_owned(),
            stock,
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let pool = connect_in_memory().await.unwrap();
        let repo = ProductRepository::new(&pool);
        let first = repo.create(&new_product("Floral Keychain", None, "Keychains", 3)).await.unwrap();
        let second = repo.create(&new_product("Pearl Drops", None, "Earrings", 3)).await.unwrap();

        let listed = repo.list(&ProductFilter::default()).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_search_matches_description_case_insensitively() {
        let pool = connect_in_memory().await.unwrap();
        let repo = ProductRepository::new(&pool);
        repo.create(&new_product("Jhumka", Some("Traditional TEMPLE design"), "Earrings", 1))
            .await
            .unwrap();
        repo.create(&new_product("Starlight", None, "Keychains", 1)).await.unwrap();

        let filter = ProductFilter {
            category: None,
            search: Some("temple".to_owned()),
        };
        let found = repo.list(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Jhumka");
    }

    #[tokio::test]
    async fn test_search_folds_non_ascii_case() {
        let pool = connect_in_memory().await.unwrap();
        let repo = ProductRepository::new(&pool);
        repo.create(&new_product("Émeraude Drops", Some("Tiny STRAẞE charm"), "Earrings", 1))
            .await
            .unwrap();
        repo.create(&new_product("Starlight", None, "Keychains", 1)).await.unwrap();

        for search in ["émeraude", "ÉMERAUDE", "straße"] {
            let filter = ProductFilter {
                category: None,
                search: Some(search.to_owned()),
            };
            let found = repo.list(&filter).await.unwrap();
            assert_eq!(found.len(), 1, "search {search:?}");
            assert_eq!(found[0].name, "Émeraude Drops");
        }
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let pool = connect_in_memory().await.unwrap();
        let repo = ProductRepository::new(&pool);
        repo.create(&new_product("Butterfly", None, "Keychains", 1)).await.unwrap();

        let filter = ProductFilter {
            category: None,
            search: Some("%".to_owned()),
        };
        assert!(repo.list(&filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_keeps_unsupplied_fields() {
        let pool = connect_in_memory().await.unwrap();
        let repo = ProductRepository::new(&pool);
        let created = repo
            .create(&new_product("Heart Locket", Some("Holds a photo"), "Keychains", 20))
            .await
            .unwrap();

        let changes = ProductChanges {
            stock: Some(5),
            ..ProductChanges::default()
        };
        let updated = repo.update(created.id, &changes).await.unwrap().unwrap();
        assert_eq!(updated.stock, 5);
        assert_eq!(updated.name, "Heart Locket");
        assert_eq!(updated.description.as_deref(), Some("Holds a photo"));
        assert_eq!(updated.price, created.price);

        let missing = repo.update(ProductId::new(999), &changes).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_decrement_stock_outcomes() {
        let pool = connect_in_memory().await.unwrap();
        let repo = ProductRepository::new(&pool);
        let product = repo.create(&new_product("Temple Earrings", None, "Earrings", 6)).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        assert_eq!(
            decrement_stock(&mut conn, product.id, 4).await.unwrap(),
            StockDecrement::Applied
        );
        assert_eq!(
            decrement_stock(&mut conn, product.id, 3).await.unwrap(),
            StockDecrement::Insufficient { available: 2 }
        );
        assert_eq!(
            decrement_stock(&mut conn, ProductId::new(404), 1).await.unwrap(),
            StockDecrement::Missing
        );
    }
}
