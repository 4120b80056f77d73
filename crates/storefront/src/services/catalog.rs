//! Catalog service: product listing, admin product edits, and the category
//! list.
//!
//! Admin product forms send price and stock either as JSON numbers or as the
//! raw text of an input field, so both are accepted here.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use sqlx::SqlitePool;
use tracing::{info, instrument};

use giftshop_core::{Money, ProductId};

use crate::db::products::{NewProduct, ProductChanges, ProductFilter};
use crate::db::{CategoryRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::Product;

/// Category value meaning "no category filter".
const ALL_CATEGORIES: &str = "all";

/// Highest accepted unit price. Keeps cart and order totals computable.
const MAX_PRICE: Decimal = Decimal::from_parts(10_000_000, 0, 0, false, 0);

/// Highest accepted stock level.
const MAX_STOCK: i64 = 1_000_000;

/// Product fields as sent by the admin form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Value>,
    pub image: Option<String>,
    pub category: Option<String>,
    pub stock: Option<Value>,
}

/// Query parameters for product listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl From<ProductQuery> for ProductFilter {
    fn from(query: ProductQuery) -> Self {
        Self {
            category: non_blank(query.category).filter(|c| !c.eq_ignore_ascii_case(ALL_CATEGORIES)),
            search: non_blank(query.search),
        }
    }
}

/// Catalog operations over the product and category tables.
pub struct CatalogService<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List products newest-first, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: ProductQuery) -> Result<Vec<Product>> {
        let filter = ProductFilter::from(query);
        Ok(ProductRepository::new(self.pool).list(&filter).await?)
    }

    /// Get one product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product> {
        ProductRepository::new(self.pool)
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if name, price, or category is missing
    /// or a value is malformed.
    #[instrument(skip(self, input))]
    pub async fn create_product(&self, input: ProductInput) -> Result<Product> {
        let name = non_blank(input.name);
        let category = non_blank(input.category);
        let price = input.price.filter(|v| !v.is_null());

        let (Some(name), Some(price), Some(category)) = (name, price, category) else {
            return Err(AppError::Validation(
                "Name, price, and category are required".to_owned(),
            ));
        };

        let product = NewProduct {
            name,
            description: non_blank(input.description),
            price: parse_price(&price)?,
            image: non_blank(input.image),
            category,
            stock: input.stock.as_ref().map_or(Ok(0), parse_stock)?,
        };

        let created = ProductRepository::new(self.pool).create(&product).await?;
        info!(product_id = %created.id, name = %created.name, "Product created");
        Ok(created)
    }

    /// Overwrite the supplied fields of a product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product does not exist and
    /// `AppError::Validation` if a supplied value is malformed.
    #[instrument(skip(self, input), fields(product_id = %id))]
    pub async fn update_product(&self, id: ProductId, input: ProductInput) -> Result<Product> {
        let name = match input.name {
            Some(name) => Some(
                non_blank(Some(name))
                    .ok_or_else(|| AppError::Validation("Name cannot be blank".to_owned()))?,
            ),
            None => None,
        };
        let category = match input.category {
            Some(category) => Some(
                non_blank(Some(category))
                    .ok_or_else(|| AppError::Validation("Category cannot be blank".to_owned()))?,
            ),
            None => None,
        };

        let changes = ProductChanges {
            name,
            description: input.description,
            price: input
                .price
                .filter(|v| !v.is_null())
                .as_ref()
                .map(parse_price)
                .transpose()?,
            image: input.image,
            category,
            stock: input
                .stock
                .filter(|v| !v.is_null())
                .as_ref()
                .map(parse_stock)
                .transpose()?,
        };

        let updated = ProductRepository::new(self.pool)
            .update(id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

        info!(product_id = %id, "Product updated");
        Ok(updated)
    }

    /// Delete a product. Products that appear on orders are kept.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product does not exist and
    /// `AppError::Validation` if order lines reference it.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId) -> Result<()> {
        let products = ProductRepository::new(self.pool);

        if products.get(id).await?.is_none() {
            return Err(AppError::NotFound("Product not found".to_owned()));
        }
        if products.has_order_history(id).await? {
            return Err(AppError::Validation(
                "Product appears on existing orders and cannot be deleted".to_owned(),
            ));
        }

        if !products.delete(id).await? {
            return Err(AppError::NotFound("Product not found".to_owned()));
        }
        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    /// The admin category list.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<String>> {
        Ok(CategoryRepository::new(self.pool).list().await?)
    }

    /// Add a category and return the updated list.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the name is blank or already listed.
    #[instrument(skip(self))]
    pub async fn add_category(&self, name: &str) -> Result<Vec<String>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Category name is required".to_owned()));
        }

        let categories = CategoryRepository::new(self.pool);
        categories.add(name).await.map_err(|e| match e {
            crate::db::RepositoryError::Conflict(_) => {
                AppError::Validation(format!("Category '{name}' already exists"))
            }
            other => other.into(),
        })?;
        Ok(categories.list().await?)
    }

    /// Remove a category and return the updated list. Products keep their
    /// category label.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the category is not listed.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, name: &str) -> Result<Vec<String>> {
        let categories = CategoryRepository::new(self.pool);
        categories.delete(name).await.map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound(format!("Category '{name}' not found"))
            }
            other => other.into(),
        })?;
        Ok(categories.list().await?)
    }

    /// Insert the sample catalog if there are no products yet.
    ///
    /// Returns the number of products inserted.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn seed_sample_products(&self) -> Result<usize> {
        let products = ProductRepository::new(self.pool);
        if products.count().await? > 0 {
            info!("Catalog already has products, skipping seed");
            return Ok(0);
        }

        let samples = sample_products()?;
        for product in &samples {
            products.create(product).await?;
        }
        info!(count = samples.len(), "Seeded sample products");
        Ok(samples.len())
    }
}

/// Parse a price from a JSON number or numeric string.
fn parse_price(value: &Value) -> Result<Money> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_owned(),
        _ => return Err(AppError::Validation("Price must be a number".to_owned())),
    };

    let amount = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| AppError::Validation(format!("Invalid price: {text}")))?;

    if amount > MAX_PRICE {
        return Err(AppError::Validation(format!(
            "Price cannot exceed {MAX_PRICE}"
        )));
    }
    Money::new(amount).map_err(|e| AppError::Validation(format!("Invalid price: {e}")))
}

/// Parse stock leniently: unparseable values become 0, negatives are rejected.
#[allow(clippy::cast_possible_truncation)]
fn parse_stock(value: &Value) -> Result<i64> {
    let stock = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => leading_integer(s.trim()).unwrap_or(0),
        _ => 0,
    };

    if stock < 0 {
        return Err(AppError::Validation("Stock cannot be negative".to_owned()));
    }
    if stock > MAX_STOCK {
        return Err(AppError::Validation(format!(
            "Stock cannot exceed {MAX_STOCK}"
        )));
    }
    Ok(stock)
}

/// Integer prefix of a string, so `"12 units"` and `"12.5"` read as 12.
fn leading_integer(s: &str) -> Option<i64> {
    let sign_len = usize::from(s.starts_with(['-', '+']));
    let digits = s
        .bytes()
        .skip(sign_len)
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    s.get(..sign_len + digits)?.parse().ok()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

const KEYCHAIN_IMAGE: &str =
    "https://images.unsplash.com/photo-1596944924616-7b38e7cfac36?w=400&h=400&fit=crop";
const EARRING_IMAGE: &str =
    "https://images.unsplash.com/photo-1511556532299-8f78cead2630?w=400&h=400&fit=crop";

/// The sample catalog inserted by `seed_sample_products`.
fn sample_products() -> Result<Vec<NewProduct>> {
    let rows: [(&str, &str, &str, &str, i64); 8] = [
        (
            "Floral Charm Keychain",
            "Beautiful floral design keychain with intricate details, perfect for adding elegance to your keys or bag.",
            "149.99",
            "Keychains",
            15,
        ),
        (
            "Peacock Feather Earrings",
            "Stunning peacock feather inspired earrings with vibrant colors and graceful design.",
            "299.99",
            "Earrings",
            12,
        ),
        (
            "Heart Locket Keychain",
            "Romantic heart-shaped locket keychain that can hold tiny photos or messages.",
            "199.99",
            "Keychains",
            20,
        ),
        (
            "Traditional Jhumka Earrings",
            "Classic Indian jhumka earrings with traditional design and modern appeal.",
            "399.99",
            "Earrings",
            8,
        ),
        (
            "Starlight Keychain",
            "Sparkling star-shaped keychain that catches the light beautifully, perfect for night outings.",
            "129.99",
            "Keychains",
            25,
        ),
        (
            "Pearl Drop Earrings",
            "Elegant pearl drop earrings that add sophistication to any outfit.",
            "349.99",
            "Earrings",
            10,
        ),
        (
            "Butterfly Keychain",
            "Delicate butterfly design keychain symbolizing transformation and beauty.",
            "169.99",
            "Keychains",
            18,
        ),
        (
            "Temple Jewelry Earrings",
            "Traditional temple design earrings inspired by South Indian jewelry heritage.",
            "449.99",
            "Earrings",
            6,
        ),
    ];

    rows.into_iter()
        .map(|(name, description, price, category, stock)| {
            let image = if category == "Keychains" {
                KEYCHAIN_IMAGE
            } else {
                EARRING_IMAGE
            };
            Ok(NewProduct {
                name: name.to_owned(),
                description: Some(description.to_owned()),
                price: Money::parse(price).map_err(|e| AppError::Internal(e.to_string()))?,
                image: Some(image.to_owned()),
                category: category.to_owned(),
                stock,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;
    use serde_json::json;

    fn input(value: serde_json::Value) -> ProductInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_price_accepts_numbers_and_strings() {
        assert_eq!(parse_price(&json!(149.99)).unwrap(), Money::parse("149.99").unwrap());
        assert_eq!(parse_price(&json!("299.99")).unwrap(), Money::parse("299.99").unwrap());
        assert_eq!(parse_price(&json!(150)).unwrap(), Money::parse("150").unwrap());
        assert!(parse_price(&json!("-1")).is_err());
        assert!(parse_price(&json!("abc")).is_err());
        assert!(parse_price(&json!(true)).is_err());
    }

    #[test]
    fn test_price_and_stock_are_bounded() {
        assert!(parse_price(&json!(10_000_000)).is_ok());
        assert!(matches!(
            parse_price(&json!("10000000.01")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            parse_price(&json!("1e28")),
            Err(AppError::Validation(_))
        ));
        assert_eq!(parse_stock(&json!(1_000_000)).unwrap(), 1_000_000);
        assert!(matches!(
            parse_stock(&json!(1_000_001)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_stock_is_lenient() {
        assert_eq!(parse_stock(&json!(12)).unwrap(), 12);
        assert_eq!(parse_stock(&json!("12")).unwrap(), 12);
        assert_eq!(parse_stock(&json!("12.7")).unwrap(), 12);
        assert_eq!(parse_stock(&json!("lots")).unwrap(), 0);
        assert_eq!(parse_stock(&json!(null)).unwrap(), 0);
        assert!(parse_stock(&json!(-3)).is_err());
    }

    #[test]
    fn test_filter_from_query() {
        let filter = ProductFilter::from(ProductQuery {
            category: Some("all".to_owned()),
            search: Some("   ".to_owned()),
        });
        assert_eq!(filter, ProductFilter::default());

        let filter = ProductFilter::from(ProductQuery {
            category: Some("Earrings".to_owned()),
            search: Some("pearl".to_owned()),
        });
        assert_eq!(filter.category.as_deref(), Some("Earrings"));
        assert_eq!(filter.search.as_deref(), Some("pearl"));
    }

    #[tokio::test]
    async fn test_create_requires_name_price_category() {
        let pool = connect_in_memory().await.unwrap();
        let catalog = CatalogService::new(&pool);

        let err = catalog
            .create_product(input(json!({ "name": "Charm", "category": "Keychains" })))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let created = catalog
            .create_product(input(json!({
                "name": "Charm",
                "price": "99.50",
                "category": "Keychains",
                "stock": "not a number"
            })))
            .await
            .unwrap();
        assert_eq!(created.stock, 0);
        assert_eq!(created.price, Money::parse("99.5").unwrap());
    }

    #[tokio::test]
    async fn test_update_unknown_is_not_found() {
        let pool = connect_in_memory().await.unwrap();
        let err = CatalogService::new(&pool)
            .update_product(ProductId::new(42), input(json!({ "stock": 3 })))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_includes_product_by_category_and_name_substring() {
        let pool = connect_in_memory().await.unwrap();
        let catalog = CatalogService::new(&pool);
        catalog.seed_sample_products().await.unwrap();
        let product = catalog
            .create_product(input(json!({ "name": "Moonstone Ring", "price": 500, "category": "Rings" })))
            .await
            .unwrap();

        let by_category = catalog
            .list_products(ProductQuery {
                category: Some("Rings".to_owned()),
                search: None,
            })
            .await
            .unwrap();
        assert_eq!(by_category.iter().map(|p| p.id).collect::<Vec<_>>(), vec![product.id]);

        let by_name = catalog
            .list_products(ProductQuery {
                category: None,
                search: Some("STONE r".to_owned()),
            })
            .await
            .unwrap();
        assert!(by_name.iter().any(|p| p.id == product.id));
    }

    #[tokio::test]
    async fn test_categories_add_and_delete() {
        let pool = connect_in_memory().await.unwrap();
        let catalog = CatalogService::new(&pool);

        let list = catalog.add_category("  Bracelets ").await.unwrap();
        assert!(list.contains(&"Bracelets".to_owned()));
        assert!(matches!(
            catalog.add_category("Bracelets").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(catalog.add_category(" ").await, Err(AppError::Validation(_))));

        let list = catalog.delete_category("Bracelets").await.unwrap();
        assert!(!list.contains(&"Bracelets".to_owned()));
        assert!(matches!(
            catalog.delete_category("Bracelets").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_seed_only_fills_empty_catalog() {
        let pool = connect_in_memory().await.unwrap();
        let catalog = CatalogService::new(&pool);
        assert_eq!(catalog.seed_sample_products().await.unwrap(), 8);
        assert_eq!(catalog.seed_sample_products().await.unwrap(), 0);

        let earrings = catalog
            .list_products(ProductQuery {
                category: Some("Earrings".to_owned()),
                search: None,
            })
            .await
            .unwrap();
        assert_eq!(earrings.len(), 4);
    }
}
