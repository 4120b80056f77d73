//! Order repository.
//!
//! Orders and their lines are written once, inside the checkout transaction,
//! through [`insert_order`] and [`insert_line`]. Afterwards only `status`
//! changes.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use giftshop_core::{Money, OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Order, OrderDetail, OrderLine, User};

/// Message for a payment id that already settled an order.
pub const PAYMENT_ALREADY_USED: &str = "Payment already used";

const ORDER_COLUMNS: &str = r"
    id, user_id, status, total, customer_name, customer_email, customer_phone,
    shipping_address, shipping_city, shipping_state, shipping_zip, shipping_country,
    payment_method, payment_status, payment_id, created_at, updated_at
";

const LINE_SELECT: &str = r"
    SELECT oi.id AS item_id, oi.order_id, oi.product_id AS item_product_id, oi.quantity,
           oi.price AS unit_price,
           p.id, p.name, p.description, p.price, p.image, p.category, p.stock,
           p.created_at, p.updated_at
    FROM order_items oi
    JOIN products p ON p.id = oi.product_id
";

/// Snapshot of everything stored on a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub total: Money,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: String,
    pub shipping_city: Option<String>,
    pub shipping_state: Option<String>,
    pub shipping_zip: Option<String>,
    pub shipping_country: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
}

/// Repository for order reads and status updates.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get an order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let Some(order) = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
        else {
            return Ok(None);
        };

        let sql = format!("{LINE_SELECT} WHERE oi.order_id = ?1 ORDER BY oi.id");
        let items = sqlx::query_as::<_, OrderLine>(&sql)
            .bind(id)
            .fetch_all(self.pool)
            .await?;

        Ok(Some(OrderDetail {
            order,
            items,
            user: None,
        }))
    }

    /// Every order, newest first, with lines and the owning user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all(&self) -> Result<Vec<OrderDetail>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC");
        let orders = sqlx::query_as::<_, Order>(&sql).fetch_all(self.pool).await?;

        let sql = format!("{LINE_SELECT} ORDER BY oi.order_id, oi.id");
        let lines = sqlx::query_as::<_, OrderLine>(&sql)
            .fetch_all(self.pool)
            .await?;

        let users: HashMap<UserId, User> = sqlx::query_as::<_, User>(
            r"
            SELECT id, email, name, created_at
            FROM users
            WHERE id IN (SELECT user_id FROM orders)
            ",
        )
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();

        let mut details = assemble(orders, lines);
        for detail in &mut details {
            detail.user = users.get(&detail.order.user_id).cloned();
        }
        Ok(details)
    }

    /// A user's orders, newest first, with lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<OrderDetail>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 ORDER BY created_at DESC, id DESC"
        );
        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        let sql = format!(
            "{LINE_SELECT} WHERE oi.order_id IN (SELECT id FROM orders WHERE user_id = ?1) \
             ORDER BY oi.order_id, oi.id"
        );
        let lines = sqlx::query_as::<_, OrderLine>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        Ok(assemble(orders, lines))
    }

    /// Overwrite an order's status.
    ///
    /// Returns `None` if no order has this ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            "UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1 RETURNING {ORDER_COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(status)
            .bind(Utc::now())
            .fetch_optional(self.pool)
            .await?;
        Ok(order)
    }
}

/// Attach lines to their orders, keeping the order sequence.
fn assemble(orders: Vec<Order>, lines: Vec<OrderLine>) -> Vec<OrderDetail> {
    let mut by_order: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
    for line in lines {
        by_order.entry(line.order_id).or_default().push(line);
    }

    orders
        .into_iter()
        .map(|order| OrderDetail {
            items: by_order.remove(&order.id).unwrap_or_default(),
            order,
            user: None,
        })
        .collect()
}

/// Insert an order with status `pending`.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the user does not exist or the
/// payment id already settled another order.
pub async fn insert_order(
    conn: &mut SqliteConnection,
    order: &NewOrder,
) -> Result<OrderId, RepositoryError> {
    let now = Utc::now();
    let id = sqlx::query_scalar(
        r"
        INSERT INTO orders (
            user_id, status, total, customer_name, customer_email, customer_phone,
            shipping_address, shipping_city, shipping_state, shipping_zip, shipping_country,
            payment_method, payment_status, payment_id, created_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?15)
        RETURNING id
        ",
    )
    .bind(order.user_id)
    .bind(OrderStatus::Pending)
    .bind(order.total)
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(order.customer_phone.as_deref())
    .bind(&order.shipping_address)
    .bind(order.shipping_city.as_deref())
    .bind(order.shipping_state.as_deref())
    .bind(order.shipping_zip.as_deref())
    .bind(&order.shipping_country)
    .bind(order.payment_method)
    .bind(order.payment_status)
    .bind(order.payment_id.as_deref())
    .bind(now)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            RepositoryError::Conflict(PAYMENT_ALREADY_USED.to_owned())
        }
        e => RepositoryError::from_constraint(e, "order user does not exist"),
    })?;

    Ok(id)
}

/// Insert one order line with the unit price charged.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the order or product does not exist.
pub async fn insert_line(
    conn: &mut SqliteConnection,
    order_id: OrderId,
    product_id: ProductId,
    quantity: i64,
    unit_price: Money,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO order_items (order_id, product_id, quantity, price)
        VALUES (?1, ?2, ?3, ?4)
        ",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(quantity)
    .bind(unit_price)
    .execute(&mut *conn)
    .await
    .map_err(|e| RepositoryError::from_constraint(e, "order line references a missing row"))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::connect_in_memory;
    use crate::db::products::{NewProduct, ProductRepository};
    use crate::db::users::UserRepository;

    fn new_order(user_id: UserId, total: &str) -> NewOrder {
        NewOrder {
            user_id,
            total: Money::parse(total).unwrap(),
            customer_name: "Asha Rao".to_owned(),
            customer_email: "asha@example.com".to_owned(),
            customer_phone: None,
            shipping_address: "12 MG Road".to_owned(),
            shipping_city: Some("Bengaluru".to_owned()),
            shipping_state: None,
            shipping_zip: None,
            shipping_country: "India".to_owned(),
            payment_method: PaymentMethod::Cod,
            payment_status: PaymentStatus::Pending,
            payment_id: None,
        }
    }

    async fn product(pool: &SqlitePool) -> ProductId {
        ProductRepository::new(pool)
            .create(&NewProduct {
                name: "Pearl Drop Earrings".to_owned(),
                description: None,
                price: Money::parse("349.99").unwrap(),
                image: None,
                category: "Earrings".to_owned(),
                stock: 10,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_insert_and_get_snapshot_price() {
        let pool = connect_in_memory().await.unwrap();
        let user = UserRepository::new(&pool).create_guest().await.unwrap();
        let product_id = product(&pool).await;

        let mut tx = pool.begin().await.unwrap();
        let order_id = insert_order(&mut tx, &new_order(user.id, "300")).await.unwrap();
        insert_line(&mut tx, order_id, product_id, 2, Money::parse("150").unwrap())
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let detail = OrderRepository::new(&pool).get(order_id).await.unwrap().unwrap();
        assert_eq!(detail.order.status, OrderStatus::Pending);
        assert_eq!(detail.order.total, Money::parse("300").unwrap());
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].price, Money::parse("150").unwrap());
        assert_eq!(detail.items[0].product.price, Money::parse("349.99").unwrap());
    }

    #[tokio::test]
    async fn test_list_all_newest_first_with_users() {
        let pool = connect_in_memory().await.unwrap();
        let users = UserRepository::new(&pool);
        let first_user = users.create_guest().await.unwrap();
        let second_user = users.create_guest().await.unwrap();
        let product_id = product(&pool).await;

        let mut conn = pool.acquire().await.unwrap();
        let older = insert_order(&mut conn, &new_order(first_user.id, "10")).await.unwrap();
        insert_line(&mut conn, older, product_id, 1, Money::parse("10").unwrap())
            .await
            .unwrap();
        let newer = insert_order(&mut conn, &new_order(second_user.id, "20")).await.unwrap();
        drop(conn);

        let repo = OrderRepository::new(&pool);
        let all = repo.list_all().await.unwrap();
        let ids: Vec<_> = all.iter().map(|d| d.order.id).collect();
        assert_eq!(ids, vec![newer, older]);
        assert_eq!(all[1].items.len(), 1);
        assert!(all[0].items.is_empty());
        assert_eq!(all[0].user.as_ref().map(|u| u.id), Some(second_user.id));

        let mine = repo.list_for_user(first_user.id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].order.id, older);
        assert!(mine[0].user.is_none());
    }

    #[tokio::test]
    async fn test_update_status() {
        let pool = connect_in_memory().await.unwrap();
        let user = UserRepository::new(&pool).create_guest().await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        let order_id = insert_order(&mut conn, &new_order(user.id, "10")).await.unwrap();
        drop(conn);

        let repo = OrderRepository::new(&pool);
        let updated = repo
            .update_status(order_id, OrderStatus::Shipped)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Shipped);

        let missing = repo
            .update_status(OrderId::new(404), OrderStatus::Shipped)
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
