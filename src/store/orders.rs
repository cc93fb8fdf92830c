//! Order placement and product stock
//!
//! The stock check lives inside the UPDATE's WHERE clause, so the database
//! serializes row writes and the affected-row count is the oversell guard.
//! SELECT-then-UPDATE is not allowed here.

use sqlx::{PgPool, Row, postgres::PgRow};
use thiserror::Error;

use crate::models::{ORDER_STATUS_CREATED, Order, Product};

#[derive(Error, Debug)]
pub enum OrderError {
    /// The conditional decrement matched no row: not enough stock.
    #[error("OUT_OF_STOCK")]
    OutOfStock,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Store for `products` and `orders`.
#[derive(Clone)]
pub struct OrderStore {
    pool: PgPool,
}

impl OrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Atomically decrement stock and record the order.
    ///
    /// Runs in one transaction at the pool's default READ COMMITTED level:
    /// the predicate `stock >= qty` is enforced by the atomic UPDATE, so
    /// for N concurrent single-unit orders against stock K exactly K
    /// succeed. On `OutOfStock` (or any later error) the open transaction
    /// is dropped and rolls back, restoring stock.
    pub async fn place_order(
        &self,
        product_id: i64,
        quantity: i32,
        buyer_id: &str,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let affected = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $1,
                updated_at = now()
            WHERE id = $2
              AND stock >= $1
            "#,
        )
        .bind(quantity)
        .bind(product_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(OrderError::OutOfStock);
        }

        let price_cents: i64 = sqlx::query_scalar("SELECT price_cents FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await?;

        let total_cents = price_cents * quantity as i64;

        let row = sqlx::query(
            r#"
            INSERT INTO orders (product_id, buyer_id, quantity, total_cents, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, created_at
            "#,
        )
        .bind(product_id)
        .bind(buyer_id)
        .bind(quantity)
        .bind(total_cents)
        .bind(ORDER_STATUS_CREATED)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Order {
            id: row.get("id"),
            product_id,
            buyer_id: buyer_id.to_string(),
            quantity,
            total_cents,
            status: ORDER_STATUS_CREATED.to_string(),
            created_at: row.get("created_at"),
        })
    }

    /// Fetch an order by id.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Order>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, product_id, buyer_id, quantity, total_cents, status, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(order_from_row))
    }

    /// Fetch a product by id.
    pub async fn get_product(&self, id: i64) -> Result<Option<Product>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, name, price_cents, stock, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Product {
            id: r.get("id"),
            name: r.get("name"),
            price_cents: r.get("price_cents"),
            stock: r.get("stock"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }))
    }

    /// Insert a product, returning its id. Seeding/maintenance helper.
    pub async fn create_product(
        &self,
        name: &str,
        price_cents: i64,
        stock: i32,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO products (name, price_cents, stock) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(name)
        .bind(price_cents)
        .bind(stock)
        .fetch_one(&self.pool)
        .await
    }

    /// Overwrite a product's stock. Maintenance helper.
    pub async fn reset_product_stock(
        &self,
        product_id: i64,
        stock: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE products SET stock = $1, updated_at = now() WHERE id = $2")
            .bind(stock)
            .bind(product_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn order_from_row(row: PgRow) -> Order {
    Order {
        id: row.get("id"),
        product_id: row.get("product_id"),
        buyer_id: row.get("buyer_id"),
        quantity: row.get("quantity"),
        total_cents: row.get("total_cents"),
        status: row.get("status"),
        created_at: row.get("created_at"),
    }
}
