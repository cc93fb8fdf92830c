//! PostgreSQL pool and schema bring-up

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

const DEFAULT_POOL_SIZE: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared handle to the connection pool. Cheap to clone; every store
/// keeps its own copy.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Open the pool and eagerly establish one connection, so an
    /// unreachable server fails bring-up instead of the first query.
    ///
    /// Pool size comes from `PG_POOL_SIZE` (default 10).
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool_size = std::env::var("PG_POOL_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_POOL_SIZE);

        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(database_url)
            .await?;

        tracing::info!(pool_size, "connected to PostgreSQL");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip ping, used by the health endpoint.
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    /// Create any missing tables.
    ///
    /// The DDL is idempotent; deployments that manage their own schema
    /// simply find every statement a no-op.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        for ddl in SCHEMA_DDL {
            sqlx::query(ddl).execute(&self.pool).await?;
        }
        tracing::info!("database schema verified");
        Ok(())
    }
}

const SCHEMA_DDL: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS products (
    id          BIGSERIAL PRIMARY KEY,
    name        TEXT NOT NULL,
    price_cents BIGINT NOT NULL CHECK (price_cents >= 0),
    stock       INT NOT NULL CHECK (stock >= 0),
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS orders (
    id          BIGSERIAL PRIMARY KEY,
    product_id  BIGINT NOT NULL REFERENCES products (id),
    buyer_id    TEXT NOT NULL,
    quantity    INT NOT NULL CHECK (quantity >= 1),
    total_cents BIGINT NOT NULL,
    status      TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS transactions (
    id           BIGSERIAL PRIMARY KEY,
    merchant_id  TEXT NOT NULL,
    amount_cents BIGINT NOT NULL,
    fee_cents    BIGINT NOT NULL,
    status       TEXT NOT NULL,
    paid_at      TIMESTAMPTZ NOT NULL
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS settlements (
    merchant_id   TEXT NOT NULL,
    date          DATE NOT NULL,
    gross_cents   BIGINT NOT NULL,
    fee_cents     BIGINT NOT NULL,
    net_cents     BIGINT NOT NULL,
    txn_count     BIGINT NOT NULL,
    generated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    unique_run_id TEXT NOT NULL,
    PRIMARY KEY (merchant_id, date)
)
"#,
    r#"
CREATE TABLE IF NOT EXISTS jobs (
    id               TEXT PRIMARY KEY,
    type             TEXT NOT NULL,
    status           TEXT NOT NULL,
    created_at       TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at       TIMESTAMPTZ NOT NULL DEFAULT now(),
    started_at       TIMESTAMPTZ,
    completed_at     TIMESTAMPTZ,
    canceled_at      TIMESTAMPTZ,
    cancel_requested BOOLEAN NOT NULL DEFAULT false,
    total            BIGINT NOT NULL DEFAULT 0,
    processed        BIGINT NOT NULL DEFAULT 0,
    result_path      TEXT,
    error            TEXT,
    from_date        DATE,
    to_date          DATE
)
"#,
];
