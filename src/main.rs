//! Mercato server entry point
//!
//! Bring-up order:
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐
//! │  Config  │───▶│ Postgres │───▶│  Runner  │───▶│ Gateway  │
//! │  (env)   │    │ (pool)   │    │ (jobs)   │    │ (axum)   │
//! └──────────┘    └──────────┘    └──────────┘    └──────────┘
//! ```

use anyhow::Context;

use mercato::config::AppConfig;
use mercato::db::Database;
use mercato::gateway::{self, state::AppState};
use mercato::logging::init_logging;
use mercato::settlement::SettlementRunner;
use mercato::store::{JobStore, OrderStore, SettlementStore, TransactionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let _log_guard = init_logging(&config);

    tracing::info!(
        port = config.port,
        workers = config.workers,
        out_dir = %config.out_dir.display(),
        "starting mercato"
    );

    let db = Database::connect(&config.database_url)
        .await
        .context("connect to PostgreSQL")?;
    db.ensure_schema().await.context("verify database schema")?;

    let orders = OrderStore::new(db.pool().clone());
    let jobs = JobStore::new(db.pool().clone());
    let transactions = TransactionStore::new(db.pool().clone());
    let settlements = SettlementStore::new(db.pool().clone());

    let runner = SettlementRunner::spawn(
        jobs.clone(),
        transactions,
        settlements,
        config.workers,
        config.out_dir.clone(),
    );

    let state = AppState::new(db, orders, jobs, runner, config.out_dir.clone());
    gateway::run_server(config.port, state).await
}
