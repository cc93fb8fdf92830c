//! Persistence layer
//!
//! One store per table family, each a thin `Clone`-able wrapper around the
//! shared `PgPool`. Queries are written with runtime-bound `sqlx::query`;
//! every store owns the row mapping for its own tables.

pub mod jobs;
pub mod orders;
pub mod settlements;
pub mod transactions;

pub use jobs::JobStore;
pub use orders::{OrderError, OrderStore};
pub use settlements::SettlementStore;
pub use transactions::{TransactionRow, TransactionStore};
