//! Mercato - small commerce backend
//!
//! Two subsystems carry the real invariants:
//!
//! - the order path: an atomic conditional stock decrement bound to the
//!   order insert in one transaction, so concurrent buyers can never
//!   oversell a product;
//! - the settlement path: an asynchronous job engine that streams PAID
//!   transactions in keyset-paginated batches, folds them with a worker
//!   pool into per-merchant-per-day totals, and emits the result to the
//!   `settlements` table and a CSV artifact, with live progress and
//!   cooperative cancellation.
//!
//! # Modules
//!
//! - [`config`] - Environment configuration
//! - [`logging`] - Tracing subscriber bring-up
//! - [`db`] - PostgreSQL pool and schema
//! - [`models`] - Row-shaped core types
//! - [`store`] - Per-table persistence stores
//! - [`settlement`] - Aggregation engine, CSV artifact, job controller
//! - [`gateway`] - HTTP surface

pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod settlement;
pub mod store;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use db::Database;
pub use models::{Job, JobStatus, JobType, Order, Product, Settlement};
pub use settlement::{JobError, SettlementRunner};
pub use store::{JobStore, OrderError, OrderStore, SettlementStore, TransactionStore};
