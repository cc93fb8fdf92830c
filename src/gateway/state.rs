use std::path::PathBuf;
use std::sync::Arc;

use crate::db::Database;
use crate::settlement::SettlementRunner;
use crate::store::{JobStore, OrderStore};

/// Gateway application state (shared)
#[derive(Clone)]
pub struct AppState {
    /// Connection pool, used directly only for health checks
    pub db: Database,
    /// Order placement / lookup
    pub orders: OrderStore,
    /// Job rows (status reads, cancel requests)
    pub jobs: JobStore,
    /// Settlement job dispatcher
    pub runner: Arc<SettlementRunner>,
    /// CSV artifact directory, served at /downloads
    pub out_dir: PathBuf,
}

impl AppState {
    pub fn new(
        db: Database,
        orders: OrderStore,
        jobs: JobStore,
        runner: Arc<SettlementRunner>,
        out_dir: PathBuf,
    ) -> Self {
        Self {
            db,
            orders,
            jobs,
            runner,
            out_dir,
        }
    }
}
