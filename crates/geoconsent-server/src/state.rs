//! Shared application state.

use std::sync::Arc;

use geoconsent_core::{ConsentTables, GatewayConfig};

use crate::origin::Origin;

/// Read-only state shared by every request. Built once at start-up.
pub struct AppState {
    pub config: GatewayConfig,
    pub tables: ConsentTables,
    pub origin: Arc<dyn Origin>,
}

impl AppState {
    pub fn new(config: GatewayConfig, tables: ConsentTables, origin: Arc<dyn Origin>) -> Self {
        Self {
            config,
            tables,
            origin,
        }
    }
}
