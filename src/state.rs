use std::sync::Arc;

use crate::auth::{TokenError, TokenService};
use crate::config::AppConfig;
use crate::database::Store;
use crate::services::{AuthService, HistoryController, ReferenceController, WorkerController};
use crate::database::models::ReferenceTable;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Result<Self, TokenError> {
        let tokens = TokenService::new(
            &config.security.jwt_secret,
            config.security.jwt_expiry_hours,
        )?;
        let auth = AuthService::new(store.clone(), tokens, &config.security);

        Ok(Self {
            config: Arc::new(config),
            store,
            auth,
        })
    }

    pub fn references(&self, table: ReferenceTable) -> ReferenceController {
        ReferenceController::new(table, self.store.clone())
    }

    pub fn workers(&self) -> WorkerController {
        WorkerController::new(self.store.clone())
    }

    pub fn history(&self) -> HistoryController {
        HistoryController::new(self.store.clone())
    }
}
