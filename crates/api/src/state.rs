use std::sync::Arc;

use creativestalk_core::admin::AdminGate;
use creativestalk_events::{RefreshContext, RefreshHub};
use creativestalk_store::{CatalogView, PortfolioAccess};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is behind an `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Record Store and Media Host access.
    pub access: Arc<PortfolioAccess>,
    /// Database records merged with the built-in showcase.
    pub catalog: CatalogView,
    /// Shared-password check for admin routes.
    pub gate: Arc<AdminGate>,
    /// Refresh channel shared by every connected browser context.
    pub hub: Arc<RefreshHub>,
    /// The server's own context; mutations publish on it.
    pub publisher: Arc<RefreshContext>,
}

impl AppState {
    pub fn new(config: ServerConfig, access: Arc<PortfolioAccess>, hub: Arc<RefreshHub>) -> Self {
        let gate = Arc::new(AdminGate::new(config.admin_password.clone()));
        let publisher = Arc::new(hub.context());
        Self {
            config: Arc::new(config),
            catalog: CatalogView::new(Arc::clone(&access)),
            access,
            gate,
            hub,
            publisher,
        }
    }

    /// Tell every browser context the catalog changed.
    pub fn announce_change(&self) {
        self.publisher.publish();
    }
}
