//! Application state wiring all services together.
//!
//! `AppState` pins the generic core services to the concrete SQLite
//! store and is cloned into every request handler.

use std::path::Path;
use std::sync::Arc;

use parley_core::broadcast::BroadcastHub;
use parley_core::conversation::append::AppendEngine;
use parley_core::conversation::query::QueryService;
use parley_infra::config::{load_service_config, resolve_data_dir};
use parley_infra::sqlite::pool::DatabasePool;
use parley_infra::sqlite::session::SqliteSessionStore;
use parley_types::config::ServiceConfig;

/// Concrete type aliases for the service generics pinned to the SQLite
/// store.
pub type ConcreteAppendEngine = AppendEngine<SqliteSessionStore>;
pub type ConcreteQueryService = QueryService<SqliteSessionStore>;

/// Shared application state holding all services.
#[derive(Clone)]
pub struct AppState {
    pub append_engine: Arc<ConcreteAppendEngine>,
    pub query_service: Arc<ConcreteQueryService>,
    pub hub: Arc<BroadcastHub>,
    pub store: Arc<SqliteSessionStore>,
    pub config: ServiceConfig,
}

impl AppState {
    /// Initialize the application state from the resolved data directory.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        Self::init_with_dir(&data_dir).await
    }

    /// Initialize against an explicit data directory: connect to the
    /// database, load config, and wire the services.
    pub async fn init_with_dir(data_dir: &Path) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;

        let config = load_service_config(data_dir).await;

        let db_url = format!("sqlite://{}?mode=rwc", data_dir.join("parley.db").display());
        let pool = DatabasePool::new(&db_url).await?;

        let store = Arc::new(SqliteSessionStore::new(pool));
        let hub = Arc::new(BroadcastHub::new());

        Ok(Self {
            append_engine: Arc::new(AppendEngine::new(store.clone(), hub.clone())),
            query_service: Arc::new(QueryService::new(store.clone())),
            hub,
            store,
            config,
        })
    }
}
