//! # Application State
//!
//! Everything a command needs: the database handle and the loaded
//! configuration. Cloning is cheap; the pool inside `Database` is shared.

use tracing::info;

use masseria_db::{Database, DbConfig, DbResult};

use crate::config::AppConfig;

#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: AppConfig,
}

impl AppState {
    /// Connects to the configured database and runs migrations.
    pub async fn connect(config: AppConfig) -> DbResult<Self> {
        let db_config = DbConfig::new(&config.database_path).max_connections(config.max_connections);
        let db = Database::new(db_config).await?;
        info!(path = %config.database_path.display(), "Database ready");
        Ok(Self::with_database(db, config))
    }

    /// Wraps an existing database, applying the configured slot capacity.
    pub fn with_database(db: Database, config: AppConfig) -> Self {
        let db = db.with_slot_capacity(config.slot_capacity);
        AppState { db, config }
    }

    /// A migrated in-memory state with default configuration.
    pub async fn in_memory() -> DbResult<Self> {
        let db = Database::new(DbConfig::in_memory()).await?;
        Ok(Self::with_database(db, AppConfig::default()))
    }
}
