//! Application state for the owl server.

use std::sync::Arc;
use std::time::Duration;

use common::config::AppConfig;
use common::errors::AppResult;
use common::models::FileKind;

use crate::executor::QueryExecutor;
use crate::pool_manager::PoolManager;
use crate::service::{DatabaseService, FileService, QueryService};
use crate::storage::FileStorage;
use crate::store::{MetaStore, SqliteMetaStore};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn MetaStore>,
    pub storage: FileStorage,
    pub pool_manager: Arc<PoolManager>,
    pub executor: QueryExecutor,
}

impl AppState {
    /// Creates the data directory, opens the metadata store and wires the services.
    pub async fn new(config: AppConfig) -> AppResult<Self> {
        tokio::fs::create_dir_all(&config.data_dir).await?;

        let store: Arc<dyn MetaStore> = Arc::new(
            SqliteMetaStore::connect(
                &config.database_url,
                Duration::from_secs(config.acquire_timeout_secs),
            )
            .await?,
        );

        Ok(Self::with_store(config, store))
    }

    /// Builds the state around an already opened store.
    pub fn with_store(config: AppConfig, store: Arc<dyn MetaStore>) -> Self {
        Self {
            storage: FileStorage::new(&config.data_dir),
            pool_manager: Arc::new(PoolManager::new(&config, store.clone())),
            executor: QueryExecutor::new(config.query),
            store,
            config,
        }
    }

    pub fn database_service(&self) -> DatabaseService {
        DatabaseService::new(self.store.clone(), self.pool_manager.clone())
    }

    pub fn file_service(&self, kind: FileKind) -> FileService {
        FileService::new(kind, self.store.clone(), self.storage.clone())
    }

    pub fn query_service(&self) -> QueryService {
        QueryService::new(self.store.clone(), self.pool_manager.clone(), self.executor)
    }
}
