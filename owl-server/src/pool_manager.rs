//! Target database connection pool manager.
//!
//! Every database config owns a SQLite file under `<data_dir>/databases/`
//! and gets its own pool, sized by the config's `pool_size`. Requests without
//! a database id run against the default database. Pools are created on first
//! use and cached until the config changes or is deleted.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::sync::RwLock;

use common::config::AppConfig;
use common::errors::{AppError, AppResult};
use common::models::MAX_POOL_SIZE;

use crate::store::MetaStore;

/// Connections lent out by the default database pool.
pub const DEFAULT_DATABASE_POOL_SIZE: u32 = 5;

const DATABASES_DIR: &str = "databases";
const DEFAULT_DATABASE_FILE: &str = "default.sqlite";

/// Statistics for the cached pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub pools: usize,
    pub connections: u32,
    pub idle: usize,
}

/// Manages one connection pool per target database.
pub struct PoolManager {
    databases_dir: PathBuf,
    acquire_timeout: Duration,
    store: Arc<dyn MetaStore>,
    /// Cached pools; `None` is the default database.
    pools: RwLock<HashMap<Option<i64>, SqlitePool>>,
    /// Bumped by every eviction, under the `pools` write lock.
    generation: AtomicU64,
}

impl PoolManager {
    pub fn new(config: &AppConfig, store: Arc<dyn MetaStore>) -> Self {
        Self {
            databases_dir: config.data_dir.join(DATABASES_DIR),
            acquire_timeout: Duration::from_secs(config.acquire_timeout_secs),
            store,
            pools: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// File backing a database config, or the default database for `None`.
    pub fn database_path(&self, database_id: Option<i64>) -> PathBuf {
        match database_id {
            Some(id) => self.databases_dir.join(format!("{id}.sqlite")),
            None => self.databases_dir.join(DEFAULT_DATABASE_FILE),
        }
    }

    /// Returns the pool for a database id, creating it on first use.
    ///
    /// Ids without a stored config fail with [`AppError::PoolResolution`]. A
    /// pool built from a config read before an eviction is discarded and
    /// rebuilt, so a resize never leaves the old size cached.
    pub async fn get_pool(&self, database_id: Option<i64>) -> AppResult<SqlitePool> {
        loop {
            {
                let pools = self.pools.read().await;
                if let Some(pool) = pools.get(&database_id) {
                    return Ok(pool.clone());
                }
            }

            let generation = self.generation.load(Ordering::Acquire);
            let max_connections = match database_id {
                Some(id) => {
                    let config = self
                        .store
                        .get_database(id)
                        .await?
                        .ok_or_else(|| AppError::PoolResolution(format!("unknown database id {id}")))?;
                    u32::try_from(config.pool_size.clamp(1, MAX_POOL_SIZE)).unwrap_or(1)
                }
                None => DEFAULT_DATABASE_POOL_SIZE,
            };

            let pool = self.create_pool(database_id, max_connections).await?;

            let mut pools = self.pools.write().await;
            if let Some(existing) = pools.get(&database_id) {
                // another request created the pool while this one was connecting
                let existing = existing.clone();
                drop(pools);
                pool.close().await;
                return Ok(existing);
            }
            if self.generation.load(Ordering::Acquire) != generation {
                drop(pools);
                pool.close().await;
                tracing::debug!(?database_id, "Config changed while connecting, retrying");
                continue;
            }
            pools.insert(database_id, pool.clone());

            tracing::info!(?database_id, max_connections, "Pool created");
            return Ok(pool);
        }
    }

    async fn create_pool(&self, database_id: Option<i64>, max_connections: u32) -> AppResult<SqlitePool> {
        tokio::fs::create_dir_all(&self.databases_dir).await?;

        let options = SqliteConnectOptions::new()
            .filename(self.database_path(database_id))
            .create_if_missing(true);

        SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| {
                tracing::error!(?database_id, error = %e, "Failed to open database");
                AppError::execution(e)
            })
    }

    /// Drops the cached pool so the next use rebuilds it from the stored config.
    pub async fn evict(&self, database_id: i64) {
        let removed = {
            let mut pools = self.pools.write().await;
            self.generation.fetch_add(1, Ordering::AcqRel);
            pools.remove(&Some(database_id))
        };
        if let Some(pool) = removed {
            pool.close().await;
            tracing::debug!(database_id, "Pool evicted");
        }
    }

    /// Evicts the pool and deletes the database file.
    pub async fn remove_database(&self, database_id: i64) -> AppResult<()> {
        self.evict(database_id).await;

        let path = self.database_path(Some(database_id));
        let mut files = vec![path.clone()];
        for suffix in ["-wal", "-shm", "-journal"] {
            let mut side = path.clone().into_os_string();
            side.push(suffix);
            files.push(PathBuf::from(side));
        }

        for file in files {
            match tokio::fs::remove_file(&file).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    pub async fn stats(&self) -> PoolStats {
        let pools = self.pools.read().await;
        PoolStats {
            pools: pools.len(),
            connections: pools.values().map(|p| p.size()).sum(),
            idle: pools.values().map(|p| p.num_idle()).sum(),
        }
    }

    /// Closes every cached pool.
    pub async fn close_all(&self) {
        let drained: Vec<SqlitePool> = self.pools.write().await.drain().map(|(_, p)| p).collect();
        for pool in drained {
            pool.close().await;
        }
    }
}
