//! Metadata store.
//!
//! Persists database configs and script/macro file records. Services talk to
//! the [`MetaStore`] trait; [`SqliteMetaStore`] is the implementation backed by
//! a SQLite database whose tables are created at startup.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use common::errors::{AppError, AppResult};
use common::middleware::AuthenticatedUser;
use common::models::{DatabaseOut, FileKind, FileOut, UserOut};

/// Row from the `databases` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DatabaseRow {
    pub id: i64,
    pub name: String,
    pub pool_size: i64,
    pub description: Option<String>,
    pub owner_id: i64,
    pub owner_username: String,
}

impl DatabaseRow {
    pub fn into_out(self) -> DatabaseOut {
        DatabaseOut {
            id: self.id,
            name: self.name,
            pool_size: self.pool_size,
            owner: UserOut {
                id: self.owner_id,
                username: self.owner_username,
            },
            description: self.description,
        }
    }
}

/// Row from the `scripts` or `macro_files` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileRow {
    pub id: i64,
    pub path: String,
    pub name: String,
    pub extension: String,
}

impl From<FileRow> for FileOut {
    fn from(row: FileRow) -> Self {
        Self {
            id: row.id,
            path: row.path,
            name: row.name,
            extension: row.extension,
        }
    }
}

/// Fields of a database config to change; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct DatabaseChanges {
    pub name: Option<String>,
    pub pool_size: Option<i64>,
    pub description: Option<String>,
}

/// Data-access layer used by the services.
#[async_trait]
pub trait MetaStore: Send + Sync {
    /// Lists the configs owned by `owner_id`, oldest first.
    async fn list_databases(&self, owner_id: i64) -> AppResult<Vec<DatabaseRow>>;

    async fn get_database(&self, id: i64) -> AppResult<Option<DatabaseRow>>;

    /// Inserts a config; a duplicate name is a [`AppError::Conflict`].
    async fn create_database(
        &self,
        owner: &AuthenticatedUser,
        name: &str,
        pool_size: i64,
        description: Option<&str>,
    ) -> AppResult<DatabaseRow>;

    async fn update_database(&self, id: i64, changes: DatabaseChanges)
        -> AppResult<Option<DatabaseRow>>;

    /// Returns whether a row was deleted.
    async fn delete_database(&self, id: i64) -> AppResult<bool>;

    async fn list_files(&self, kind: FileKind) -> AppResult<Vec<FileRow>>;

    async fn get_file(&self, kind: FileKind, id: i64) -> AppResult<Option<FileRow>>;

    async fn file_exists(&self, kind: FileKind, id: i64) -> AppResult<bool>;

    async fn create_file(
        &self,
        kind: FileKind,
        name: &str,
        path: &str,
        extension: &str,
    ) -> AppResult<FileRow>;

    /// Changes the display name in a single statement.
    async fn rename_file(
        &self,
        kind: FileKind,
        id: i64,
        name: &str,
        extension: &str,
    ) -> AppResult<Option<FileRow>>;

    /// Deletes the record, returning it so its content can be removed.
    async fn delete_file(&self, kind: FileKind, id: i64) -> AppResult<Option<FileRow>>;
}

/// [`MetaStore`] backed by SQLite.
pub struct SqliteMetaStore {
    pool: SqlitePool,
}

impl SqliteMetaStore {
    /// Connects to the metadata database and ensures its tables exist.
    pub async fn connect(database_url: &str, acquire_timeout: Duration) -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseQuery(format!("Failed to open metadata store: {}", e)))?;

        let store = Self { pool };
        store.ensure_tables().await?;
        Ok(store)
    }

    /// Creates the metadata tables if they do not exist.
    async fn ensure_tables(&self) -> AppResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS databases (
                id             INTEGER PRIMARY KEY AUTOINCREMENT,
                name           TEXT    NOT NULL UNIQUE,
                pool_size      INTEGER NOT NULL DEFAULT 1 CHECK (pool_size BETWEEN 1 AND 1000),
                description    TEXT    DEFAULT NULL,
                owner_id       INTEGER NOT NULL,
                owner_username TEXT    NOT NULL,
                created_at     TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at     TEXT    NOT NULL DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseQuery(format!("Failed to create databases table: {}", e)))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_databases_owner ON databases (owner_id)")
            .execute(&self.pool)
            .await
            .map_err(AppError::store)?;

        for kind in [FileKind::Script, FileKind::MacroFile] {
            let ddl = format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id         INTEGER PRIMARY KEY AUTOINCREMENT,
                    path       TEXT NOT NULL UNIQUE,
                    name       TEXT NOT NULL,
                    extension  TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
                kind.table()
            );
            sqlx::query(&ddl).execute(&self.pool).await.map_err(|e| {
                AppError::DatabaseQuery(format!("Failed to create {} table: {}", kind.table(), e))
            })?;
        }

        tracing::info!("Metadata tables ensured");
        Ok(())
    }
}

const DATABASE_COLUMNS: &str = "id, name, pool_size, description, owner_id, owner_username";
const FILE_COLUMNS: &str = "id, path, name, extension";

#[async_trait]
impl MetaStore for SqliteMetaStore {
    async fn list_databases(&self, owner_id: i64) -> AppResult<Vec<DatabaseRow>> {
        sqlx::query_as::<_, DatabaseRow>(&format!(
            "SELECT {DATABASE_COLUMNS} FROM databases WHERE owner_id = ? ORDER BY id"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::store)
    }

    async fn get_database(&self, id: i64) -> AppResult<Option<DatabaseRow>> {
        sqlx::query_as::<_, DatabaseRow>(&format!(
            "SELECT {DATABASE_COLUMNS} FROM databases WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::store)
    }

    async fn create_database(
        &self,
        owner: &AuthenticatedUser,
        name: &str,
        pool_size: i64,
        description: Option<&str>,
    ) -> AppResult<DatabaseRow> {
        sqlx::query_as::<_, DatabaseRow>(&format!(
            "INSERT INTO databases (name, pool_size, description, owner_id, owner_username)
             VALUES (?, ?, ?, ?, ?)
             RETURNING {DATABASE_COLUMNS}"
        ))
        .bind(name)
        .bind(pool_size)
        .bind(description)
        .bind(owner.id)
        .bind(&owner.username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::store(e) {
            AppError::Conflict(_) => AppError::Conflict(format!("database name '{name}' already exists")),
            other => other,
        })
    }

    async fn update_database(
        &self,
        id: i64,
        changes: DatabaseChanges,
    ) -> AppResult<Option<DatabaseRow>> {
        let name = changes.name.clone();
        sqlx::query_as::<_, DatabaseRow>(&format!(
            "UPDATE databases
             SET name = COALESCE(?, name),
                 pool_size = COALESCE(?, pool_size),
                 description = COALESCE(?, description),
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = ?
             RETURNING {DATABASE_COLUMNS}"
        ))
        .bind(changes.name)
        .bind(changes.pool_size)
        .bind(changes.description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match AppError::store(e) {
            AppError::Conflict(_) => AppError::Conflict(format!(
                "database name '{}' already exists",
                name.unwrap_or_default()
            )),
            other => other,
        })
    }

    async fn delete_database(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM databases WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::store)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_files(&self, kind: FileKind) -> AppResult<Vec<FileRow>> {
        sqlx::query_as::<_, FileRow>(&format!(
            "SELECT {FILE_COLUMNS} FROM {} ORDER BY id",
            kind.table()
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::store)
    }

    async fn get_file(&self, kind: FileKind, id: i64) -> AppResult<Option<FileRow>> {
        sqlx::query_as::<_, FileRow>(&format!(
            "SELECT {FILE_COLUMNS} FROM {} WHERE id = ?",
            kind.table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::store)
    }

    async fn file_exists(&self, kind: FileKind, id: i64) -> AppResult<bool> {
        let row: (i64,) = sqlx::query_as(&format!(
            "SELECT COUNT(*) FROM {} WHERE id = ?",
            kind.table()
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::store)?;
        Ok(row.0 > 0)
    }

    async fn create_file(
        &self,
        kind: FileKind,
        name: &str,
        path: &str,
        extension: &str,
    ) -> AppResult<FileRow> {
        sqlx::query_as::<_, FileRow>(&format!(
            "INSERT INTO {} (path, name, extension) VALUES (?, ?, ?) RETURNING {FILE_COLUMNS}",
            kind.table()
        ))
        .bind(path)
        .bind(name)
        .bind(extension)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::store)
    }

    async fn rename_file(
        &self,
        kind: FileKind,
        id: i64,
        name: &str,
        extension: &str,
    ) -> AppResult<Option<FileRow>> {
        sqlx::query_as::<_, FileRow>(&format!(
            "UPDATE {} SET name = ?, extension = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?
             RETURNING {FILE_COLUMNS}",
            kind.table()
        ))
        .bind(name)
        .bind(extension)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::store)
    }

    async fn delete_file(&self, kind: FileKind, id: i64) -> AppResult<Option<FileRow>> {
        sqlx::query_as::<_, FileRow>(&format!(
            "DELETE FROM {} WHERE id = ? RETURNING {FILE_COLUMNS}",
            kind.table()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::store)
    }
}
