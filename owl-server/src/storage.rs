//! Script and macro file content storage.
//!
//! Content lives on disk under the data directory, at a server-generated path
//! recorded in the metadata store. Display names never reach the filesystem.

use std::path::{Component, Path, PathBuf};

use common::errors::{AppError, AppResult};
use common::models::FileKind;
use common::utils::IdGenerator;

/// Reads and writes file content below a root directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Stores new content and returns its path relative to the root.
    pub async fn create(&self, kind: FileKind, extension: &str, content: &str) -> AppResult<String> {
        let dir = self.root.join(kind.storage_dir());
        tokio::fs::create_dir_all(&dir).await?;

        let relative = format!("{}/{}", kind.storage_dir(), IdGenerator::storage_name(extension));
        tokio::fs::write(self.resolve(&relative)?, content).await?;
        tracing::debug!(path = %relative, bytes = content.len(), "content stored");
        Ok(relative)
    }

    pub async fn read(&self, relative: &str) -> AppResult<String> {
        let path = self.resolve(relative)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            // a record without content reads as empty
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn write(&self, relative: &str, content: &str) -> AppResult<()> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Removes content; removing missing content is not an error.
    pub async fn remove(&self, relative: &str) -> AppResult<()> {
        match tokio::fs::remove_file(self.resolve(relative)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Joins a stored relative path onto the root, refusing anything that escapes it.
    fn resolve(&self, relative: &str) -> AppResult<PathBuf> {
        let path = Path::new(relative);
        if !path.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(AppError::Storage(format!("invalid storage path: {relative}")));
        }
        Ok(self.root.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_read_write_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        let path = storage
            .create(FileKind::Script, "sql", "select * from test")
            .await
            .unwrap();
        assert!(path.starts_with("scripts/"));
        assert!(path.ends_with(".sql"));
        assert_eq!(storage.read(&path).await.unwrap(), "select * from test");

        storage.write(&path, "select 1").await.unwrap();
        assert_eq!(storage.read(&path).await.unwrap(), "select 1");

        storage.remove(&path).await.unwrap();
        assert!(!dir.path().join(&path).exists());
        storage.remove(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_macro_files_use_own_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        let path = storage.create(FileKind::MacroFile, "sql", "").await.unwrap();
        assert!(path.starts_with("macros/"));
    }

    #[tokio::test]
    async fn test_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(storage.read("../outside.sql").await.is_err());
        assert!(storage.read("/etc/passwd").await.is_err());
    }
}
