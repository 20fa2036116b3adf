//! 脚本与宏文件管理服务
//!
//! 两类文件的操作完全相同，只是元数据表与存储目录不同，由 [`FileKind`] 区分。

use std::sync::Arc;

use async_trait::async_trait;
use validator::Validate;

use common::errors::{AppError, AppResult};
use common::models::file::extension_of;
use common::models::{
    CreateFileIn, DeletedOut, ExistsOut, FileContentOut, FileKind, FileOut, RenameFileIn,
    UpdateContentIn, UpdateFileIn,
};

use crate::storage::FileStorage;
use crate::store::{FileRow, MetaStore};

/// 文件服务 Trait
#[async_trait]
pub trait FileServiceTrait: Send + Sync {
    /// 列出所有文件
    async fn list(&self) -> AppResult<Vec<FileOut>>;

    /// 根据 ID 获取文件
    async fn get(&self, id: i64) -> AppResult<FileOut>;

    /// 检查文件是否存在
    async fn exists(&self, id: i64) -> AppResult<ExistsOut>;

    /// 创建文件
    async fn create(&self, req: CreateFileIn) -> AppResult<FileOut>;

    /// 上传文件，文件名即显示名称
    async fn upload(&self, file_name: String, content: String) -> AppResult<FileOut>;

    /// 更新文件名称和/或内容
    async fn update(&self, id: i64, req: UpdateFileIn) -> AppResult<FileOut>;

    /// 重命名文件
    async fn rename(&self, id: i64, req: RenameFileIn) -> AppResult<FileOut>;

    /// 读取文件内容
    async fn content(&self, id: i64) -> AppResult<FileContentOut>;

    /// 保存文件内容
    async fn save_content(&self, id: i64, req: UpdateContentIn) -> AppResult<FileContentOut>;

    /// 删除文件记录及其内容
    async fn delete(&self, id: i64) -> AppResult<DeletedOut>;
}

/// 脚本/宏文件服务
pub struct FileService {
    kind: FileKind,
    store: Arc<dyn MetaStore>,
    storage: FileStorage,
}

impl FileService {
    pub fn new(kind: FileKind, store: Arc<dyn MetaStore>, storage: FileStorage) -> Self {
        Self { kind, store, storage }
    }

    async fn row(&self, id: i64) -> AppResult<FileRow> {
        self.store
            .get_file(self.kind, id)
            .await?
            .ok_or_else(|| self.not_found(id))
    }

    fn not_found(&self, id: i64) -> AppError {
        AppError::not_found(self.kind.resource(), id)
    }

    async fn rename_row(&self, id: i64, name: &str) -> AppResult<FileRow> {
        self.store
            .rename_file(self.kind, id, name, &extension_of(name))
            .await?
            .ok_or_else(|| self.not_found(id))
    }
}

#[async_trait]
impl FileServiceTrait for FileService {
    async fn list(&self) -> AppResult<Vec<FileOut>> {
        let rows = self.store.list_files(self.kind).await?;
        Ok(rows.into_iter().map(FileOut::from).collect())
    }

    async fn get(&self, id: i64) -> AppResult<FileOut> {
        self.row(id).await.map(FileOut::from)
    }

    async fn exists(&self, id: i64) -> AppResult<ExistsOut> {
        let exists = self.store.file_exists(self.kind, id).await?;
        Ok(ExistsOut { exists })
    }

    async fn create(&self, req: CreateFileIn) -> AppResult<FileOut> {
        let extension = extension_of(&req.name);
        let content = req.content.unwrap_or_default();
        let path = self.storage.create(self.kind, &extension, &content).await?;

        let row = match self.store.create_file(self.kind, &req.name, &path, &extension).await {
            Ok(row) => row,
            Err(e) => {
                // 记录写入失败时清理已写入的内容
                if let Err(cleanup) = self.storage.remove(&path).await {
                    tracing::warn!(path = %path, error = %cleanup, "清理文件内容失败");
                }
                return Err(e);
            }
        };

        tracing::info!(kind = self.kind.resource(), id = row.id, name = %row.name, "文件已创建");
        Ok(row.into())
    }

    async fn upload(&self, file_name: String, content: String) -> AppResult<FileOut> {
        let req = CreateFileIn {
            name: file_name,
            content: Some(content),
        };
        req.validate()?;
        self.create(req).await
    }

    async fn update(&self, id: i64, req: UpdateFileIn) -> AppResult<FileOut> {
        let mut row = self.row(id).await?;

        if let Some(content) = req.content.as_deref() {
            self.storage.write(&row.path, content).await?;
        }
        if let Some(name) = req.name.as_deref() {
            row = self.rename_row(id, name).await?;
        }

        tracing::info!(kind = self.kind.resource(), id, "文件已更新");
        Ok(row.into())
    }

    async fn rename(&self, id: i64, req: RenameFileIn) -> AppResult<FileOut> {
        let row = self.rename_row(id, &req.name).await?;
        tracing::info!(kind = self.kind.resource(), id, name = %row.name, "文件已重命名");
        Ok(row.into())
    }

    async fn content(&self, id: i64) -> AppResult<FileContentOut> {
        let row = self.row(id).await?;
        let content = self.storage.read(&row.path).await?;
        Ok(FileContentOut { content })
    }

    async fn save_content(&self, id: i64, req: UpdateContentIn) -> AppResult<FileContentOut> {
        let row = self.row(id).await?;
        self.storage.write(&row.path, &req.content).await?;
        Ok(FileContentOut {
            content: req.content,
        })
    }

    async fn delete(&self, id: i64) -> AppResult<DeletedOut> {
        let row = self
            .store
            .delete_file(self.kind, id)
            .await?
            .ok_or_else(|| self.not_found(id))?;
        self.storage.remove(&row.path).await?;

        tracing::info!(kind = self.kind.resource(), id, "文件已删除");
        Ok(DeletedOut { id, deleted: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteMetaStore;
    use std::time::Duration;

    async fn service(kind: FileKind) -> (tempfile::TempDir, FileService) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("meta.db").display());
        let store = SqliteMetaStore::connect(&url, Duration::from_secs(5))
            .await
            .unwrap();
        let service = FileService::new(kind, Arc::new(store), FileStorage::new(dir.path()));
        (dir, service)
    }

    #[tokio::test]
    async fn test_create_defaults_to_empty_content() {
        let (_dir, service) = service(FileKind::Script).await;
        let file = service
            .create(CreateFileIn {
                name: "empty.sql".into(),
                content: None,
            })
            .await
            .unwrap();

        assert_eq!(file.extension, "sql");
        assert_eq!(service.content(file.id).await.unwrap().content, "");
    }

    #[tokio::test]
    async fn test_upload_validates_file_name() {
        let (_dir, service) = service(FileKind::MacroFile).await;
        let err = service
            .upload("macro.txt".into(), "select 1".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rename_keeps_content_path() {
        let (_dir, service) = service(FileKind::Script).await;
        let file = service.upload("query.sql".into(), "select 2".into()).await.unwrap();

        let renamed = service
            .rename(file.id, RenameFileIn { name: "renamed.sql".into() })
            .await
            .unwrap();
        assert_eq!(renamed.name, "renamed.sql");
        assert_eq!(renamed.path, file.path);
        assert_eq!(service.content(file.id).await.unwrap().content, "select 2");
    }

    #[tokio::test]
    async fn test_update_content_only() {
        let (_dir, service) = service(FileKind::Script).await;
        let file = service.upload("query.sql".into(), "old".into()).await.unwrap();

        let updated = service
            .update(
                file.id,
                UpdateFileIn {
                    name: None,
                    content: Some("new".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "query.sql");
        assert_eq!(service.content(file.id).await.unwrap().content, "new");
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_content() {
        let (dir, service) = service(FileKind::Script).await;
        let file = service.upload("query.sql".into(), "select 3".into()).await.unwrap();
        assert!(dir.path().join(&file.path).exists());

        service.delete(file.id).await.unwrap();
        assert!(!service.exists(file.id).await.unwrap().exists);
        assert!(!dir.path().join(&file.path).exists());

        let err = service.delete(file.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
