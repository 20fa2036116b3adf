//! 数据库配置管理服务

use std::sync::Arc;

use async_trait::async_trait;

use common::errors::{AppError, AppResult};
use common::middleware::AuthenticatedUser;
use common::models::{CreateDatabaseIn, DatabaseOut, DeletedOut, UpdateDatabaseIn};

use crate::pool_manager::PoolManager;
use crate::store::{DatabaseChanges, DatabaseRow, MetaStore};

const RESOURCE: &str = "database";

/// 数据库配置服务 Trait
#[async_trait]
pub trait DatabaseServiceTrait: Send + Sync {
    /// 列出当前用户的数据库配置
    async fn list(&self, user: &AuthenticatedUser) -> AppResult<Vec<DatabaseOut>>;

    /// 根据 ID 获取数据库配置
    async fn get(&self, user: &AuthenticatedUser, id: i64) -> AppResult<DatabaseOut>;

    /// 创建数据库配置
    async fn create(&self, user: &AuthenticatedUser, req: CreateDatabaseIn) -> AppResult<DatabaseOut>;

    /// 部分更新数据库配置
    async fn update(
        &self,
        user: &AuthenticatedUser,
        id: i64,
        req: UpdateDatabaseIn,
    ) -> AppResult<DatabaseOut>;

    /// 删除数据库配置及其数据库文件
    async fn delete(&self, user: &AuthenticatedUser, id: i64) -> AppResult<DeletedOut>;
}

/// 数据库配置服务
pub struct DatabaseService {
    store: Arc<dyn MetaStore>,
    pool_manager: Arc<PoolManager>,
}

impl DatabaseService {
    pub fn new(store: Arc<dyn MetaStore>, pool_manager: Arc<PoolManager>) -> Self {
        Self { store, pool_manager }
    }

    /// 获取属于当前用户的配置；其他用户的配置视为不存在
    async fn owned(&self, user: &AuthenticatedUser, id: i64) -> AppResult<DatabaseRow> {
        self.store
            .get_database(id)
            .await?
            .filter(|row| row.owner_id == user.id)
            .ok_or_else(|| AppError::not_found(RESOURCE, id))
    }
}

#[async_trait]
impl DatabaseServiceTrait for DatabaseService {
    async fn list(&self, user: &AuthenticatedUser) -> AppResult<Vec<DatabaseOut>> {
        let rows = self.store.list_databases(user.id).await?;
        Ok(rows.into_iter().map(DatabaseRow::into_out).collect())
    }

    async fn get(&self, user: &AuthenticatedUser, id: i64) -> AppResult<DatabaseOut> {
        self.owned(user, id).await.map(DatabaseRow::into_out)
    }

    async fn create(&self, user: &AuthenticatedUser, req: CreateDatabaseIn) -> AppResult<DatabaseOut> {
        let row = self
            .store
            .create_database(user, &req.name, req.pool_size, req.description.as_deref())
            .await?;

        tracing::info!(id = row.id, name = %row.name, owner = user.id, "数据库配置已创建");
        Ok(row.into_out())
    }

    async fn update(
        &self,
        user: &AuthenticatedUser,
        id: i64,
        req: UpdateDatabaseIn,
    ) -> AppResult<DatabaseOut> {
        let current = self.owned(user, id).await?;
        let resized = req.pool_size.is_some_and(|size| size != current.pool_size);

        let changes = DatabaseChanges {
            name: req.name,
            pool_size: req.pool_size,
            description: req.description,
        };
        let row = self
            .store
            .update_database(id, changes)
            .await?
            .ok_or_else(|| AppError::not_found(RESOURCE, id))?;

        if resized {
            // 连接池按新的大小在下次使用时重建
            self.pool_manager.evict(id).await;
        }

        tracing::info!(id, resized, "数据库配置已更新");
        Ok(row.into_out())
    }

    async fn delete(&self, user: &AuthenticatedUser, id: i64) -> AppResult<DeletedOut> {
        self.owned(user, id).await?;

        if !self.store.delete_database(id).await? {
            return Err(AppError::not_found(RESOURCE, id));
        }
        self.pool_manager.remove_database(id).await?;

        tracing::info!(id, "数据库配置已删除");
        Ok(DeletedOut { id, deleted: true })
    }
}
