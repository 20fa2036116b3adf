//! 查询执行服务模块

use std::sync::Arc;
use std::time::Instant;

use common::errors::{AppError, AppResult};
use common::middleware::AuthenticatedUser;
use common::models::{RunIn, RunOut, RunQuery};

use crate::executor::QueryExecutor;
use crate::pool_manager::PoolManager;
use crate::store::MetaStore;

/// SQL 查询执行服务
pub struct QueryService {
    store: Arc<dyn MetaStore>,
    pool_manager: Arc<PoolManager>,
    executor: QueryExecutor,
}

impl QueryService {
    /// 创建新的查询服务实例
    pub fn new(store: Arc<dyn MetaStore>, pool_manager: Arc<PoolManager>, executor: QueryExecutor) -> Self {
        Self {
            store,
            pool_manager,
            executor,
        }
    }

    /// 在目标数据库（未指定时为默认数据库）上执行 SQL
    pub async fn run(&self, user: &AuthenticatedUser, params: RunQuery, req: RunIn) -> AppResult<RunOut> {
        if req.query.trim().is_empty() {
            return Err(AppError::field("query", "Query must not be empty"));
        }

        // 只能在自己的数据库上执行
        if let Some(id) = params.database_id {
            let owned = self
                .store
                .get_database(id)
                .await?
                .is_some_and(|row| row.owner_id == user.id);
            if !owned {
                return Err(AppError::PoolResolution(format!("unknown database id {id}")));
            }
        }

        let pool = self.pool_manager.get_pool(params.database_id).await?;

        let start = Instant::now();
        let result = self
            .executor
            .execute(&pool, params.database_id, &req.query, &params)
            .await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(out) => tracing::info!(
                database_id = ?params.database_id,
                statement_type = %out.statement_type,
                elapsed_ms,
                "查询执行完成"
            ),
            Err(e) => tracing::warn!(
                database_id = ?params.database_id,
                error = %e,
                elapsed_ms,
                "查询执行失败"
            ),
        }
        result
    }
}
