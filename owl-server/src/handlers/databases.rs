//! 数据库配置端点

use axum::{extract::State, Json};

use common::errors::AppError;
use common::extract::{IdPath, ValidatedJson};
use common::middleware::AuthenticatedUser;
use common::models::{CreateDatabaseIn, DatabaseOut, DeletedOut, UpdateDatabaseIn};
use common::response::ErrorResponse;

use crate::service::DatabaseServiceTrait;
use crate::state::AppState;

/// 列出当前用户的数据库配置
#[utoipa::path(
    get,
    path = "/api/databases",
    tag = "databases",
    responses(
        (status = 200, description = "数据库配置列表", body = Vec<DatabaseOut>),
        (status = 401, description = "未认证", body = ErrorResponse)
    )
)]
pub async fn list_databases(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<DatabaseOut>>, AppError> {
    let data = state.database_service().list(&user).await?;
    Ok(Json(data))
}

/// 创建数据库配置
#[utoipa::path(
    post,
    path = "/api/databases",
    tag = "databases",
    request_body = CreateDatabaseIn,
    responses(
        (status = 200, description = "数据库配置已创建", body = DatabaseOut),
        (status = 400, description = "参数校验失败", body = ErrorResponse),
        (status = 409, description = "名称已存在", body = ErrorResponse)
    )
)]
pub async fn create_database(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(req): ValidatedJson<CreateDatabaseIn>,
) -> Result<Json<DatabaseOut>, AppError> {
    let data = state.database_service().create(&user, req).await?;
    Ok(Json(data))
}

/// 根据 ID 获取数据库配置
#[utoipa::path(
    get,
    path = "/api/databases/{id}",
    tag = "databases",
    params(
        ("id" = i64, Path, description = "数据库配置 ID")
    ),
    responses(
        (status = 200, description = "数据库配置详情", body = DatabaseOut),
        (status = 404, description = "数据库配置未找到", body = ErrorResponse)
    )
)]
pub async fn get_database(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(id): IdPath,
) -> Result<Json<DatabaseOut>, AppError> {
    let data = state.database_service().get(&user, id).await?;
    Ok(Json(data))
}

/// 更新数据库配置（至少提供一个字段）
#[utoipa::path(
    put,
    path = "/api/databases/{id}",
    tag = "databases",
    params(
        ("id" = i64, Path, description = "数据库配置 ID")
    ),
    request_body = UpdateDatabaseIn,
    responses(
        (status = 200, description = "数据库配置已更新", body = DatabaseOut),
        (status = 400, description = "参数校验失败", body = ErrorResponse),
        (status = 404, description = "数据库配置未找到", body = ErrorResponse),
        (status = 409, description = "名称已存在", body = ErrorResponse)
    )
)]
pub async fn update_database(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(id): IdPath,
    ValidatedJson(req): ValidatedJson<UpdateDatabaseIn>,
) -> Result<Json<DatabaseOut>, AppError> {
    let data = state.database_service().update(&user, id, req).await?;
    Ok(Json(data))
}

/// 删除数据库配置
#[utoipa::path(
    delete,
    path = "/api/databases/{id}",
    tag = "databases",
    params(
        ("id" = i64, Path, description = "数据库配置 ID")
    ),
    responses(
        (status = 200, description = "数据库配置已删除", body = DeletedOut),
        (status = 404, description = "数据库配置未找到", body = ErrorResponse)
    )
)]
pub async fn delete_database(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    IdPath(id): IdPath,
) -> Result<Json<DeletedOut>, AppError> {
    let data = state.database_service().delete(&user, id).await?;
    Ok(Json(data))
}
