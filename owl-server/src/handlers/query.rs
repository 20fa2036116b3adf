//! SQL 执行端点

use axum::{extract::State, Json};

use common::errors::AppError;
use common::extract::{ValidatedJson, ValidatedQuery};
use common::middleware::AuthenticatedUser;
use common::models::{RunIn, RunOut, RunQuery};
use common::response::ErrorResponse;

use crate::state::AppState;

/// 执行 SQL 语句
///
/// SELECT 返回分页数据、列名与总行数；INSERT/UPDATE/DELETE 返回受影响行数。
#[utoipa::path(
    post,
    path = "/api/databases/run",
    tag = "query",
    params(RunQuery),
    request_body = RunIn,
    responses(
        (status = 200, description = "执行结果", body = RunOut),
        (status = 400, description = "参数校验失败", body = ErrorResponse),
        (status = 404, description = "目标数据库无法解析", body = ErrorResponse),
        (status = 500, description = "SQL 执行失败", body = ErrorResponse),
        (status = 503, description = "连接池已耗尽", body = ErrorResponse)
    )
)]
pub async fn run_query(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedQuery(params): ValidatedQuery<RunQuery>,
    ValidatedJson(req): ValidatedJson<RunIn>,
) -> Result<Json<RunOut>, AppError> {
    let data = state.query_service().run(&user, params, req).await?;
    Ok(Json(data))
}
