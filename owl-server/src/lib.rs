//! owl 服务
//!
//! 提供以下功能：
//! - 数据库配置的增删改查
//! - 脚本与宏文件的管理（上传、重命名、内容读写）
//! - 在目标数据库上执行 SQL，支持分页与语句类型识别

pub mod executor;
pub mod handlers;
pub mod pool_manager;
pub mod routes;
pub mod row;
pub mod service;
pub mod state;
pub mod storage;
pub mod store;

use axum::{middleware, routing::get, Json, Router};
use common::middleware::request_id_middleware;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub use state::AppState;

pub const SERVICE_NAME: &str = "owl-server";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "owl 服务 API",
        version = "0.1.0",
        description = "数据库配置、脚本与宏文件管理及 SQL 执行服务"
    ),
    paths(
        handlers::health::health_check,
        handlers::databases::list_databases,
        handlers::databases::create_database,
        handlers::databases::get_database,
        handlers::databases::update_database,
        handlers::databases::delete_database,
        handlers::query::run_query,
        handlers::files::list_files,
        handlers::files::create_file,
        handlers::files::upload_file,
        handlers::files::get_file,
        handlers::files::update_file,
        handlers::files::delete_file,
        handlers::files::file_exists,
        handlers::files::rename_file,
        handlers::files::get_content,
        handlers::files::save_content,
    ),
    components(schemas(
        common::models::DatabaseOut,
        common::models::UserOut,
        common::models::CreateDatabaseIn,
        common::models::UpdateDatabaseIn,
        common::models::FileOut,
        common::models::FileContentOut,
        common::models::ExistsOut,
        common::models::DeletedOut,
        common::models::CreateFileIn,
        common::models::UpdateFileIn,
        common::models::RenameFileIn,
        common::models::UpdateContentIn,
        common::models::RunIn,
        common::models::RunOut,
        common::models::StatementType,
        common::response::ErrorResponse,
        handlers::files::UploadForm,
        handlers::health::HealthResponse,
    )),
    tags(
        (name = "databases", description = "数据库配置管理端点"),
        (name = "query", description = "SQL 执行端点"),
        (name = "files", description = "脚本与宏文件端点"),
        (name = "health", description = "健康检查端点")
    )
)]
pub struct ApiDoc;

/// 组装完整的应用路由
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::router())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
