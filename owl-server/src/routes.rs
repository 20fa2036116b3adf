//! 路由模块

use axum::{
    middleware,
    routing::{get, post, put},
    Extension, Router,
};

use common::middleware::auth_middleware;
use common::models::FileKind;

use crate::handlers::{databases, files, health, query};
use crate::state::AppState;

/// 创建全部 API 路由；除健康检查外均需认证
pub fn router() -> Router<AppState> {
    let authenticated = Router::new()
        .merge(database_routes())
        .merge(file_routes("/api/scripts", FileKind::Script))
        .merge(file_routes("/api/macrofiles", FileKind::MacroFile))
        .route_layer(middleware::from_fn(auth_middleware));

    Router::new()
        .route("/api/health", get(health::health_check))
        .merge(authenticated)
}

fn database_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/databases",
            get(databases::list_databases).post(databases::create_database),
        )
        .route("/api/databases/run", post(query::run_query))
        .route(
            "/api/databases/{id}",
            get(databases::get_database)
                .put(databases::update_database)
                .delete(databases::delete_database),
        )
}

/// 脚本与宏文件共用同一组路由，通过 Extension 注入文件类型
fn file_routes(prefix: &str, kind: FileKind) -> Router<AppState> {
    Router::new()
        .route(prefix, get(files::list_files).post(files::create_file))
        .route(&format!("{prefix}/upload"), post(files::upload_file))
        .route(
            &format!("{prefix}/{{id}}"),
            get(files::get_file)
                .put(files::update_file)
                .delete(files::delete_file),
        )
        .route(&format!("{prefix}/{{id}}/exists"), get(files::file_exists))
        .route(&format!("{prefix}/{{id}}/rename"), put(files::rename_file))
        .route(
            &format!("{prefix}/{{id}}/content"),
            get(files::get_content).put(files::save_content),
        )
        .layer(Extension(kind))
}
