//! 脚本与宏文件端点
//!
//! 同一组处理函数同时服务 `/api/scripts` 与 `/api/macrofiles`，
//! 文件类型由路由层注入的 [`FileKind`] 决定。

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Extension, Json,
};
use utoipa::ToSchema;

use common::errors::AppError;
use common::extract::{IdPath, ValidatedJson};
use common::models::{
    CreateFileIn, DeletedOut, ExistsOut, FileContentOut, FileKind, FileOut, RenameFileIn,
    UpdateContentIn, UpdateFileIn,
};
use common::response::ErrorResponse;

use crate::service::FileServiceTrait;
use crate::state::AppState;

/// 上传表单使用的字段名
pub const UPLOAD_FIELD: &str = "file";

/// 文件上传表单
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    /// 文件内容，文件名即显示名称（须以 .sql 结尾）
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

/// 列出所有文件
#[utoipa::path(
    get,
    path = "/api/{kind}",
    tag = "files",
    params(
        ("kind" = String, Path, description = "scripts 或 macrofiles")
    ),
    responses(
        (status = 200, description = "文件列表", body = Vec<FileOut>)
    )
)]
pub async fn list_files(
    State(state): State<AppState>,
    Extension(kind): Extension<FileKind>,
) -> Result<Json<Vec<FileOut>>, AppError> {
    let data = state.file_service(kind).list().await?;
    Ok(Json(data))
}

/// 创建文件
#[utoipa::path(
    post,
    path = "/api/{kind}",
    tag = "files",
    params(
        ("kind" = String, Path, description = "scripts 或 macrofiles")
    ),
    request_body = CreateFileIn,
    responses(
        (status = 200, description = "文件已创建", body = FileOut),
        (status = 400, description = "参数校验失败", body = ErrorResponse)
    )
)]
pub async fn create_file(
    State(state): State<AppState>,
    Extension(kind): Extension<FileKind>,
    ValidatedJson(req): ValidatedJson<CreateFileIn>,
) -> Result<Json<FileOut>, AppError> {
    let data = state.file_service(kind).create(req).await?;
    Ok(Json(data))
}

/// 上传文件（multipart 字段 `file`）
#[utoipa::path(
    post,
    path = "/api/{kind}/upload",
    tag = "files",
    params(
        ("kind" = String, Path, description = "scripts 或 macrofiles")
    ),
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "文件已上传", body = FileOut),
        (status = 400, description = "参数校验失败", body = ErrorResponse)
    )
)]
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(kind): Extension<FileKind>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<FileOut>, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::field(UPLOAD_FIELD, e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::field(UPLOAD_FIELD, e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::field(UPLOAD_FIELD, "Uploaded file must have a file name"))?;
        let content = field
            .text()
            .await
            .map_err(|e| AppError::field(UPLOAD_FIELD, e.body_text()))?;

        let data = state.file_service(kind).upload(file_name, content).await?;
        return Ok(Json(data));
    }

    Err(AppError::field(UPLOAD_FIELD, "Missing multipart field 'file'"))
}

/// 根据 ID 获取文件
#[utoipa::path(
    get,
    path = "/api/{kind}/{id}",
    tag = "files",
    params(
        ("kind" = String, Path, description = "scripts 或 macrofiles"),
        ("id" = i64, Path, description = "文件 ID")
    ),
    responses(
        (status = 200, description = "文件详情", body = FileOut),
        (status = 404, description = "文件未找到", body = ErrorResponse)
    )
)]
pub async fn get_file(
    State(state): State<AppState>,
    Extension(kind): Extension<FileKind>,
    IdPath(id): IdPath,
) -> Result<Json<FileOut>, AppError> {
    let data = state.file_service(kind).get(id).await?;
    Ok(Json(data))
}

/// 更新文件名称和/或内容
#[utoipa::path(
    put,
    path = "/api/{kind}/{id}",
    tag = "files",
    params(
        ("kind" = String, Path, description = "scripts 或 macrofiles"),
        ("id" = i64, Path, description = "文件 ID")
    ),
    request_body = UpdateFileIn,
    responses(
        (status = 200, description = "文件已更新", body = FileOut),
        (status = 400, description = "参数校验失败", body = ErrorResponse),
        (status = 404, description = "文件未找到", body = ErrorResponse)
    )
)]
pub async fn update_file(
    State(state): State<AppState>,
    Extension(kind): Extension<FileKind>,
    IdPath(id): IdPath,
    ValidatedJson(req): ValidatedJson<UpdateFileIn>,
) -> Result<Json<FileOut>, AppError> {
    let data = state.file_service(kind).update(id, req).await?;
    Ok(Json(data))
}

/// 删除文件及其内容
#[utoipa::path(
    delete,
    path = "/api/{kind}/{id}",
    tag = "files",
    params(
        ("kind" = String, Path, description = "scripts 或 macrofiles"),
        ("id" = i64, Path, description = "文件 ID")
    ),
    responses(
        (status = 200, description = "文件已删除", body = DeletedOut),
        (status = 404, description = "文件未找到", body = ErrorResponse)
    )
)]
pub async fn delete_file(
    State(state): State<AppState>,
    Extension(kind): Extension<FileKind>,
    IdPath(id): IdPath,
) -> Result<Json<DeletedOut>, AppError> {
    let data = state.file_service(kind).delete(id).await?;
    Ok(Json(data))
}

/// 检查文件是否存在
#[utoipa::path(
    get,
    path = "/api/{kind}/{id}/exists",
    tag = "files",
    params(
        ("kind" = String, Path, description = "scripts 或 macrofiles"),
        ("id" = i64, Path, description = "文件 ID")
    ),
    responses(
        (status = 200, description = "是否存在", body = ExistsOut)
    )
)]
pub async fn file_exists(
    State(state): State<AppState>,
    Extension(kind): Extension<FileKind>,
    IdPath(id): IdPath,
) -> Result<Json<ExistsOut>, AppError> {
    let data = state.file_service(kind).exists(id).await?;
    Ok(Json(data))
}

/// 重命名文件
#[utoipa::path(
    put,
    path = "/api/{kind}/{id}/rename",
    tag = "files",
    params(
        ("kind" = String, Path, description = "scripts 或 macrofiles"),
        ("id" = i64, Path, description = "文件 ID")
    ),
    request_body = RenameFileIn,
    responses(
        (status = 200, description = "文件已重命名", body = FileOut),
        (status = 400, description = "参数校验失败", body = ErrorResponse),
        (status = 404, description = "文件未找到", body = ErrorResponse)
    )
)]
pub async fn rename_file(
    State(state): State<AppState>,
    Extension(kind): Extension<FileKind>,
    IdPath(id): IdPath,
    ValidatedJson(req): ValidatedJson<RenameFileIn>,
) -> Result<Json<FileOut>, AppError> {
    let data = state.file_service(kind).rename(id, req).await?;
    Ok(Json(data))
}

/// 读取文件内容
#[utoipa::path(
    get,
    path = "/api/{kind}/{id}/content",
    tag = "files",
    params(
        ("kind" = String, Path, description = "scripts 或 macrofiles"),
        ("id" = i64, Path, description = "文件 ID")
    ),
    responses(
        (status = 200, description = "文件内容", body = FileContentOut),
        (status = 404, description = "文件未找到", body = ErrorResponse)
    )
)]
pub async fn get_content(
    State(state): State<AppState>,
    Extension(kind): Extension<FileKind>,
    IdPath(id): IdPath,
) -> Result<Json<FileContentOut>, AppError> {
    let data = state.file_service(kind).content(id).await?;
    Ok(Json(data))
}

/// 保存文件内容
#[utoipa::path(
    put,
    path = "/api/{kind}/{id}/content",
    tag = "files",
    params(
        ("kind" = String, Path, description = "scripts 或 macrofiles"),
        ("id" = i64, Path, description = "文件 ID")
    ),
    request_body = UpdateContentIn,
    responses(
        (status = 200, description = "内容已保存", body = FileContentOut),
        (status = 404, description = "文件未找到", body = ErrorResponse)
    )
)]
pub async fn save_content(
    State(state): State<AppState>,
    Extension(kind): Extension<FileKind>,
    IdPath(id): IdPath,
    ValidatedJson(req): ValidatedJson<UpdateContentIn>,
) -> Result<Json<FileContentOut>, AppError> {
    let data = state.file_service(kind).save_content(id, req).await?;
    Ok(Json(data))
}
