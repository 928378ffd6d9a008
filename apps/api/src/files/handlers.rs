use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::files::{FileCategory, StoredFile, UploadKind};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    #[serde(flatten)]
    pub file: StoredFile,
    pub status: &'static str,
    #[serde(rename = "type")]
    pub content_type: String,
}

struct Upload {
    file_name: String,
    content_type: String,
    bytes: bytes::Bytes,
}

/// Pulls the first part named `field` out of the form. Other parts are skipped.
async fn read_field(multipart: &mut Multipart, field: &str) -> Result<Upload, AppError> {
    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        if part.name() != Some(field) {
            continue;
        }
        let file_name = part
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation(format!("field '{field}' has no file name")))?;
        let content_type = part
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = part
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read '{field}': {e}")))?;
        return Ok(Upload {
            file_name,
            content_type,
            bytes,
        });
    }
    Err(AppError::Validation(format!("missing multipart field '{field}'")))
}

async fn save_upload(
    state: &AppState,
    multipart: &mut Multipart,
    field: &str,
    kind: UploadKind,
    id: Option<&str>,
) -> Result<Json<UploadResponse>, AppError> {
    let upload = read_field(multipart, field).await?;
    let file = state
        .files
        .store_upload(kind, id, &upload.file_name, &upload.bytes)
        .await?;
    Ok(Json(UploadResponse {
        file,
        status: "done",
        content_type: upload.content_type,
    }))
}

/// POST /api/pdf/upload-resume?id=
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Query(q): Query<IdQuery>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    save_upload(&state, &mut multipart, "resume-file", UploadKind::Resume, q.id.as_deref()).await
}

/// POST /api/pdf/upload-cover-letter-template
pub async fn handle_upload_template(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    save_upload(
        &state,
        &mut multipart,
        "cover-letter-template",
        UploadKind::Template,
        None,
    )
    .await
}

/// POST /api/pdf/upload-other-files?id=
pub async fn handle_upload_other(
    State(state): State<AppState>,
    Query(q): Query<IdQuery>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    save_upload(&state, &mut multipart, "other-files", UploadKind::Other, q.id.as_deref()).await
}

/// GET /api/pdf/resume-files
pub async fn handle_list_resumes(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredFile>>, AppError> {
    Ok(Json(state.files.list(FileCategory::Resumes).await?))
}

/// GET /api/pdf/cover-letter-template
pub async fn handle_list_template(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredFile>>, AppError> {
    Ok(Json(state.files.list(FileCategory::Template).await?))
}

/// GET /api/pdf/other-files
pub async fn handle_list_other(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredFile>>, AppError> {
    Ok(Json(state.files.list(FileCategory::Other).await?))
}

/// DELETE /api/pdf/delete-file?id=<stored name>
pub async fn handle_delete_file(
    State(state): State<AppState>,
    Query(q): Query<IdQuery>,
) -> Result<StatusCode, AppError> {
    let name = q
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::Validation("id is required".to_string()))?;
    state.files.delete(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}
