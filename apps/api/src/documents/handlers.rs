use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::documents::merge::render_request;
use crate::documents::{merge_documents, render_cover_letter, MergeOptions};
use crate::documents::{DocumentError, TEMPLATE_FILE_NAME};
use crate::errors::AppError;
use crate::state::AppState;

pub const ODT_CONTENT_TYPE: &str = "application/vnd.oasis.opendocument.text";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Body of `POST /api/pdf/file-cover-letter`. Unknown fields (older clients send `id`) are ignored.
#[derive(Debug, Deserialize)]
pub struct CoverLetterFileRequest {
    pub email: Option<String>,
    pub company: Option<String>,
    pub content: Option<String>,
}

fn attachment(content_type: &'static str, file_name: &str, bytes: impl IntoResponse) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// POST /api/pdf/file-cover-letter
pub async fn handle_cover_letter_file(
    State(state): State<AppState>,
    Json(req): Json<CoverLetterFileRequest>,
) -> Result<Response, AppError> {
    let request = render_request(&req.email, &req.company, &req.content)?;
    let template = state.files.root().join(TEMPLATE_FILE_NAME);
    let bytes = render_cover_letter(&template, &request)
        .await
        .map_err(DocumentError::from)?;
    info!("Rendered cover letter for {} ({} bytes)", request.company, bytes.len());
    Ok(attachment(ODT_CONTENT_TYPE, "Cover Letter.odt", bytes))
}

/// POST /api/pdf/merged
pub async fn handle_merged(
    State(state): State<AppState>,
    Json(opts): Json<MergeOptions>,
) -> Result<Response, AppError> {
    let merged = merge_documents(state.files.root(), state.converter.as_ref(), &opts).await?;
    Ok(attachment(PDF_CONTENT_TYPE, "Merged.pdf", merged))
}
