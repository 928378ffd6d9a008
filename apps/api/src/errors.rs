use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::documents::DocumentError;
use crate::files::FileStoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    /// A third-party site we fetched from failed or was unreachable.
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("File error: {0}")]
    Files(#[from] FileStoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<crate::llm_client::LlmError> for AppError {
    fn from(e: crate::llm_client::LlmError) -> Self {
        AppError::Llm(e.to_string())
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Database(sqlx::Error::RowNotFound) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Record not found".to_string(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg.clone())
            }
            AppError::Document(e) => document_parts(e),
            AppError::Files(e) => match e {
                FileStoreError::MissingId | FileStoreError::InvalidName(_) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
                }
                FileStoreError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string()),
                FileStoreError::Io(io) => {
                    tracing::error!("File store error: {io}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "STORAGE_ERROR",
                        "A storage error occurred".to_string(),
                    )
                }
            },
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

fn document_parts(e: &DocumentError) -> (StatusCode, &'static str, String) {
    let (status, code) = match e {
        DocumentError::MissingFields(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        DocumentError::FileNotFound(_) | DocumentError::RequiredFileMissing(_) => {
            (StatusCode::NOT_FOUND, "FILE_MISSING")
        }
        DocumentError::TemplateRender(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TEMPLATE_ERROR"),
        DocumentError::ConversionProcess { .. } | DocumentError::ConversionOutputMissing(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "CONVERSION_ERROR")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "DOCUMENT_ERROR"),
    };
    if status.is_server_error() {
        tracing::error!("Document error: {e}");
    }
    (status, code, e.to_string())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::documents::TemplateError;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_missing_fields_is_bad_request() {
        let err = AppError::from(DocumentError::MissingFields(vec!["email", "content"]));
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "VALIDATION_ERROR");
        assert!(message.contains("email, content"));
    }

    #[test]
    fn test_missing_sources_are_not_found() {
        assert_eq!(
            status_of(DocumentError::RequiredFileMissing("transcript").into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(DocumentError::FileNotFound(PathBuf::from("a.odt")).into()),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_pipeline_failures_are_server_errors() {
        let template = AppError::from(DocumentError::TemplateRender(TemplateError::BodyMissing));
        assert_eq!(template.parts().1, "TEMPLATE_ERROR");

        let conversion = AppError::from(DocumentError::ConversionProcess {
            message: "boom".to_string(),
        });
        let (status, code, _) = conversion.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "CONVERSION_ERROR");
    }

    #[test]
    fn test_file_store_errors() {
        assert_eq!(
            status_of(FileStoreError::MissingId.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(FileStoreError::NotFound("x".to_string()).into()),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_upstream_is_bad_gateway() {
        assert_eq!(
            status_of(AppError::Upstream("timeout".to_string())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        assert_eq!(
            status_of(AppError::Database(sqlx::Error::RowNotFound)),
            StatusCode::NOT_FOUND
        );
    }
}
