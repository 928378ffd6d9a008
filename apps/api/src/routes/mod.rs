pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::applications::handlers as applications;
use crate::documents::handlers as documents;
use crate::files::handlers as files;
use crate::state::AppState;
use crate::tools::handlers as tools;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    let pdf = Router::new()
        .route("/upload-resume", post(files::handle_upload_resume))
        .route(
            "/upload-cover-letter-template",
            post(files::handle_upload_template),
        )
        .route("/upload-other-files", post(files::handle_upload_other))
        .route("/resume-files", get(files::handle_list_resumes))
        .route("/cover-letter-template", get(files::handle_list_template))
        .route("/other-files", get(files::handle_list_other))
        .route("/delete-file", delete(files::handle_delete_file))
        .route("/file-cover-letter", post(documents::handle_cover_letter_file))
        .route("/merged", post(documents::handle_merged))
        .layer(DefaultBodyLimit::max(upload_limit));

    let applications = Router::new()
        .route(
            "/",
            get(applications::handle_list).post(applications::handle_create),
        )
        .route(
            "/:id",
            get(applications::handle_get)
                .put(applications::handle_update)
                .delete(applications::handle_delete),
        )
        .route(
            "/:id/cover-letter",
            get(applications::handle_get_cover_letter).post(applications::handle_save_cover_letter),
        );

    let tools = Router::new()
        .route("/cover-letter", post(tools::handle_generate_cover_letter))
        .route("/scrape-posting", post(tools::handle_scrape_posting));

    Router::new()
        .route("/health", get(health::health_handler))
        .nest("/api/pdf", pdf)
        .nest("/api/applications", applications)
        .nest("/api/tools", tools)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;
    use crate::documents::converter::pdf_output_path;
    use crate::documents::odt::fixture_odt;
    use crate::documents::pdf::{fixture_pdf, page_markers};
    use crate::documents::{Converter, DocumentError, TEMPLATE_FILE_NAME};
    use crate::llm_client::{LlmError, TextGenerator};

    struct PdfWriter;

    #[async_trait]
    impl Converter for PdfWriter {
        async fn convert_to_pdf(&self, input: &Path) -> Result<PathBuf, DocumentError> {
            let output = pdf_output_path(input);
            tokio::fs::write(&output, fixture_pdf(&["R1"])).await?;
            Ok(output)
        }
    }

    struct Echo;

    #[async_trait]
    impl TextGenerator for Echo {
        async fn generate_text(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
            Ok("A letter.".to_string())
        }
    }

    fn app(dir: &TempDir) -> Router {
        let state = AppState::for_tests(dir.path().to_path_buf(), Arc::new(Echo), Arc::new(PdfWriter));
        build_router(state)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_upload_then_list_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"resume-file\"; filename=\"cv.odt\"\r\n\
             Content-Type: application/vnd.oasis.opendocument.text\r\n\r\nresume-bytes\r\n--{boundary}--\r\n"
        );
        let request = Request::post("/api/pdf/upload-resume?id=42")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = app(&dir).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let uploaded = body_json(response).await;
        assert_eq!(uploaded["name"], "resume-file-42.odt");
        assert_eq!(uploaded["status"], "done");
        assert_eq!(uploaded["type"], "application/vnd.oasis.opendocument.text");
        assert_eq!(
            std::fs::read(dir.path().join("resume-file-42.odt")).unwrap(),
            b"resume-bytes"
        );

        let response = app(&dir)
            .oneshot(Request::get("/api/pdf/resume-files").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let listed = body_json(response).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
        assert_eq!(listed[0]["uid"], "resume-file-42.odt");
    }

    #[tokio::test]
    async fn test_upload_without_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let body = "--B\r\nContent-Disposition: form-data; name=\"other-files\"; filename=\"a.pdf\"\r\n\r\nx\r\n--B--\r\n";
        let request = Request::post("/api/pdf/upload-other-files")
            .header(header::CONTENT_TYPE, "multipart/form-data; boundary=B")
            .body(Body::from(body))
            .unwrap();
        let response = app(&dir).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::delete("/api/pdf/delete-file?id=nope.pdf")
            .body(Body::empty())
            .unwrap();
        let response = app(&dir).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_file_cover_letter_returns_rendered_odt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(TEMPLATE_FILE_NAME),
            fixture_odt("<office:text><text:p>##COMPANY##</text:p></office:text>"),
        )
        .unwrap();

        let request = json_request(
            "POST",
            "/api/pdf/file-cover-letter",
            json!({ "id": 3, "email": "a@b.c", "company": "Acme", "content": "Hi" }),
        );
        let response = app(&dir).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            documents::ODT_CONTENT_TYPE
        );
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Cover Letter.odt\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_file_cover_letter_requires_every_field() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(TEMPLATE_FILE_NAME),
            fixture_odt("<office:text><text:p>##CONTENT##</text:p></office:text>"),
        )
        .unwrap();

        let request = json_request(
            "POST",
            "/api/pdf/file-cover-letter",
            json!({ "id": 3, "company": "Acme", "content": " " }),
        );
        let response = app(&dir).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let message = body_json(response).await["error"]["message"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(message.contains("email, content"), "{message}");
    }

    #[tokio::test]
    async fn test_merged_with_missing_fields_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let request = json_request(
            "POST",
            "/api/pdf/merged",
            json!({ "coverletter": true, "email": "a@b.c" }),
        );
        let response = app(&dir).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let message = body_json(response).await["error"]["message"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(message.contains("company, content"));
    }

    #[tokio::test]
    async fn test_merged_returns_pdf_and_leaves_directory_clean() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("resume-file-1.odt"), b"odt").unwrap();
        std::fs::write(dir.path().join("Transcript-1.pdf"), fixture_pdf(&["T1"])).unwrap();

        let request = json_request("POST", "/api/pdf/merged", json!({ "coverletter": false }));
        let response = app(&dir).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(page_markers(&bytes), vec!["R1", "T1"]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn test_merged_without_transcript_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("resume-file-1.odt"), b"odt").unwrap();
        let request = json_request("POST", "/api/pdf/merged", json!({}));
        let response = app(&dir).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"]["code"], "FILE_MISSING");
    }

    #[tokio::test]
    async fn test_cover_letter_tool() {
        let dir = tempfile::tempdir().unwrap();
        let request = json_request(
            "POST",
            "/api/tools/cover-letter",
            json!({ "company": "Acme", "jobPosting": "Build things" }),
        );
        let response = app(&dir).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!("A letter."));

        let request = json_request("POST", "/api/tools/cover-letter", json!({ "company": "Acme" }));
        let response = app(&dir).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_scrape_with_invalid_url_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let request = json_request("POST", "/api/tools/scrape-posting", json!({ "url": "nope" }));
        let response = app(&dir).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
