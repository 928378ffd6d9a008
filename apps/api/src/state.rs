use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::documents::Converter;
use crate::files::FileDirectory;
use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Cover letter and posting extraction. Default: `LlmClient`.
    pub llm: Arc<dyn TextGenerator>,
    /// Plain client for fetching job postings; separate from the LLM client's.
    pub http: reqwest::Client,
    /// ODT to PDF conversion. Default: `SofficeConverter`.
    pub converter: Arc<dyn Converter>,
    pub files: FileDirectory,
    pub config: Config,
    /// Candidate background folded into cover letter prompts, when configured.
    pub candidate_profile: Option<String>,
}

#[cfg(test)]
impl AppState {
    /// State for router tests. The pool connects lazily, so nothing here touches Postgres
    /// unless a test hits an application route.
    pub fn for_tests(
        files_dir: std::path::PathBuf,
        llm: Arc<dyn TextGenerator>,
        converter: Arc<dyn Converter>,
    ) -> Self {
        let config = Config::for_tests(files_dir.clone());
        let db = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy(&config.database_url)
            .unwrap();
        AppState {
            db,
            llm,
            http: reqwest::Client::new(),
            converter,
            files: FileDirectory::new(files_dir),
            config,
            candidate_profile: None,
        }
    }
}
