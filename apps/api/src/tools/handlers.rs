use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::state::AppState;
use crate::tools::cover_letter::generate_cover_letter;
use crate::tools::scraper::{scrape_posting, JobPosting, ScrapeError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterToolRequest {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub job_posting: String,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    #[serde(default)]
    pub url: String,
}

impl From<ScrapeError> for AppError {
    fn from(e: ScrapeError) -> Self {
        match e {
            ScrapeError::InvalidUrl(_) => AppError::Validation(e.to_string()),
            ScrapeError::Fetch(_) | ScrapeError::Status(_) => AppError::Upstream(e.to_string()),
            ScrapeError::Extract(inner) => AppError::Llm(format!("posting extraction failed: {inner}")),
        }
    }
}

/// POST /api/tools/cover-letter
/// Returns the generated letter as a JSON string.
pub async fn handle_generate_cover_letter(
    State(state): State<AppState>,
    Json(req): Json<CoverLetterToolRequest>,
) -> Result<Json<String>, AppError> {
    let letter = generate_cover_letter(
        state.llm.as_ref(),
        &req.company,
        &req.job_posting,
        state.candidate_profile.as_deref(),
    )
    .await?;
    Ok(Json(letter))
}

/// POST /api/tools/scrape-posting
pub async fn handle_scrape_posting(
    State(state): State<AppState>,
    Json(req): Json<ScrapeRequest>,
) -> Result<Json<JobPosting>, AppError> {
    let posting = scrape_posting(&state.http, state.llm.as_ref(), &req.url).await?;
    Ok(Json(posting))
}
