//! Job posting extraction: fetch the page, reduce it to text, let the generator pull out fields.

use std::time::Duration;

use reqwest::Url;
use scraper::{Html, Node};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{generate_json, LlmError, TextGenerator};
use crate::tools::prompts::POSTING_EXTRACT_PROMPT_TEMPLATE;

pub const NOT_PROVIDED: &str = "Not provided";
/// Page text sent to the generator is cut to this many characters.
pub const MAX_PAGE_CHARS: usize = 20_000;
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Elements whose text never renders on the page.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid posting URL '{0}'")]
    InvalidUrl(String),

    #[error("failed to fetch posting: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("posting page returned status {0}")]
    Status(u16),

    #[error("posting extraction failed: {0}")]
    Extract(#[from] LlmError),
}

/// Fields as the generator returns them. Anything may be missing or null.
#[derive(Debug, Default, Deserialize)]
struct ExtractedFields {
    title: Option<String>,
    company: Option<String>,
    location: Option<String>,
    length: Option<String>,
    posting: Option<String>,
}

/// A scraped posting, shaped like an application record so the client can save it as-is.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub location: String,
    pub length: String,
    pub posting: String,
    pub url: String,
}

impl JobPosting {
    fn from_fields(fields: ExtractedFields, url: &str) -> Self {
        let or_default = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| NOT_PROVIDED.to_string())
        };
        JobPosting {
            title: or_default(fields.title),
            company: or_default(fields.company),
            location: or_default(fields.location),
            length: or_default(fields.length),
            posting: or_default(fields.posting),
            url: url.to_string(),
        }
    }
}

/// Accepts absolute http(s) URLs only.
pub fn parse_posting_url(raw: &str) -> Result<Url, ScrapeError> {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => Ok(url),
        _ => Err(ScrapeError::InvalidUrl(raw.to_string())),
    }
}

/// Reduces an HTML page to its visible text, entities decoded and whitespace collapsed.
/// The result is capped at `MAX_PAGE_CHARS` characters.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut chunks = Vec::new();
    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            matches!(ancestor.value(), Node::Element(e) if HIDDEN_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            chunks.extend(text.split_whitespace());
        }
    }
    chunks.join(" ").chars().take(MAX_PAGE_CHARS).collect()
}

pub async fn fetch_page_text(http: &reqwest::Client, url: &Url) -> Result<String, ScrapeError> {
    let response = http.get(url.clone()).timeout(FETCH_TIMEOUT).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ScrapeError::Status(status.as_u16()));
    }
    let html = response.text().await?;
    debug!("Fetched {url}: {} bytes of HTML", html.len());
    Ok(html_to_text(&html))
}

/// Asks the generator for the posting fields in `page_text`.
pub async fn extract_posting(
    llm: &dyn TextGenerator,
    url: &str,
    page_text: &str,
) -> Result<JobPosting, ScrapeError> {
    let prompt = POSTING_EXTRACT_PROMPT_TEMPLATE.replace("{page_text}", page_text);
    let fields: ExtractedFields = generate_json(llm, &prompt, JSON_ONLY_SYSTEM).await?;
    Ok(JobPosting::from_fields(fields, url))
}

pub async fn scrape_posting(
    http: &reqwest::Client,
    llm: &dyn TextGenerator,
    raw_url: &str,
) -> Result<JobPosting, ScrapeError> {
    let url = parse_posting_url(raw_url)?;
    let text = fetch_page_text(http, &url).await?;
    let posting = extract_posting(llm, raw_url.trim(), &text).await?;
    info!("Scraped posting '{}' at {} from {url}", posting.title, posting.company);
    Ok(posting)
}
