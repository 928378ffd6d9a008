use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or a number does not parse.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Working directory holding the template, resumes, transcripts and other uploads.
    pub files_dir: PathBuf,
    pub soffice_bin: String,
    pub conversion_timeout: Duration,
    pub max_upload_bytes: usize,
    /// Optional plain-text candidate profile included in cover letter prompts.
    pub candidate_profile_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let max_upload_mb: usize = parse_env_or("MAX_UPLOAD_MB", 25)?;

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            db_max_connections: parse_env_or("DB_MAX_CONNECTIONS", 10)?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            files_dir: std::env::var("FILES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("templates")),
            soffice_bin: std::env::var("SOFFICE_BIN").unwrap_or_else(|_| "soffice".to_string()),
            conversion_timeout: Duration::from_secs(parse_env_or("CONVERSION_TIMEOUT_SECS", 120)?),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
            candidate_profile_path: std::env::var("CANDIDATE_PROFILE_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    parse_value(key, std::env::var(key).ok(), default)
}

fn parse_value<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{value}'")),
        _ => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration pointing at `files_dir`, for handler tests that never reach a database.
    pub fn for_tests(files_dir: PathBuf) -> Self {
        Config {
            database_url: "postgres://localhost/tracker_test".to_string(),
            db_max_connections: 1,
            anthropic_api_key: "test-key".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            files_dir,
            soffice_bin: "soffice".to_string(),
            conversion_timeout: Duration::from_secs(5),
            max_upload_bytes: 1024 * 1024,
            candidate_profile_path: None,
        }
    }
}
