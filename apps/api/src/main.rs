mod applications;
mod config;
mod db;
mod documents;
mod errors;
mod files;
mod llm_client;
mod models;
mod routes;
mod state;
mod tools;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::documents::SofficeConverter;
use crate::files::FileDirectory;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tracker API v{}", env!("CARGO_PKG_VERSION"));

    // Working directory for templates, resumes and transcripts
    let files = FileDirectory::new(&config.files_dir);
    files
        .ensure_exists()
        .await
        .with_context(|| format!("cannot create {}", config.files_dir.display()))?;
    info!("File directory: {}", config.files_dir.display());

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, config.db_max_connections).await?;
    ensure_schema(&db).await?;

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())
        .context("failed to build LLM HTTP client")?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let candidate_profile = load_candidate_profile(&config).await;

    let converter = SofficeConverter::new(config.soffice_bin.clone(), config.conversion_timeout);
    info!(
        "Converter: {} (timeout {}s)",
        config.soffice_bin,
        config.conversion_timeout.as_secs()
    );

    // Build app state
    let state = AppState {
        db,
        llm: Arc::new(llm),
        http: reqwest::Client::new(),
        converter: Arc::new(converter),
        files,
        config: config.clone(),
        candidate_profile,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Reads the optional candidate profile. A configured but unreadable file is logged, not fatal.
async fn load_candidate_profile(config: &Config) -> Option<String> {
    let path = config.candidate_profile_path.as_ref()?;
    match tokio::fs::read_to_string(path).await {
        Ok(profile) => {
            info!("Loaded candidate profile from {}", path.display());
            Some(profile)
        }
        Err(e) => {
            warn!("Cannot read candidate profile {}: {e}", path.display());
            None
        }
    }
}
