use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::applications::repository;
use crate::applications::{ApplicationInput, CoverLetterInput};
use crate::errors::AppError;
use crate::models::application::ApplicationRow;
use crate::state::AppState;

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Application {id} not found"))
}

/// GET /api/applications
pub async fn handle_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<ApplicationRow>>, AppError> {
    Ok(Json(repository::list_applications(&state.db).await?))
}

/// POST /api/applications
pub async fn handle_create(
    State(state): State<AppState>,
    Json(input): Json<ApplicationInput>,
) -> Result<(StatusCode, Json<ApplicationRow>), AppError> {
    input.validate()?;
    let row = repository::create_application(&state.db, &input).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/applications/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApplicationRow>, AppError> {
    let row = repository::get_application(&state.db, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(row))
}

/// PUT /api/applications/:id
pub async fn handle_update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<ApplicationInput>,
) -> Result<Json<ApplicationRow>, AppError> {
    input.validate()?;
    let row = repository::update_application(&state.db, id, &input)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(row))
}

/// DELETE /api/applications/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !repository::delete_application(&state.db, id).await? {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/applications/:id/cover-letter
/// Returns an empty string when no letter has been saved.
pub async fn handle_get_cover_letter(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<String>, AppError> {
    let content = repository::get_cover_letter(&state.db, id).await?;
    Ok(Json(content.unwrap_or_default()))
}

/// POST /api/applications/:id/cover-letter
pub async fn handle_save_cover_letter(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<CoverLetterInput>,
) -> Result<StatusCode, AppError> {
    if input.content.trim().is_empty() {
        return Err(AppError::Validation("Content cannot be empty".to_string()));
    }
    if !repository::save_cover_letter(&state.db, id, &input.content).await? {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}
