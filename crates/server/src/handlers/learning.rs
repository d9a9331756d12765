//! Learning cache handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};
use ledgerlight_import::LearnedPattern;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionRequest {
    pub description: String,
    pub original_category: String,
    pub original_subcategory: String,
    pub corrected_category: String,
    pub corrected_subcategory: String,
}

#[derive(Debug, Serialize)]
pub struct CorrectionResponse {
    pub learned: bool,
}

/// POST /api/learning/corrections - Record a user recategorisation
pub async fn record_correction(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CorrectionRequest>,
) -> Result<Json<CorrectionResponse>, AppError> {
    if req.corrected_category.trim().is_empty() || req.corrected_subcategory.trim().is_empty() {
        return Err(AppError::bad_request("Corrected category and subcategory are required"));
    }
    let mut engine = state.engine.lock().await;
    let learned = engine.learn_from_correction(
        &req.description,
        &req.original_category,
        &req.original_subcategory,
        &req.corrected_category,
        &req.corrected_subcategory,
    );
    Ok(Json(CorrectionResponse { learned }))
}

/// GET /api/learning/patterns
pub async fn list_patterns(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LearnedPattern>>, AppError> {
    let engine = state.engine.lock().await;
    Ok(Json(engine.cache().patterns().to_vec()))
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: usize,
}

/// DELETE /api/learning/patterns
pub async fn clear_patterns(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ClearResponse>, AppError> {
    let mut engine = state.engine.lock().await;
    let cleared = engine.cache().len();
    engine.cache_mut().clear()?;
    Ok(Json(ClearResponse { cleared }))
}
