//! Category suggestion handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};
use ledgerlight_core::{BankTransaction, CategorizationResult, CategoryAssignment};
use ledgerlight_import::similar;

#[derive(Debug, Deserialize)]
pub struct SuggestRequest {
    pub description: String,
    pub amount: f64,
}

/// POST /api/categorize/suggest
pub async fn suggest_category(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SuggestRequest>,
) -> Result<Json<CategorizationResult>, AppError> {
    let mut engine = state.engine.lock().await;
    let result = engine.suggest(&req.description, req.amount);
    engine.flush();
    Ok(Json(result))
}

/// POST /api/categorize/transaction - Category pair plus income/expense
pub async fn categorize_transaction(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SuggestRequest>,
) -> Result<Json<CategoryAssignment>, AppError> {
    let mut engine = state.engine.lock().await;
    let assignment = engine.categorize_transaction(&req.description, req.amount);
    engine.flush();
    Ok(Json(assignment))
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub description: String,
    pub category: String,
    pub subcategory: String,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub confidence: f64,
}

/// POST /api/categorize/score
pub async fn score_category(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    let engine = state.engine.lock().await;
    let confidence = engine.score(&req.description, &req.category, &req.subcategory);
    Ok(Json(ScoreResponse { confidence }))
}

#[derive(Debug, Deserialize)]
pub struct SimilarRequest {
    pub source: BankTransaction,
    pub transactions: Vec<BankTransaction>,
}

/// POST /api/transactions/similar
pub async fn find_similar(
    Json(req): Json<SimilarRequest>,
) -> Result<Json<Vec<BankTransaction>>, AppError> {
    let matches = similar::find_similar(&req.source.description, &req.transactions)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(matches))
}

#[derive(Debug, Serialize)]
pub struct ApplySimilarResponse {
    pub transactions: Vec<BankTransaction>,
    pub updated: usize,
}

/// POST /api/transactions/apply-similar - Copy the source's category onto matches
pub async fn apply_similar(
    Json(req): Json<SimilarRequest>,
) -> Result<Json<ApplySimilarResponse>, AppError> {
    let (transactions, updated) = similar::apply_category_to_similar(&req.source, req.transactions);
    Ok(Json(ApplySimilarResponse {
        transactions,
        updated,
    }))
}
