//! Static reference data

use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;
use ledgerlight_core::CategoryGroup;
use ledgerlight_import::{bank_formats, BankFormat};

/// GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// GET /api/bank-formats - Registered CSV layouts
pub async fn list_bank_formats() -> Json<Vec<BankFormat>> {
    Json(bank_formats().to_vec())
}

/// GET /api/categories - Category catalog in fallback order
pub async fn list_categories(State(state): State<Arc<AppState>>) -> Json<Vec<CategoryGroup>> {
    let engine = state.engine.lock().await;
    Json(engine.catalog().groups().to_vec())
}
