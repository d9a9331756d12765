//! CSV import handlers
//!
//! Nothing is stored server-side between preview and confirm: the client
//! holds the previewed rows, edits them, and sends them back.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AppError, AppState};
use ledgerlight_core::BankTransaction;
use ledgerlight_import::{
    override_duplicate as set_duplicate, preview_import as run_preview, resolve_profile,
    to_import_records, ColumnMapping, ImportPreview, ImportRecord, ImportSummary,
};

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub csv: String,
    /// Registry name, `custom`, or `auto`. Defaults to the configured format.
    pub format: Option<String>,
    #[serde(default = "default_true")]
    pub has_header: bool,
    pub mapping: Option<ColumnMapping>,
    pub delimiter: Option<String>,
    pub date_format: Option<String>,
    /// Ids from earlier imports, used to flag duplicates.
    #[serde(default)]
    pub existing_ids: Vec<String>,
}

/// POST /api/import/preview - Parse, categorise and flag duplicates
pub async fn preview_import(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<ImportPreview>, AppError> {
    if req.csv.trim().is_empty() {
        return Err(AppError::bad_request("CSV content is empty"));
    }
    let format = req
        .format
        .as_deref()
        .unwrap_or(&state.config.default_format);
    let mut profile = resolve_profile(format, req.has_header, req.mapping, &req.csv)
        .map_err(|e| AppError::bad_request(&e.to_string()))?;
    if let Some(delimiter) = req.delimiter {
        profile.delimiter = delimiter;
    }
    if let Some(date_format) = req.date_format {
        profile.date_format = date_format;
    }
    let existing: HashSet<String> = req.existing_ids.into_iter().collect();

    let mut engine = state.engine.lock().await;
    let preview = run_preview(&mut *engine, &req.csv, &profile, &existing)
        .map_err(|e| AppError::bad_request(&e.to_string()))?;
    Ok(Json(preview))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub transactions: Vec<BankTransaction>,
    /// Date that `"current"` budget months resolve to. Defaults to today.
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    pub records: Vec<ImportRecord>,
    /// Invalid or duplicate rows left out of the batch.
    pub skipped: usize,
}

/// POST /api/import/confirm - Build the persistence batch
pub async fn confirm_import(
    Json(req): Json<ConfirmRequest>,
) -> Result<Json<ConfirmResponse>, AppError> {
    let today = req
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let records = to_import_records(&req.transactions, today);
    let skipped = req.transactions.len() - records.len();
    info!(records = records.len(), skipped, "Import batch prepared");
    Ok(Json(ConfirmResponse { records, skipped }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateOverrideRequest {
    pub transactions: Vec<BankTransaction>,
    pub id: String,
    pub duplicate: bool,
}

#[derive(Debug, Serialize)]
pub struct DuplicateOverrideResponse {
    pub transactions: Vec<BankTransaction>,
    pub summary: ImportSummary,
}

/// POST /api/import/duplicates - Keep or drop a flagged row
pub async fn override_duplicate(
    Json(mut req): Json<DuplicateOverrideRequest>,
) -> Result<Json<DuplicateOverrideResponse>, AppError> {
    if !set_duplicate(&mut req.transactions, &req.id, req.duplicate) {
        return Err(AppError::not_found(&format!("No transaction with id {}", req.id)));
    }
    let summary = ImportSummary::from_rows(&req.transactions, 0);
    Ok(Json(DuplicateOverrideResponse {
        transactions: req.transactions,
        summary,
    }))
}
