use chrono::NaiveDate;
use ledgerlight_core::{budget_period, BankTransaction, TransactionKind};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The record shape the persistence API accepts in one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    pub date: String,
    pub description: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub subcategory: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub budget_month: u32,
    pub budget_year: i32,
    pub import_hash: String,
}

/// SHA-256 over date, description, amount and the bank reference when
/// there is one, as lowercase hex.
pub fn import_hash(date: &str, description: &str, amount: f64, reference: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(date.as_bytes());
    hasher.update(description.as_bytes());
    hasher.update(amount.to_be_bytes());
    if let Some(reference) = reference {
        hasher.update(reference.as_bytes());
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

impl ImportRecord {
    pub fn from_transaction(tx: &BankTransaction, today: NaiveDate) -> Self {
        let (budget_month, budget_year) = match tx.budget_month.month() {
            Some(month) => (month, budget_period(&tx.transaction_date, today).1),
            None => budget_period(&tx.transaction_date, today),
        };
        ImportRecord {
            date: tx.transaction_date.clone(),
            description: tx.description.clone(),
            amount: tx.amount,
            kind: tx.direction(),
            category: tx.category.clone(),
            subcategory: tx.subcategory.clone(),
            balance: Some(tx.balance),
            reference: tx.reference.clone(),
            budget_month,
            budget_year,
            import_hash: import_hash(
                &tx.transaction_date,
                &tx.description,
                tx.amount,
                tx.reference.as_deref(),
            ),
        }
    }
}

/// Importable rows only: valid and not flagged as duplicates.
pub fn to_import_records(transactions: &[BankTransaction], today: NaiveDate) -> Vec<ImportRecord> {
    transactions
        .iter()
        .filter(|tx| tx.is_importable())
        .map(|tx| ImportRecord::from_transaction(tx, today))
        .collect()
}
