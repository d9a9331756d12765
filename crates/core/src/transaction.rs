use serde::{Deserialize, Serialize};

use super::category::{TransactionKind, ESSENTIALS, MISCELLANEOUS};
use super::period::BudgetMonth;

/// One parsed CSV row, valid or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankTransaction {
    pub id: String,
    /// ISO `YYYY-MM-DD` once valid; raw text otherwise.
    pub transaction_date: String,
    pub description: String,
    /// Signed: expenses negative, income positive.
    pub amount: f64,
    pub balance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub category: String,
    pub subcategory: String,
    pub budget_month: BudgetMonth,
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation_errors: Vec<String>,
    #[serde(default)]
    pub is_duplicate: bool,
}

impl BankTransaction {
    /// An invalid row kept for visibility. Failed attributes carry
    /// placeholders, category is the miscellaneous bucket.
    pub fn invalid(
        id: String,
        transaction_date: String,
        description: String,
        amount: Option<f64>,
        validation_errors: Vec<String>,
    ) -> Self {
        Self {
            id,
            transaction_date,
            description,
            amount: amount.unwrap_or(0.0),
            balance: 0.0,
            reference: None,
            kind: None,
            category: ESSENTIALS.to_string(),
            subcategory: MISCELLANEOUS.to_string(),
            budget_month: BudgetMonth::Current,
            is_valid: false,
            validation_errors,
            is_duplicate: false,
        }
    }

    /// Valid and not flagged as a duplicate.
    pub fn is_importable(&self) -> bool {
        self.is_valid && !self.is_duplicate
    }

    pub fn direction(&self) -> TransactionKind {
        TransactionKind::from_amount(self.amount)
    }
}

/// Stable identity key: `date_description_amount`, whitespace runs as `_`.
pub fn derive_id(date: &str, description: &str, amount: f64) -> String {
    let raw = format!("{date}_{description}_{amount}");
    raw.split_whitespace().collect::<Vec<_>>().join("_")
}
