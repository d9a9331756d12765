use serde::{Deserialize, Serialize};
use std::fmt;

/// The engine's universal return shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizationResult {
    pub category: String,
    pub subcategory: String,
    /// Informational only (0.0–1.0); never used to choose a category.
    pub confidence: f64,
}

impl CategorizationResult {
    pub fn new(category: &str, subcategory: &str, confidence: f64) -> Self {
        Self {
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// Zero counts as income, matching the non-negative branch of the
    /// categorization defaults.
    pub fn from_amount(amount: f64) -> Self {
        if amount >= 0.0 {
            TransactionKind::Income
        } else {
            TransactionKind::Expense
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Income => write!(f, "income"),
            TransactionKind::Expense => write!(f, "expense"),
        }
    }
}

/// Category pair plus income/expense direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAssignment {
    pub category: String,
    pub subcategory: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

pub const ESSENTIALS: &str = "Essentials";
pub const MISCELLANEOUS: &str = "Miscellaneous";

pub const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Essentials",
        &[
            "Rent/Mortgage",
            "Groceries",
            "Utilities",
            "Council Tax",
            "Transport",
            "Insurance",
            "Phone & Internet",
            "Childcare",
            "Miscellaneous",
        ],
    ),
    (
        "Lifestyle",
        &[
            "Dining Out",
            "Shopping",
            "Entertainment",
            "Subscriptions",
            "Travel",
            "Health & Fitness",
            "Personal Care",
            "Gifts",
        ],
    ),
    (
        "Income",
        &["Salary", "Other Income", "Benefits", "Refunds", "Interest"],
    ),
    (
        "Savings",
        &["Emergency Fund", "Investments", "Pension", "Transfers"],
    ),
    ("Other", &["Uncategorized", "Fees", "Cash Withdrawal"]),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub name: String,
    pub subcategories: Vec<String>,
}

/// Category → subcategories table. Order is significant: the first
/// subcategory of a category is its fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCatalog {
    groups: Vec<CategoryGroup>,
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        Self::new(
            DEFAULT_CATEGORIES
                .iter()
                .map(|(name, subs)| CategoryGroup {
                    name: name.to_string(),
                    subcategories: subs.iter().map(|s| s.to_string()).collect(),
                })
                .collect(),
        )
    }
}

impl CategoryCatalog {
    pub fn new(groups: Vec<CategoryGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[CategoryGroup] {
        &self.groups
    }

    pub fn subcategories(&self, category: &str) -> Option<&[String]> {
        self.groups
            .iter()
            .find(|g| g.name == category)
            .map(|g| g.subcategories.as_slice())
    }

    pub fn first_subcategory(&self, category: &str) -> Option<&str> {
        self.subcategories(category)
            .and_then(|subs| subs.first())
            .map(String::as_str)
    }

    pub fn contains(&self, category: &str, subcategory: &str) -> bool {
        self.subcategories(category)
            .is_some_and(|subs| subs.iter().any(|s| s == subcategory))
    }
}
