use ledgerlight_core::{
    normalize, CategorizationResult, CategoryAssignment, CategoryCatalog, TransactionKind,
    ESSENTIALS, MISCELLANEOUS,
};
use thiserror::Error;
use tracing::debug;

use crate::confidence;
use crate::learning::LearningCache;
use crate::merchants::MerchantMatcher;
use crate::store::PatternStore;

#[derive(Error, Debug, PartialEq)]
pub enum CategorizeError {
    #[error("Suggestion has no category")]
    EmptyCategory,
    #[error("Category '{0}' has no subcategories to fall back on")]
    NoSubcategory(String),
}

/// What the CSV parser needs from a categorizer.
pub trait Categorizer {
    fn suggest(&mut self, description: &str, amount: f64) -> CategorizationResult;
    fn catalog(&self) -> &CategoryCatalog;
}

const KEYWORD_CONFIDENCE: f64 = 0.7;
const SIGN_CONFIDENCE: f64 = 0.6;
const DEFAULT_CONFIDENCE: f64 = 0.5;

// Substring checks on the normalised description, expenses only.
const EXPENSE_KEYWORDS: &[(&[&str], &str, &str)] = &[
    (&["mortgage", "rent"], "Essentials", "Rent/Mortgage"),
    (&["grocery", "supermarket"], "Essentials", "Groceries"),
    (&["restaurant", "dining"], "Lifestyle", "Dining Out"),
];

fn expense_keyword(normalized_description: &str) -> Option<CategorizationResult> {
    EXPENSE_KEYWORDS
        .iter()
        .find(|(words, _, _)| words.iter().any(|w| normalized_description.contains(w)))
        .map(|(_, category, subcategory)| {
            CategorizationResult::new(category, subcategory, KEYWORD_CONFIDENCE)
        })
}

/// Learned corrections first, then the merchant table, then amount and
/// keyword heuristics.
pub struct CategorizationEngine<S: PatternStore> {
    cache: LearningCache<S>,
    merchants: MerchantMatcher,
    catalog: CategoryCatalog,
}

impl<S: PatternStore> CategorizationEngine<S> {
    pub fn new(cache: LearningCache<S>, merchants: MerchantMatcher) -> Self {
        Self {
            cache,
            merchants,
            catalog: CategoryCatalog::default(),
        }
    }

    pub fn with_catalog(mut self, catalog: CategoryCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    fn known(&mut self, description: &str) -> Option<CategorizationResult> {
        if let Some(hit) = self.cache.lookup(description) {
            debug!(pattern = %hit.pattern, "Learned pattern hit");
            return Some(CategorizationResult::new(
                &hit.category,
                &hit.subcategory,
                hit.confidence,
            ));
        }
        self.merchants.match_merchant(description)
    }

    pub fn suggest(&mut self, description: &str, amount: f64) -> CategorizationResult {
        if let Some(result) = self.known(description) {
            return result;
        }
        if amount > 0.0 {
            return CategorizationResult::new("Income", "Salary", SIGN_CONFIDENCE);
        }
        if amount < 0.0 {
            if let Some(result) = expense_keyword(&normalize(description)) {
                return result;
            }
        }
        if amount >= 0.0 {
            CategorizationResult::new("Income", "Salary", DEFAULT_CONFIDENCE)
        } else {
            CategorizationResult::new("Lifestyle", "Shopping", DEFAULT_CONFIDENCE)
        }
    }

    /// Same precedence as [`suggest`](Self::suggest) but unmatched rows land
    /// in `Other/Uncategorized` or `Income/Other Income`, and the result
    /// carries the direction instead of a confidence.
    pub fn categorize_transaction(&mut self, description: &str, amount: f64) -> CategoryAssignment {
        let kind = TransactionKind::from_amount(amount);
        let found = self.known(description).or_else(|| {
            if amount < 0.0 {
                expense_keyword(&normalize(description))
            } else {
                None
            }
        });
        let (category, subcategory) = match found {
            Some(r) => (r.category, r.subcategory),
            None if kind == TransactionKind::Income => {
                ("Income".to_string(), "Other Income".to_string())
            }
            None => ("Other".to_string(), "Uncategorized".to_string()),
        };
        CategoryAssignment {
            category,
            subcategory,
            kind,
        }
    }

    /// Feeds a user correction into the learning cache. Returns whether the
    /// cache changed.
    pub fn learn_from_correction(
        &mut self,
        description: &str,
        original_category: &str,
        original_subcategory: &str,
        corrected_category: &str,
        corrected_subcategory: &str,
    ) -> bool {
        self.cache.record(
            description,
            original_category,
            original_subcategory,
            corrected_category,
            corrected_subcategory,
        )
    }

    pub fn score(&self, description: &str, category: &str, subcategory: &str) -> f64 {
        confidence::score(description, category, subcategory, &self.merchants, &self.cache)
    }

    pub fn flush(&mut self) -> bool {
        self.cache.flush()
    }

    pub fn cache(&self) -> &LearningCache<S> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut LearningCache<S> {
        &mut self.cache
    }

    pub fn merchants(&self) -> &MerchantMatcher {
        &self.merchants
    }

    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }
}

impl<S: PatternStore> Categorizer for CategorizationEngine<S> {
    fn suggest(&mut self, description: &str, amount: f64) -> CategorizationResult {
        CategorizationEngine::suggest(self, description, amount)
    }

    fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }
}

/// Checks a suggestion before it is written onto a row. A blank
/// subcategory is filled from the catalog.
pub fn resolve_category(
    catalog: &CategoryCatalog,
    result: &CategorizationResult,
) -> Result<(String, String), CategorizeError> {
    let category = result.category.trim();
    if category.is_empty() {
        return Err(CategorizeError::EmptyCategory);
    }
    let subcategory = result.subcategory.trim();
    if !subcategory.is_empty() {
        return Ok((category.to_string(), subcategory.to_string()));
    }
    catalog
        .first_subcategory(category)
        .map(|sub| (category.to_string(), sub.to_string()))
        .ok_or_else(|| CategorizeError::NoSubcategory(category.to_string()))
}

/// Category used when a suggestion cannot be resolved.
pub fn fallback_category(catalog: &CategoryCatalog) -> (String, String) {
    let subcategory = catalog.first_subcategory(ESSENTIALS).unwrap_or(MISCELLANEOUS);
    (ESSENTIALS.to_string(), subcategory.to_string())
}
