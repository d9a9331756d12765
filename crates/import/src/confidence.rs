use crate::learning::LearningCache;
use crate::merchants::MerchantMatcher;
use crate::store::PatternStore;

pub const CONFIDENCE_FLOOR: f64 = 0.5;

/// How sure we are that `description` belongs to the given category pair.
///
/// Takes the best merchant mapping for that pair whose pattern hits, then
/// the best learned pattern for the same pair. Never below
/// [`CONFIDENCE_FLOOR`], never mutates the cache.
pub fn score<S: PatternStore>(
    description: &str,
    category: &str,
    subcategory: &str,
    merchants: &MerchantMatcher,
    cache: &LearningCache<S>,
) -> f64 {
    let mut best = merchants
        .confidence_for(description, category, subcategory)
        .unwrap_or(CONFIDENCE_FLOOR)
        .max(CONFIDENCE_FLOOR);

    for learned in cache.hits(description) {
        if learned.category == category && learned.subcategory == subcategory {
            best = best.max(learned.confidence);
        }
    }
    best.min(1.0)
}
