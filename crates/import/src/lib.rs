pub mod confidence;
pub mod csv;
pub(crate) mod dates;
pub mod dedup;
pub mod engine;
pub mod export;
pub mod formats;
pub mod learning;
pub mod merchants;
pub mod pipeline;
pub mod similar;
pub mod store;

pub use csv::{CsvImportProfile, CsvImporter, CsvParseReport, RejectedLine, ValidationError};
pub use dedup::{mark_duplicates, override_duplicate};
pub use engine::{CategorizationEngine, CategorizeError, Categorizer};
pub use export::{import_hash, to_import_records, ImportRecord};
pub use formats::{bank_formats, detect_format, find_format, BankFormat, ColumnMapping, FormatError};
pub use learning::{LearnedPattern, LearningCache, LEARNING_CACHE_KEY, MAX_LEARNED_PATTERNS};
pub use merchants::{MerchantMapping, MerchantMatcher, MerchantTableError};
pub use pipeline::{preview_import, resolve_profile, ImportPreview, ImportSummary, AUTO_FORMAT};
pub use similar::{apply_category_to_similar, find_similar};
pub use store::{JsonFileStore, MemoryStore, PatternStore, StoreError};

pub mod import {
    use crate::*;

    /// An engine over `store` with the cache already loaded.
    pub fn create_categorization_engine<S: PatternStore>(
        store: S,
        merchants: MerchantMatcher,
    ) -> CategorizationEngine<S> {
        CategorizationEngine::new(LearningCache::open(store), merchants)
    }

    pub fn import_csv_with_format<S: PatternStore>(
        engine: &mut CategorizationEngine<S>,
        content: &str,
        format: &str,
        has_header: bool,
    ) -> Result<ImportPreview, FormatError> {
        let profile = resolve_profile(format, has_header, None, content)?;
        preview_import(engine, content, &profile, &Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_with_format_name() {
        let mut engine = import::create_categorization_engine(MemoryStore::new(), MerchantMatcher::default());
        let preview = import::import_csv_with_format(
            &mut engine,
            "Date,Description,Amount\n2024-05-02,NETFLIX.COM,-10.99\n2024-05-03,ODD JOBS,15.00",
            "hsbc",
            true,
        )
        .unwrap();
        assert_eq!(preview.summary.importable, 2);
        assert_eq!(preview.transactions[0].subcategory, "Subscriptions");
        assert_eq!(preview.transactions[1].category, "Income");
        assert_eq!(preview.transactions[1].subcategory, "Salary");
    }
}
