use ledgerlight_core::BankTransaction;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::csv::{parse_text, CsvImportProfile, RejectedLine};
use crate::dedup::mark_duplicates_in_place;
use crate::engine::CategorizationEngine;
use crate::formats::{
    detect_format, find_format, BankFormat, ColumnMapping, FormatError, CUSTOM_FORMAT,
};
use crate::store::PatternStore;

/// Format name that asks for header-row detection.
pub const AUTO_FORMAT: &str = "auto";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    /// Non-blank data lines, rejected ones included.
    pub total_rows: usize,
    pub valid: usize,
    pub invalid: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub importable: usize,
}

impl ImportSummary {
    pub fn from_rows(transactions: &[BankTransaction], rejected: usize) -> Self {
        let valid = transactions.iter().filter(|t| t.is_valid).count();
        ImportSummary {
            total_rows: transactions.len() + rejected,
            valid,
            invalid: transactions.len() - valid,
            duplicates: transactions.iter().filter(|t| t.is_duplicate).count(),
            rejected,
            importable: transactions.iter().filter(|t| t.is_importable()).count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportPreview {
    pub transactions: Vec<BankTransaction>,
    pub rejected: Vec<RejectedLine>,
    pub summary: ImportSummary,
}

/// Picks the profile for an upload.
///
/// `auto` reads the first non-blank line as a header and matches it against
/// the registry. A supplied `mapping` replaces the named format's columns;
/// with `custom` it is required.
pub fn resolve_profile(
    format: &str,
    has_header: bool,
    mapping: Option<ColumnMapping>,
    content: &str,
) -> Result<CsvImportProfile, FormatError> {
    let format = format.trim();
    if format.eq_ignore_ascii_case(AUTO_FORMAT) {
        let header = content
            .lines()
            .find(|l| !l.trim().is_empty())
            .map(|l| l.strip_prefix('\u{feff}').unwrap_or(l))
            .ok_or(FormatError::Undetected)?;
        let detected = detect_format(header).ok_or(FormatError::Undetected)?;
        debug!(format = %detected.name, "Detected bank format");
        return Ok(CsvImportProfile::from_format(detected, true));
    }

    let base = find_format(format)?;
    let profile = match mapping {
        Some(mapping) => CsvImportProfile::from_format(
            &BankFormat {
                mapping,
                ..base.clone()
            },
            has_header,
        ),
        None if base.name == CUSTOM_FORMAT => {
            return Err(FormatError::MissingColumn("mapping"));
        }
        None => CsvImportProfile::from_format(base, has_header),
    };
    profile.validate()?;
    Ok(profile)
}

/// Parse, categorise and flag duplicates, without persisting anything but
/// the learning cache's usage timestamps.
pub fn preview_import<S: PatternStore>(
    engine: &mut CategorizationEngine<S>,
    content: &str,
    profile: &CsvImportProfile,
    existing_ids: &HashSet<String>,
) -> Result<ImportPreview, FormatError> {
    let report = parse_text(content, profile, engine)?;
    let mut transactions = report.transactions;
    mark_duplicates_in_place(&mut transactions, existing_ids);
    engine.flush();

    let summary = ImportSummary::from_rows(&transactions, report.rejected.len());
    info!(
        format = %profile.name,
        rows = summary.total_rows,
        importable = summary.importable,
        "Import preview ready"
    );
    debug!(?summary, "Import summary");

    Ok(ImportPreview {
        transactions,
        rejected: report.rejected,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::{LearningCache, LEARNING_CACHE_KEY};
    use crate::merchants::MerchantMatcher;
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};
    use ledgerlight_core::derive_id;

    const STATEMENT: &str = "Date,Type,Sort Code,Account,Description,Debit,Credit,Balance\n\
        01/03/2024,DD,,,TESCO STORES,45.60,,1000.00\n\
        02/03/2024,BGC,,,SALARY ACME,,2500.00,3500.00\n\
        03/03/2024,DD,,,,oops,,\n\
        04/03/2024,DD\n";

    fn engine(store: MemoryStore) -> CategorizationEngine<MemoryStore> {
        CategorizationEngine::new(LearningCache::open(store), MerchantMatcher::default())
    }

    #[test]
    fn preview_counts_and_duplicates() {
        let profile = resolve_profile("standard", true, None, STATEMENT).unwrap();
        let existing = HashSet::from([derive_id("2024-03-01", "TESCO STORES", -45.6)]);
        let preview =
            preview_import(&mut engine(MemoryStore::new()), STATEMENT, &profile, &existing).unwrap();

        assert_eq!(
            preview.summary,
            ImportSummary {
                total_rows: 4,
                valid: 2,
                invalid: 1,
                duplicates: 1,
                rejected: 1,
                importable: 1,
            }
        );
        assert!(preview.transactions[0].is_duplicate);
        assert_eq!(preview.rejected[0].line_number, 5);
    }

    #[test]
    fn preview_flushes_lookup_timestamps() {
        let store = MemoryStore::new();
        let mut e = engine(store.clone());
        let long_ago = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        e.cache_mut().record_at(
            "TESCO STORES",
            "Essentials",
            "Groceries",
            "Essentials",
            "Miscellaneous",
            long_ago,
        );
        assert!(store.get(LEARNING_CACHE_KEY).unwrap().contains("2020-01-01"));

        let profile = resolve_profile("standard", true, None, STATEMENT).unwrap();
        let preview = preview_import(&mut e, STATEMENT, &profile, &HashSet::new()).unwrap();
        assert_eq!(preview.transactions[0].subcategory, "Miscellaneous");
        assert!(!store.get(LEARNING_CACHE_KEY).unwrap().contains("2020-01-01"));
    }

    #[test]
    fn auto_detects_from_header() {
        let csv = "Date,Description,Amount,Balance\n2024-02-10,COSTA,-3.10,100.00";
        let profile = resolve_profile("auto", false, None, csv).unwrap();
        assert_eq!(profile.name, "santander");
        assert!(profile.has_header);
        assert_eq!(
            resolve_profile("auto", true, None, "foo,bar\n1,2"),
            Err(FormatError::Undetected)
        );
        assert_eq!(resolve_profile("auto", true, None, ""), Err(FormatError::Undetected));
    }

    #[test]
    fn custom_requires_valid_mapping() {
        assert_eq!(
            resolve_profile("custom", true, None, ""),
            Err(FormatError::MissingColumn("mapping"))
        );
        let bad = ColumnMapping {
            transaction_date: Some(0),
            description: Some(1),
            ..Default::default()
        };
        assert_eq!(
            resolve_profile("custom", true, Some(bad), ""),
            Err(FormatError::MissingAmountColumns)
        );
        let good = ColumnMapping {
            transaction_date: Some(2),
            description: Some(0),
            amount: Some(1),
            ..Default::default()
        };
        let profile = resolve_profile("custom", false, Some(good.clone()), "").unwrap();
        assert_eq!(profile.mapping, good);
        assert_eq!(profile.name, "custom");
    }

    #[test]
    fn unknown_format_name() {
        assert!(matches!(
            resolve_profile("bank of nowhere", true, None, ""),
            Err(FormatError::UnknownFormat(_))
        ));
    }
}
