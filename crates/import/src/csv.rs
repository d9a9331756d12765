use ledgerlight_core::money::{parse_amount, parse_optional_amount, to_f64};
use ledgerlight_core::{derive_id, BankTransaction, BudgetMonth};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::warn;

use crate::dates::{is_iso_date, normalize_date};
use crate::engine::{fallback_category, resolve_category, Categorizer};
use crate::formats::{delimiter_byte, BankFormat, ColumnMapping, FormatError, STANDARD_FORMAT};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvImportProfile {
    pub name: String,
    pub mapping: ColumnMapping,
    pub delimiter: String,
    pub date_format: String,
    pub has_header: bool,
}

impl Default for CsvImportProfile {
    fn default() -> Self {
        Self {
            name: STANDARD_FORMAT.to_string(),
            mapping: ColumnMapping::default(),
            delimiter: ",".to_string(),
            date_format: "DD/MM/YYYY".to_string(),
            has_header: true,
        }
    }
}

impl CsvImportProfile {
    pub fn from_format(format: &BankFormat, has_header: bool) -> Self {
        Self {
            name: format.name.clone(),
            mapping: format.mapping.clone(),
            delimiter: format.delimiter.clone(),
            date_format: format.date_format.clone(),
            has_header,
        }
    }

    pub fn validate(&self) -> Result<u8, FormatError> {
        self.mapping.validate()?;
        delimiter_byte(&self.delimiter)
    }
}

/// Row validation failures. The messages are shown to users verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing transaction date")]
    MissingDate,
    #[error("Missing transaction description")]
    MissingDescription,
    #[error("Invalid transaction amount")]
    InvalidAmount,
    #[error("Invalid date format")]
    InvalidDateFormat,
    #[error("Insufficient columns: expected at least {required}, found {found}")]
    InsufficientColumns { required: usize, found: usize },
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingDate => "missing_date",
            ValidationError::MissingDescription => "missing_description",
            ValidationError::InvalidAmount => "invalid_amount",
            ValidationError::InvalidDateFormat => "invalid_date_format",
            ValidationError::InsufficientColumns { .. } => "insufficient_columns",
        }
    }
}

/// A line that produced no transaction at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    /// 1-based, counting the header and blank lines.
    pub line_number: usize,
    pub error: ValidationError,
}

impl Serialize for RejectedLine {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("RejectedLine", 3)?;
        s.serialize_field("lineNumber", &self.line_number)?;
        s.serialize_field("code", self.error.code())?;
        s.serialize_field("message", &self.error.to_string())?;
        s.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvParseReport {
    pub transactions: Vec<BankTransaction>,
    pub rejected: Vec<RejectedLine>,
}

enum LineOutcome {
    Parsed(BankTransaction),
    Rejected(ValidationError),
}

pub struct CsvImporter;

impl CsvImporter {
    /// Parses statement lines into transactions.
    ///
    /// Blank lines are skipped, as is the first non-blank line when the
    /// profile has a header. No single row can fail the whole batch: bad
    /// rows come back as invalid transactions, or in `rejected` when the row
    /// is too short to read at all. Only an unusable profile is an error.
    pub fn parse_lines<'a, I>(
        lines: I,
        profile: &CsvImportProfile,
        categorizer: &mut dyn Categorizer,
    ) -> Result<CsvParseReport, FormatError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let delimiter = profile.validate()?;
        let mut report = CsvParseReport::default();
        let mut header_pending = profile.has_header;

        for (idx, line) in lines.into_iter().enumerate() {
            let line_number = idx + 1;
            let line = if idx == 0 {
                line.strip_prefix('\u{feff}').unwrap_or(line)
            } else {
                line
            };
            if line.trim().is_empty() {
                continue;
            }
            if header_pending {
                header_pending = false;
                continue;
            }

            match parse_line(line, line_number, profile, delimiter, categorizer) {
                Ok(LineOutcome::Parsed(tx)) => report.transactions.push(tx),
                Ok(LineOutcome::Rejected(error)) => {
                    report.rejected.push(RejectedLine { line_number, error })
                }
                Err(e) => report.transactions.push(unreadable_row(line_number, &e)),
            }
        }

        Ok(report)
    }

}

/// Invalid record for a row the reader could not split. Its only
/// validation error is the reader's message.
fn unreadable_row(line_number: usize, error: &dyn std::fmt::Display) -> BankTransaction {
    warn!(line = line_number, error = %error, "Unreadable CSV row");
    BankTransaction::invalid(
        format!("row_{line_number}"),
        String::new(),
        String::new(),
        None,
        vec![format!("CSV error: {error}")],
    )
}

/// Splits one line with CSV quoting rules.
pub fn split_fields(line: &str, delimiter: u8) -> Result<Vec<String>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(line.as_bytes());
    let mut record = csv::StringRecord::new();
    if reader.read_record(&mut record)? {
        Ok(record.iter().map(str::to_string).collect())
    } else {
        Ok(Vec::new())
    }
}

/// Callers have already checked the row against `required_column_count`.
fn field(fields: &[String], col: usize) -> &str {
    fields.get(col).map_or("", |f| f.trim())
}

fn optional_field(fields: &[String], col: Option<usize>) -> Option<String> {
    col.and_then(|c| fields.get(c))
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .map(str::to_string)
}

fn parse_line(
    line: &str,
    line_number: usize,
    profile: &CsvImportProfile,
    delimiter: u8,
    categorizer: &mut dyn Categorizer,
) -> Result<LineOutcome, csv::Error> {
    let mapping = &profile.mapping;
    let fields = split_fields(line, delimiter)?;

    let required = mapping.required_column_count();
    if fields.len() < required {
        return Ok(LineOutcome::Rejected(ValidationError::InsufficientColumns {
            required,
            found: fields.len(),
        }));
    }

    let raw_date = match mapping.transaction_date {
        Some(col) => field(&fields, col),
        None => "",
    };
    let description = match mapping.description {
        Some(col) => field(&fields, col),
        None => "",
    };

    let amount = match (mapping.amount, mapping.debit_amount, mapping.credit_amount) {
        (Some(col), _, _) => parse_amount(field(&fields, col)),
        (None, Some(debit), Some(credit)) => {
            let debit = parse_optional_amount(field(&fields, debit));
            let credit = parse_optional_amount(field(&fields, credit));
            debit.zip(credit).map(|(d, c)| c - d)
        }
        _ => None,
    };

    let date = normalize_date(raw_date, &profile.date_format);
    let mut errors = Vec::new();
    if raw_date.is_empty() {
        errors.push(ValidationError::MissingDate);
    }
    if description.is_empty() {
        errors.push(ValidationError::MissingDescription);
    }
    if amount.is_none() {
        errors.push(ValidationError::InvalidAmount);
    }
    if !is_iso_date(&date) {
        errors.push(ValidationError::InvalidDateFormat);
    }

    let Some(amount) = amount.filter(|_| errors.is_empty()) else {
        return Ok(LineOutcome::Parsed(BankTransaction::invalid(
            format!("row_{line_number}"),
            date,
            description.to_string(),
            amount.map(to_f64),
            errors.iter().map(ToString::to_string).collect(),
        )));
    };
    let amount = to_f64(amount);

    let balance = optional_field(&fields, mapping.balance)
        .and_then(|b| parse_amount(&b))
        .map(to_f64)
        .unwrap_or(0.0);
    let reference = optional_field(&fields, mapping.reference);
    let kind = optional_field(&fields, mapping.kind);

    let suggestion = categorizer.suggest(description, amount);
    let catalog = categorizer.catalog();
    let (category, subcategory) = resolve_category(catalog, &suggestion).unwrap_or_else(|e| {
        warn!(line = line_number, error = %e, "Categorization failed, using fallback");
        fallback_category(catalog)
    });

    Ok(LineOutcome::Parsed(BankTransaction {
        id: derive_id(&date, description, amount),
        budget_month: BudgetMonth::from_iso_date(&date),
        transaction_date: date,
        description: description.to_string(),
        amount,
        balance,
        reference,
        kind,
        category,
        subcategory,
        is_valid: true,
        validation_errors: Vec::new(),
        is_duplicate: false,
    }))
}

pub fn parse_lines<'a, I>(
    lines: I,
    profile: &CsvImportProfile,
    categorizer: &mut dyn Categorizer,
) -> Result<CsvParseReport, FormatError>
where
    I: IntoIterator<Item = &'a str>,
{
    CsvImporter::parse_lines(lines, profile, categorizer)
}

pub fn parse_text(
    content: &str,
    profile: &CsvImportProfile,
    categorizer: &mut dyn Categorizer,
) -> Result<CsvParseReport, FormatError> {
    CsvImporter::parse_lines(content.lines(), profile, categorizer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CategorizationEngine;
    use crate::formats::find_format;
    use crate::learning::LearningCache;
    use crate::merchants::MerchantMatcher;
    use crate::store::MemoryStore;
    use ledgerlight_core::{CategorizationResult, CategoryCatalog};

    fn engine() -> CategorizationEngine<MemoryStore> {
        CategorizationEngine::new(
            LearningCache::new(MemoryStore::new()),
            MerchantMatcher::default(),
        )
    }

    fn profile(name: &str, has_header: bool) -> CsvImportProfile {
        CsvImportProfile::from_format(find_format(name).unwrap(), has_header)
    }

    fn parse(content: &str, profile: &CsvImportProfile) -> CsvParseReport {
        parse_text(content, profile, &mut engine()).unwrap()
    }

    // ── standard layout ───────────────────────────────────────────────────────

    #[test]
    fn standard_tesco_row() {
        let report = parse("01/03/2024,DD,,,TESCO STORES,45.60,,1000.00", &profile("standard", false));
        assert!(report.rejected.is_empty());
        let tx = &report.transactions[0];
        assert!(tx.is_valid);
        assert_eq!(tx.transaction_date, "2024-03-01");
        assert_eq!(tx.amount, -45.6);
        assert_eq!(tx.balance, 1000.0);
        assert_eq!(tx.category, "Essentials");
        assert_eq!(tx.subcategory, "Groceries");
        assert_eq!(tx.kind.as_deref(), Some("DD"));
        assert_eq!(tx.budget_month, BudgetMonth::Month(3));
        assert_eq!(tx.id, "2024-03-01_TESCO_STORES_-45.6");
    }

    #[test]
    fn credit_minus_debit() {
        let report = parse(
            "02/03/2024,BGC,,,SALARY ACME LTD,,2500.00,3500.00\n03/03/2024,FPO,,,REFUND,5.00,7.50,",
            &profile("standard", false),
        );
        assert_eq!(report.transactions[0].amount, 2500.0);
        assert_eq!(report.transactions[0].subcategory, "Salary");
        assert_eq!(report.transactions[1].amount, 2.5);
        assert_eq!(report.transactions[1].balance, 0.0);
    }

    #[test]
    fn header_and_blank_lines_skipped() {
        let content = "\u{feff}Date,Type,Sort Code,Account,Description,Debit,Credit,Balance\n\
                       \n\
                       01/03/2024,DD,,,TESCO STORES,45.60,,1000.00\n   \n";
        let report = parse(content, &profile("standard", true));
        assert_eq!(report.transactions.len(), 1);
        assert!(report.rejected.is_empty());
    }

    #[test]
    fn leading_blank_line_before_header() {
        let content = "\nDate,Type,Sort Code,Account,Description,Debit,Credit,Balance\n\
                       01/03/2024,DD,,,TESCO STORES,45.60,,1000.00";
        let report = parse(content, &profile("standard", true));
        assert_eq!(report.transactions.len(), 1);
        assert!(report.transactions[0].is_valid);
    }

    // ── validation ────────────────────────────────────────────────────────────

    #[test]
    fn reports_every_validation_error() {
        let report = parse("01/03/2024,DD,,,,abc,,", &profile("standard", false));
        let tx = &report.transactions[0];
        assert!(!tx.is_valid);
        assert_eq!(
            tx.validation_errors,
            ["Missing transaction description", "Invalid transaction amount"]
        );
        assert_eq!(tx.category, "Essentials");
        assert_eq!(tx.subcategory, "Miscellaneous");
        assert_eq!(tx.id, "row_1");
        assert_eq!(tx.amount, 0.0);
    }

    #[test]
    fn missing_date_is_also_a_format_error() {
        let report = parse(",DD,,,COFFEE,3.00,,", &profile("standard", false));
        assert_eq!(
            report.transactions[0].validation_errors,
            ["Missing transaction date", "Invalid date format"]
        );
    }

    #[test]
    fn every_check_runs_on_an_empty_row() {
        let report = parse(",DD,,,,abc,,", &profile("standard", false));
        assert_eq!(
            report.transactions[0].validation_errors,
            [
                "Missing transaction date",
                "Missing transaction description",
                "Invalid transaction amount",
                "Invalid date format",
            ]
        );
    }

    #[test]
    fn unrecognised_date_is_invalid_format() {
        let report = parse("1 March 2024,DD,,,COFFEE,3.00,,", &profile("standard", false));
        let tx = &report.transactions[0];
        assert_eq!(tx.validation_errors, ["Invalid date format"]);
        assert_eq!(tx.transaction_date, "1 March 2024");
        assert_eq!(tx.amount, -3.0);
        assert_eq!(tx.budget_month, BudgetMonth::Current);
    }

    #[test]
    fn short_row_is_rejected_without_transaction() {
        let content = "01/03/2024,DD,,,TESCO\n01/03/2024,DD,,,TESCO STORES,45.60,,1000.00";
        let report = parse(content, &profile("standard", false));
        assert_eq!(report.transactions.len(), 1);
        assert_eq!(
            report.rejected,
            [RejectedLine {
                line_number: 1,
                error: ValidationError::InsufficientColumns { required: 8, found: 5 },
            }]
        );
        assert_eq!(report.rejected[0].error.code(), "insufficient_columns");
    }

    #[test]
    fn rejected_line_json_shape() {
        let rejected = RejectedLine {
            line_number: 4,
            error: ValidationError::InsufficientColumns { required: 3, found: 1 },
        };
        let json = serde_json::to_value(&rejected).unwrap();
        assert_eq!(json["lineNumber"], 4);
        assert_eq!(json["code"], "insufficient_columns");
        assert_eq!(json["message"], "Insufficient columns: expected at least 3, found 1");
    }

    // ── other layouts ─────────────────────────────────────────────────────────

    #[test]
    fn barclays_signed_amount_with_reference() {
        let content = "Number,Date,Account,Amount,Subcategory,Memo\n\
                       1234,15/01/2024,20-32-06 13152170,-12.99,PAYMENT,NETFLIX.COM";
        let tx = &parse(content, &profile("barclays", true)).transactions[0];
        assert!(tx.is_valid, "{:?}", tx.validation_errors);
        assert_eq!(tx.transaction_date, "2024-01-15");
        assert_eq!(tx.amount, -12.99);
        assert_eq!(tx.reference.as_deref(), Some("1234"));
        assert_eq!(tx.subcategory, "Subscriptions");
    }

    #[test]
    fn currency_symbols_and_quotes() {
        let content = "Date,Description,Amount,Balance\n\
                       2024-02-10,\"SMITH, J RENT\",\"-£1,200.00\",\"£3,400.10\"";
        let tx = &parse(content, &profile("santander", true)).transactions[0];
        assert!(tx.is_valid, "{:?}", tx.validation_errors);
        assert_eq!(tx.description, "SMITH, J RENT");
        assert_eq!(tx.amount, -1200.0);
        assert_eq!(tx.balance, 3400.1);
        assert_eq!(tx.subcategory, "Rent/Mortgage");
    }

    #[test]
    fn month_first_dates_when_requested() {
        let mut p = profile("hsbc", false);
        p.date_format = "MM/DD/YYYY".into();
        let tx = &parse("03/01/2024,COFFEE,-2.50", &p).transactions[0];
        assert_eq!(tx.transaction_date, "2024-03-01");
    }

    #[test]
    fn tab_delimited_custom_profile() {
        let p = CsvImportProfile {
            name: "custom".into(),
            mapping: ColumnMapping {
                transaction_date: Some(0),
                description: Some(1),
                amount: Some(2),
                ..Default::default()
            },
            delimiter: "\\t".into(),
            date_format: "DD-MM-YYYY".into(),
            has_header: false,
        };
        let tx = &parse("05-06-2024\tLIDL GB\t-8.20", &p).transactions[0];
        assert!(tx.is_valid);
        assert_eq!(tx.transaction_date, "2024-06-05");
        assert_eq!(tx.subcategory, "Groceries");
    }

    #[test]
    fn invalid_profile_is_an_error() {
        let mut p = profile("hsbc", false);
        p.mapping.debit_amount = Some(3);
        p.mapping.credit_amount = Some(4);
        let err = parse_text("x", &p, &mut engine()).unwrap_err();
        assert_eq!(err, FormatError::ConflictingAmountColumns);

        let mut p = profile("hsbc", false);
        p.delimiter = ";;".into();
        assert!(matches!(
            parse_text("x", &p, &mut engine()),
            Err(FormatError::InvalidDelimiter(_))
        ));
    }

    // ── categorization fallback ───────────────────────────────────────────────

    struct Blank(CategoryCatalog);

    impl Categorizer for Blank {
        fn suggest(&mut self, _description: &str, _amount: f64) -> CategorizationResult {
            CategorizationResult::new("", "", 0.5)
        }

        fn catalog(&self) -> &CategoryCatalog {
            &self.0
        }
    }

    #[test]
    fn categorization_failure_falls_back_without_failing_row() {
        let mut blank = Blank(CategoryCatalog::default());
        let report = parse_text("2024-01-01,ANYTHING,-1.00", &profile("hsbc", false), &mut blank).unwrap();
        let tx = &report.transactions[0];
        assert!(tx.is_valid);
        assert_eq!((tx.category.as_str(), tx.subcategory.as_str()), ("Essentials", "Rent/Mortgage"));
    }

    #[test]
    fn unreadable_row_becomes_invalid_record() {
        let tx = unreadable_row(7, &"found record with 2 fields");
        assert_eq!(tx.id, "row_7");
        assert!(!tx.is_valid);
        assert_eq!(tx.validation_errors, ["CSV error: found record with 2 fields"]);
    }
}
