use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Unknown bank format: {0}")]
    UnknownFormat(String),
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("Mapping sets both a single amount column and debit/credit columns")]
    ConflictingAmountColumns,
    #[error("Mapping needs either an amount column or both debit and credit columns")]
    MissingAmountColumns,
    #[error("Delimiter must be a single ASCII character, got {0:?}")]
    InvalidDelimiter(String),
    #[error("Could not recognise the bank from the header row")]
    Undetected,
}

/// 0-based column positions. `None` where the bank does not export that field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMapping {
    pub transaction_date: Option<usize>,
    pub description: Option<usize>,
    pub debit_amount: Option<usize>,
    pub credit_amount: Option<usize>,
    pub amount: Option<usize>,
    pub balance: Option<usize>,
    pub reference: Option<usize>,
    #[serde(rename = "type")]
    pub kind: Option<usize>,
}

impl ColumnMapping {
    /// Date and description are required; the amount is either one signed
    /// column or a debit/credit pair, never both.
    pub fn validate(&self) -> Result<(), FormatError> {
        if self.transaction_date.is_none() {
            return Err(FormatError::MissingColumn("transactionDate"));
        }
        if self.description.is_none() {
            return Err(FormatError::MissingColumn("description"));
        }
        let split = self.debit_amount.is_some() || self.credit_amount.is_some();
        match (self.amount.is_some(), split) {
            (true, true) => Err(FormatError::ConflictingAmountColumns),
            (false, false) => Err(FormatError::MissingAmountColumns),
            (false, true) if self.debit_amount.is_none() || self.credit_amount.is_none() => {
                Err(FormatError::MissingAmountColumns)
            }
            _ => Ok(()),
        }
    }

    /// Smallest field count a row needs for every mapped column to exist.
    pub fn required_column_count(&self) -> usize {
        [
            self.transaction_date,
            self.description,
            self.debit_amount,
            self.credit_amount,
            self.amount,
            self.balance,
            self.reference,
            self.kind,
        ]
        .into_iter()
        .flatten()
        .max()
        .map_or(0, |max| max + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankFormat {
    pub name: String,
    pub description: String,
    pub mapping: ColumnMapping,
    pub date_format: String,
    pub delimiter: String,
}

impl BankFormat {
    /// A user-defined mapping registered under the `custom` name.
    pub fn custom(mapping: ColumnMapping, date_format: &str, delimiter: &str) -> Self {
        BankFormat {
            name: CUSTOM_FORMAT.to_string(),
            description: "Custom column mapping".to_string(),
            mapping,
            date_format: date_format.to_string(),
            delimiter: delimiter.to_string(),
        }
    }

    pub fn delimiter_byte(&self) -> Result<u8, FormatError> {
        delimiter_byte(&self.delimiter)
    }
}

pub fn delimiter_byte(delimiter: &str) -> Result<u8, FormatError> {
    let d = match delimiter {
        "\\t" | "tab" => "\t",
        other => other,
    };
    match d.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(FormatError::InvalidDelimiter(delimiter.to_string())),
    }
}

pub const STANDARD_FORMAT: &str = "standard";
pub const CUSTOM_FORMAT: &str = "custom";

/// `(name, description, header signature, mapping)`
type FormatRow = (
    &'static str,
    &'static str,
    &'static [&'static str],
    [Option<usize>; 8],
);

// Column order in the array: date, description, debit, credit, amount,
// balance, reference, type.
const FORMATS: &[FormatRow] = &[
    (
        STANDARD_FORMAT,
        "Standard UK export: Date, Type, Sort Code, Account, Description, Debit, Credit, Balance",
        &[],
        [Some(0), Some(4), Some(5), Some(6), None, Some(7), None, Some(1)],
    ),
    (
        "lloyds",
        "Lloyds Bank",
        &[
            "transaction date",
            "transaction type",
            "sort code",
            "account number",
            "transaction description",
            "debit amount",
            "credit amount",
            "balance",
        ],
        [Some(0), Some(4), Some(5), Some(6), None, Some(7), None, Some(1)],
    ),
    (
        "halifax",
        "Halifax (Lloyds layout)",
        &[],
        [Some(0), Some(4), Some(5), Some(6), None, Some(7), None, Some(1)],
    ),
    (
        "barclays",
        "Barclays: Number, Date, Account, Amount, Subcategory, Memo",
        &["number", "date", "account", "amount", "subcategory", "memo"],
        [Some(1), Some(5), None, None, Some(3), None, Some(0), Some(4)],
    ),
    (
        "natwest",
        "NatWest / RBS: Date, Type, Description, Value, Balance, Account Name, Account Number",
        &["date", "type", "description", "value", "balance", "account name", "account number"],
        [Some(0), Some(2), None, None, Some(3), Some(4), None, Some(1)],
    ),
    (
        "nationwide",
        "Nationwide: Date, Transaction type, Description, Paid out, Paid in, Balance",
        &["date", "transaction type", "description", "paid out", "paid in", "balance"],
        [Some(0), Some(2), Some(3), Some(4), None, Some(5), None, Some(1)],
    ),
    (
        "monzo",
        "Monzo: Transaction ID, Date, Time, Type, Name, Emoji, Category, Amount, ...",
        &["transaction id", "date", "time", "type", "name", "emoji", "category", "amount"],
        [Some(1), Some(4), None, None, Some(7), None, Some(0), Some(3)],
    ),
    (
        "starling",
        "Starling: Date, Counter Party, Reference, Type, Amount (GBP), Balance (GBP)",
        &["date", "counter party", "reference", "type", "amount gbp", "balance gbp"],
        [Some(0), Some(1), None, None, Some(4), Some(5), Some(2), Some(3)],
    ),
    (
        "santander",
        "Santander: Date, Description, Amount, Balance",
        &["date", "description", "amount", "balance"],
        [Some(0), Some(1), None, None, Some(2), Some(3), None, None],
    ),
    (
        "hsbc",
        "HSBC: Date, Description, Amount",
        &["date", "description", "amount"],
        [Some(0), Some(1), None, None, Some(2), None, None, None],
    ),
    (
        CUSTOM_FORMAT,
        "Custom column mapping (defaults to the standard layout)",
        &[],
        [Some(0), Some(4), Some(5), Some(6), None, Some(7), None, Some(1)],
    ),
];

fn build(row: &FormatRow) -> BankFormat {
    let (name, description, _, c) = row;
    BankFormat {
        name: name.to_string(),
        description: description.to_string(),
        mapping: ColumnMapping {
            transaction_date: c[0],
            description: c[1],
            debit_amount: c[2],
            credit_amount: c[3],
            amount: c[4],
            balance: c[5],
            reference: c[6],
            kind: c[7],
        },
        date_format: "DD/MM/YYYY".to_string(),
        delimiter: ",".to_string(),
    }
}

/// Every registered format, in registry order.
pub fn bank_formats() -> &'static [BankFormat] {
    static REGISTRY: OnceLock<Vec<BankFormat>> = OnceLock::new();
    REGISTRY.get_or_init(|| FORMATS.iter().map(build).collect())
}

pub fn find_format(name: &str) -> Result<&'static BankFormat, FormatError> {
    bank_formats()
        .iter()
        .find(|f| f.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| FormatError::UnknownFormat(name.to_string()))
}

/// Recognises a named bank from its header row. Longer signatures are
/// checked first so `Date,Description,Amount,Balance` is not taken for HSBC.
pub fn detect_format(header_line: &str) -> Option<&'static BankFormat> {
    let fields: Vec<String> = header_line
        .split(',')
        .map(|f| ledgerlight_core::normalize(f.trim_matches('"')))
        .collect();

    let mut candidates: Vec<&FormatRow> = FORMATS.iter().filter(|r| !r.2.is_empty()).collect();
    candidates.sort_by(|a, b| b.2.len().cmp(&a.2.len()));

    let row = candidates.into_iter().find(|(_, _, signature, _)| {
        fields.len() >= signature.len()
            && signature.iter().zip(&fields).all(|(want, got)| want == got)
    })?;
    find_format(row.0).ok()
}
