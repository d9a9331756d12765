use ledgerlight_core::{normalize, CategorizationResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantMapping {
    pub name: String,
    pub patterns: Vec<String>,
    pub category: String,
    pub subcategory: String,
    pub confidence: f64,
}

#[derive(Error, Debug)]
pub enum MerchantTableError {
    #[error("Failed to parse merchant table: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Merchant '{name}' has confidence {confidence} outside 0.0-1.0")]
    ConfidenceOutOfRange { name: String, confidence: f64 },
    #[error("Merchant '{0}' has no usable patterns")]
    NoPatterns(String),
}

#[derive(Deserialize)]
struct MerchantTable {
    #[serde(default)]
    merchant: Vec<MerchantMapping>,
}

/// A mapping with its patterns normalised once up front.
struct CompiledMapping {
    mapping: MerchantMapping,
    patterns: Vec<String>,
}

impl CompiledMapping {
    fn hits(&self, normalized_description: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| normalized_description.contains(p.as_str()))
    }
}

/// Static merchant table matcher. Among all mappings with a pattern hit, the
/// strictly highest confidence wins; on a tie the earlier mapping is kept.
pub struct MerchantMatcher {
    mappings: Vec<CompiledMapping>,
}

impl Default for MerchantMatcher {
    fn default() -> Self {
        Self::new(default_merchants())
    }
}

impl MerchantMatcher {
    pub fn new(mappings: Vec<MerchantMapping>) -> Self {
        let mappings = mappings
            .into_iter()
            .map(|mapping| {
                let patterns = mapping
                    .patterns
                    .iter()
                    .map(|p| normalize(p))
                    .filter(|p| !p.is_empty())
                    .collect();
                CompiledMapping { mapping, patterns }
            })
            .collect();
        Self { mappings }
    }

    /// Loads a `[[merchant]]` table, replacing the built-in one.
    pub fn from_toml(toml_content: &str) -> Result<Self, MerchantTableError> {
        let table: MerchantTable = toml::from_str(toml_content)?;
        for m in &table.merchant {
            if !(0.0..=1.0).contains(&m.confidence) {
                return Err(MerchantTableError::ConfidenceOutOfRange {
                    name: m.name.clone(),
                    confidence: m.confidence,
                });
            }
            if m.patterns.iter().all(|p| normalize(p).is_empty()) {
                return Err(MerchantTableError::NoPatterns(m.name.clone()));
            }
        }
        Ok(Self::new(table.merchant))
    }

    pub fn mappings(&self) -> impl Iterator<Item = &MerchantMapping> {
        self.mappings.iter().map(|c| &c.mapping)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn match_merchant(&self, description: &str) -> Option<CategorizationResult> {
        let text = normalize(description);
        self.best_hit(&text, |_| true).map(|m| {
            CategorizationResult::new(&m.category, &m.subcategory, m.confidence)
        })
    }

    /// Highest confidence among mappings assigned to this category pair that
    /// also hit the description.
    pub fn confidence_for(
        &self,
        description: &str,
        category: &str,
        subcategory: &str,
    ) -> Option<f64> {
        let text = normalize(description);
        self.best_hit(&text, |m| m.category == category && m.subcategory == subcategory)
            .map(|m| m.confidence)
    }

    fn best_hit(
        &self,
        normalized_description: &str,
        filter: impl Fn(&MerchantMapping) -> bool,
    ) -> Option<&MerchantMapping> {
        if normalized_description.is_empty() {
            return None;
        }
        let mut best: Option<&MerchantMapping> = None;
        for cm in &self.mappings {
            if !filter(&cm.mapping) || !cm.hits(normalized_description) {
                continue;
            }
            if best.map_or(true, |b| cm.mapping.confidence > b.confidence) {
                best = Some(&cm.mapping);
            }
        }
        best
    }
}

// (name, patterns, category, subcategory, confidence)
const MERCHANTS: &[(&str, &[&str], &str, &str, f64)] = &[
    ("Tesco", &["tesco"], "Essentials", "Groceries", 0.9),
    ("Sainsbury's", &["sainsbury"], "Essentials", "Groceries", 0.9),
    ("Asda", &["asda"], "Essentials", "Groceries", 0.9),
    ("Morrisons", &["morrisons"], "Essentials", "Groceries", 0.9),
    ("Aldi", &["aldi"], "Essentials", "Groceries", 0.9),
    ("Lidl", &["lidl"], "Essentials", "Groceries", 0.9),
    ("Waitrose", &["waitrose"], "Essentials", "Groceries", 0.9),
    ("Ocado", &["ocado retail", "ocadocom", "ocado com"], "Essentials", "Groceries", 0.9),
    ("Co-op Food", &["coop food", "co op food"], "Essentials", "Groceries", 0.85),
    ("Iceland", &["iceland foods"], "Essentials", "Groceries", 0.85),
    ("Salary", &["salary", "payroll", "wages"], "Income", "Salary", 0.95),
    ("Child Benefit", &["child benefit", "dwp"], "Income", "Benefits", 0.9),
    ("Interest", &["interest paid", "gross interest"], "Income", "Interest", 0.85),
    ("Mortgage", &["mortgage"], "Essentials", "Rent/Mortgage", 0.9),
    ("Council Tax", &["council tax"], "Essentials", "Council Tax", 0.95),
    ("British Gas", &["british gas"], "Essentials", "Utilities", 0.9),
    ("Octopus Energy", &["octopus energy"], "Essentials", "Utilities", 0.9),
    ("EDF Energy", &["edf energy"], "Essentials", "Utilities", 0.9),
    ("OVO Energy", &["ovo energy"], "Essentials", "Utilities", 0.9),
    ("Thames Water", &["thames water"], "Essentials", "Utilities", 0.9),
    ("TfL", &["tfl travel", "tfl gov", "transport for london"], "Essentials", "Transport", 0.9),
    ("Trainline", &["trainline"], "Essentials", "Transport", 0.85),
    ("Uber", &["uber trip", "uber bv"], "Essentials", "Transport", 0.8),
    ("Fuel", &["esso service", "esso petrol", "shell uk", "shell petrol"], "Essentials", "Transport", 0.75),
    ("Insurance", &["aviva", "direct line", "admiral"], "Essentials", "Insurance", 0.85),
    (
        "Phone & Broadband",
        &["vodafone", "ee limited", "bt group", "virgin media", "sky digital"],
        "Essentials",
        "Phone & Internet",
        0.85,
    ),
    ("Childcare", &["nursery", "childcare"], "Essentials", "Childcare", 0.8),
    (
        "Restaurants & Takeaway",
        &[
            "mcdonalds",
            "nandos",
            "pizza express",
            "pret a manger",
            "greggs",
            "costa coffee",
            "starbucks",
            "deliveroo",
            "just eat",
            "uber eats",
        ],
        "Lifestyle",
        "Dining Out",
        0.85,
    ),
    (
        "Online Shopping",
        &["amazon", "amzn", "ebay", "argos", "john lewis", "primark", "asos"],
        "Lifestyle",
        "Shopping",
        0.8,
    ),
    (
        "Streaming",
        &["netflix", "spotify", "disney plus", "amazon prime", "prime video", "apple com bill"],
        "Lifestyle",
        "Subscriptions",
        0.9,
    ),
    (
        "Cinema & Events",
        &["cineworld", "odeon", "vue cinema", "ticketmaster"],
        "Lifestyle",
        "Entertainment",
        0.85,
    ),
    (
        "Travel",
        &["easyjet", "ryanair", "british airways", "airbnb", "booking com"],
        "Lifestyle",
        "Travel",
        0.85,
    ),
    (
        "Gyms & Pharmacy",
        &["puregym", "the gym group", "david lloyd", "boots uk", "boots the chemist"],
        "Lifestyle",
        "Health & Fitness",
        0.8,
    ),
    ("Investments", &["vanguard", "nutmeg", "moneybox"], "Savings", "Investments", 0.85),
    ("Pension", &["pension contribution", "pension scheme"], "Savings", "Pension", 0.8),
    (
        "Cash",
        &["cash withdrawal", "link atm", "cash machine"],
        "Other",
        "Cash Withdrawal",
        0.8,
    ),
    (
        "Bank Fees",
        &["overdraft fee", "monthly account fee", "non sterling transaction fee"],
        "Other",
        "Fees",
        0.85,
    ),
];

pub fn default_merchants() -> Vec<MerchantMapping> {
    MERCHANTS
        .iter()
        .map(|(name, patterns, category, subcategory, confidence)| MerchantMapping {
            name: name.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            category: category.to_string(),
            subcategory: subcategory.to_string(),
            confidence: *confidence,
        })
        .collect()
}
