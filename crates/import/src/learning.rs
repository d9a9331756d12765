use chrono::{DateTime, Utc};
use ledgerlight_core::normalize;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use crate::store::{PatternStore, StoreError};

pub const LEARNING_CACHE_KEY: &str = "learned_patterns";
pub const MAX_LEARNED_PATTERNS: usize = 200;
pub const INITIAL_CONFIDENCE: f64 = 0.8;
pub const CONFIDENCE_STEP: f64 = 0.05;
pub const MAX_CONFIDENCE: f64 = 0.95;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnedPattern {
    pub pattern: String,
    pub category: String,
    pub subcategory: String,
    pub confidence: f64,
    pub frequency: u32,
    pub last_used: DateTime<Utc>,
}

impl LearnedPattern {
    fn matches(&self, normalized_description: &str) -> bool {
        !self.pattern.is_empty() && normalized_description.contains(self.pattern.as_str())
    }
}

fn leading_phrase() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| {
        Regex::new(r"^(payment (to|from) |purchase (at|from) |withdrawal (at|from) )")
            .expect("invalid regex")
    })
}

/// Pattern stored for a first-time correction. Long descriptions lose a
/// leading "payment to", "purchase at" or "withdrawal from" phrase.
pub fn derive_pattern(normalized_description: &str) -> String {
    if normalized_description.len() > 10 {
        leading_phrase()
            .replace(normalized_description, "")
            .into_owned()
    } else {
        normalized_description.to_string()
    }
}

fn bump(confidence: f64) -> f64 {
    let raised = ((confidence + CONFIDENCE_STEP) * 100.0).round() / 100.0;
    raised.min(MAX_CONFIDENCE)
}

/// User corrections, consulted before the merchant table.
///
/// Lookup is first-match in the current in-memory order. Every mutation is
/// written back to the store; store failures are logged and the in-memory
/// state carries on.
pub struct LearningCache<S: PatternStore> {
    store: S,
    key: String,
    patterns: Vec<LearnedPattern>,
    dirty: bool,
}

impl<S: PatternStore> LearningCache<S> {
    /// An empty cache bound to `store`. Call [`load`](Self::load) to read it.
    pub fn new(store: S) -> Self {
        Self::with_key(store, LEARNING_CACHE_KEY)
    }

    pub fn with_key(store: S, key: &str) -> Self {
        Self {
            store,
            key: key.to_string(),
            patterns: Vec::new(),
            dirty: false,
        }
    }

    /// Creates the cache and loads it from `store`.
    pub fn open(store: S) -> Self {
        let mut cache = Self::new(store);
        cache.load();
        cache
    }

    /// Replaces the in-memory state with the stored one. Any failure leaves
    /// an empty cache. Returns the number of patterns loaded.
    pub fn load(&mut self) -> usize {
        self.dirty = false;
        self.patterns = match self.read_store() {
            Ok(patterns) => patterns,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Learning cache unreadable, starting empty");
                Vec::new()
            }
        };
        info!(key = %self.key, patterns = self.patterns.len(), "Learning cache loaded");
        self.patterns.len()
    }

    fn read_store(&self) -> Result<Vec<LearnedPattern>, StoreError> {
        let Some(raw) = self.store.load(&self.key)? else {
            return Ok(Vec::new());
        };
        let mut patterns: Vec<LearnedPattern> = serde_json::from_str(&raw)?;
        for p in &mut patterns {
            p.pattern = normalize(&p.pattern);
        }
        patterns.retain(|p| !p.pattern.is_empty());
        keep_most_recent(&mut patterns);
        Ok(patterns)
    }

    /// Writes the cache to the store. Returns whether the write succeeded.
    pub fn persist(&mut self) -> bool {
        let result = serde_json::to_string(&self.patterns)
            .map_err(StoreError::from)
            .and_then(|json| self.store.save(&self.key, &json));
        match result {
            Ok(()) => {
                self.dirty = false;
                true
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to persist learning cache");
                false
            }
        }
    }

    /// Persists only if a lookup touched a pattern since the last write.
    pub fn flush(&mut self) -> bool {
        if self.dirty {
            self.persist()
        } else {
            true
        }
    }

    pub fn patterns(&self) -> &[LearnedPattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read-only first match.
    pub fn find(&self, description: &str) -> Option<&LearnedPattern> {
        let text = normalize(description);
        self.position(&text).map(|i| &self.patterns[i])
    }

    fn position(&self, normalized_description: &str) -> Option<usize> {
        if normalized_description.is_empty() {
            return None;
        }
        self.patterns
            .iter()
            .position(|p| p.matches(normalized_description))
    }

    /// First match; a hit refreshes its `last_used`, which is persisted on the
    /// next write or [`flush`](Self::flush).
    pub fn lookup(&mut self, description: &str) -> Option<LearnedPattern> {
        self.lookup_at(description, Utc::now())
    }

    pub fn lookup_at(&mut self, description: &str, now: DateTime<Utc>) -> Option<LearnedPattern> {
        let text = normalize(description);
        let idx = self.position(&text)?;
        let hit = &mut self.patterns[idx];
        hit.last_used = now;
        self.dirty = true;
        Some(hit.clone())
    }

    /// Every pattern that hits the description, in cache order.
    pub fn hits<'a>(&'a self, description: &str) -> impl Iterator<Item = &'a LearnedPattern> + 'a {
        let text = normalize(description);
        self.patterns.iter().filter(move |p| p.matches(&text))
    }

    /// Records a user correction. Returns `false` when nothing changed.
    pub fn record(
        &mut self,
        description: &str,
        original_category: &str,
        original_subcategory: &str,
        corrected_category: &str,
        corrected_subcategory: &str,
    ) -> bool {
        self.record_at(
            description,
            original_category,
            original_subcategory,
            corrected_category,
            corrected_subcategory,
            Utc::now(),
        )
    }

    pub fn record_at(
        &mut self,
        description: &str,
        original_category: &str,
        original_subcategory: &str,
        corrected_category: &str,
        corrected_subcategory: &str,
        now: DateTime<Utc>,
    ) -> bool {
        if original_category == corrected_category && original_subcategory == corrected_subcategory
        {
            return false;
        }
        let text = normalize(description);
        if text.is_empty() {
            debug!("Ignoring correction for a description with no matchable text");
            return false;
        }

        if let Some(idx) = self.position(&text) {
            let existing = &mut self.patterns[idx];
            existing.category = corrected_category.to_string();
            existing.subcategory = corrected_subcategory.to_string();
            existing.frequency = existing.frequency.saturating_add(1);
            existing.last_used = now;
            existing.confidence = bump(existing.confidence);
            debug!(pattern = %existing.pattern, frequency = existing.frequency, "Reinforced learned pattern");
        } else {
            let pattern = derive_pattern(&text);
            if pattern.is_empty() {
                return false;
            }
            debug!(pattern = %pattern, "Learned new pattern");
            self.patterns.push(LearnedPattern {
                pattern,
                category: corrected_category.to_string(),
                subcategory: corrected_subcategory.to_string(),
                confidence: INITIAL_CONFIDENCE,
                frequency: 1,
                last_used: now,
            });
            keep_most_recent(&mut self.patterns);
        }

        self.persist();
        true
    }

    /// Drops every pattern and removes the stored entry. The in-memory
    /// cache is empty even when the store fails.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.patterns.clear();
        self.dirty = false;
        self.store.remove(&self.key)
    }
}

/// Keeps the `MAX_LEARNED_PATTERNS` most recently used patterns.
fn keep_most_recent(patterns: &mut Vec<LearnedPattern>) {
    if patterns.len() > MAX_LEARNED_PATTERNS {
        patterns.sort_by(|a, b| b.last_used.cmp(&a.last_used));
        patterns.truncate(MAX_LEARNED_PATTERNS);
    }
}
