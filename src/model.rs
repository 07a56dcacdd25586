//! Drift dataset returned by `GET /api/drift`.
//!
//! DESIGN
//! ======
//! The dataset is immutable once accepted: a fetch produces a fresh value
//! that replaces the previous one wholesale. `Category`, `Item` and
//! `MonthlyTrend` have no lifecycle of their own.
//!
//! CONTRACT
//! ========
//! The backend promises one category per key, items ordered by descending
//! absolute drift and chronologically ascending months. [`DriftDataset::validate`]
//! rejects what cannot be repaired (missing/duplicate keys, malformed or
//! duplicate months) and re-sorts what can, logging every repair.

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

// =============================================================================
// CATEGORY KEY
// =============================================================================

/// One of the three fixed spend domains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKey {
    #[default]
    People,
    AiLlm,
    SaasCloud,
}

impl CategoryKey {
    pub const ALL: [Self; 3] = [Self::People, Self::AiLlm, Self::SaasCloud];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::People => "people",
            Self::AiLlm => "ai_llm",
            Self::SaasCloud => "saas_cloud",
        }
    }

    /// Human label used when the backend omits one.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::People => "People",
            Self::AiLlm => "AI/LLM",
            Self::SaasCloud => "SaaS/Cloud",
        }
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryKey {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "people" => Ok(Self::People),
            "ai_llm" => Ok(Self::AiLlm),
            "saas_cloud" => Ok(Self::SaasCloud),
            other => Err(DatasetError::UnknownCategory(other.to_owned())),
        }
    }
}

// =============================================================================
// ERROR
// =============================================================================

/// A fetched dataset that violates the consumed contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatasetError {
    #[error("dataset is missing category `{0}`")]
    MissingCategory(CategoryKey),
    #[error("dataset contains category `{0}` more than once")]
    DuplicateCategory(CategoryKey),
    #[error("unknown category `{0}`")]
    UnknownCategory(String),
    #[error("month `{0}` is not formatted YYYY-MM")]
    InvalidMonth(String),
    #[error("month `{0}` appears more than once in monthly_trends")]
    DuplicateMonth(String),
}

// =============================================================================
// DATASET
// =============================================================================

/// One row of a category breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Display name, e.g. `"Engineering - FTE"`.
    pub item: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryKey>,
    pub avg_before: f64,
    pub avg_after: f64,
    /// `avg_after - avg_before`; trusted, never recomputed here.
    pub drift: f64,
    pub drift_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub category: CategoryKey,
    #[serde(default)]
    pub label: String,
    pub total_drift: f64,
    #[serde(default)]
    pub total_before: f64,
    #[serde(default)]
    pub total_after: f64,
    pub drift_pct: f64,
    /// Descending by `|drift|` once validated.
    pub items: Vec<Item>,
}

impl Category {
    /// Backend label, or the built-in one when it was omitted.
    #[must_use]
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() { self.category.label() } else { &self.label }
    }
}

/// Per-month spend totals, one field per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    /// `YYYY-MM`.
    pub month: String,
    pub people: f64,
    pub ai_llm: f64,
    pub saas_cloud: f64,
}

impl MonthlyTrend {
    #[must_use]
    pub fn value(&self, key: CategoryKey) -> f64 {
        match key {
            CategoryKey::People => self.people,
            CategoryKey::AiLlm => self.ai_llm,
            CategoryKey::SaasCloud => self.saas_cloud,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftDataset {
    pub total_monthly_drift: f64,
    pub annualized_drift: f64,
    pub categories: Vec<Category>,
    pub monthly_trends: Vec<MonthlyTrend>,
}

impl DriftDataset {
    /// Enforce the consumed contract, repairing ordering where possible.
    ///
    /// # Errors
    ///
    /// Returns a [`DatasetError`] when a category key is missing or repeated,
    /// or a month is malformed or repeated.
    pub fn validate(mut self) -> Result<Self, DatasetError> {
        for key in CategoryKey::ALL {
            match self.categories.iter().filter(|c| c.category == key).count() {
                0 => return Err(DatasetError::MissingCategory(key)),
                1 => {}
                _ => return Err(DatasetError::DuplicateCategory(key)),
            }
        }

        for category in &mut self.categories {
            let sorted = category
                .items
                .is_sorted_by(|a, b| a.drift.abs() >= b.drift.abs());
            if !sorted {
                warn!(category = %category.category, "items not ordered by drift impact; re-sorting");
                category
                    .items
                    .sort_by(|a, b| b.drift.abs().total_cmp(&a.drift.abs()));
            }
        }

        for trend in &self.monthly_trends {
            if !is_year_month(&trend.month) {
                return Err(DatasetError::InvalidMonth(trend.month.clone()));
            }
        }
        if !self.monthly_trends.is_sorted_by(|a, b| a.month <= b.month) {
            warn!("monthly_trends not chronological; re-sorting");
            self.monthly_trends.sort_by(|a, b| a.month.cmp(&b.month));
        }
        if let Some(pair) = self.monthly_trends.windows(2).find(|w| w[0].month == w[1].month) {
            return Err(DatasetError::DuplicateMonth(pair[1].month.clone()));
        }

        Ok(self)
    }

    #[must_use]
    pub fn category(&self, key: CategoryKey) -> Option<&Category> {
        self.categories.iter().find(|c| c.category == key)
    }

    /// Position of `month` in `monthly_trends`.
    #[must_use]
    pub fn trend_index(&self, month: &str) -> Option<usize> {
        self.monthly_trends.iter().position(|t| t.month == month)
    }
}

fn is_year_month(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    if bytes.len() != 7 || bytes[4] != b'-' {
        return false;
    }
    if !bytes[..4].iter().chain(&bytes[5..]).all(u8::is_ascii_digit) {
        return false;
    }
    matches!(raw[5..].parse::<u8>(), Ok(1..=12))
}
