//! Presentation analytics derived from the current dataset and tab.
//!
//! DESIGN
//! ======
//! Everything here is a pure function of `(DriftDataset, CategoryKey)` and is
//! recomputed on every projection; nothing is cached across a dataset
//! replacement. Bar widths are normalized per category, so switching tabs
//! changes the scale.

#[cfg(test)]
#[path = "analytics_test.rs"]
mod analytics_test;

use std::fmt::Write;

use crate::format::{format_currency, format_signed_currency, format_signed_percent};
use crate::model::{Category, CategoryKey, DriftDataset, Item, MonthlyTrend};

// =============================================================================
// SEVERITY
// =============================================================================

/// Highlight level keyed on `|drift_pct|`, independent of direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeverityBand {
    None,
    Weak,
    Strong,
}

/// `> 50` strong, `> 20` weak, otherwise none.
#[must_use]
pub fn severity_band(drift_pct: f64) -> SeverityBand {
    let magnitude = drift_pct.abs();
    if magnitude > 50.0 {
        SeverityBand::Strong
    } else if magnitude > 20.0 {
        SeverityBand::Weak
    } else {
        SeverityBand::None
    }
}

// =============================================================================
// CATEGORY SELECTION
// =============================================================================

/// The category for `tab`, falling back to the first one when the tab does
/// not match anything in the dataset.
#[must_use]
pub fn active_category(dataset: &DriftDataset, tab: CategoryKey) -> Option<&Category> {
    dataset
        .category(tab)
        .or_else(|| dataset.categories.first())
}

/// `items[0]` when it is an increase. A decrease at the top stays in the
/// table but is not called out as the biggest drifter.
#[must_use]
pub fn top_drifter(category: &Category) -> Option<&Item> {
    category.items.first().filter(|item| item.drift > 0.0)
}

/// `|drift| / max|drift| * 100` per item; all zeros when the max is zero.
#[must_use]
pub fn bar_widths(items: &[Item]) -> Vec<f64> {
    let max = items
        .iter()
        .map(|item| item.drift.abs())
        .filter(|d| d.is_finite())
        .fold(0.0_f64, f64::max);
    items
        .iter()
        .map(|item| {
            if max > 0.0 && item.drift.is_finite() {
                (item.drift.abs() / max * 100.0).clamp(0.0, 100.0)
            } else {
                0.0
            }
        })
        .collect()
}

// =============================================================================
// PROJECTION
// =============================================================================

/// One rendered table row.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRow<'a> {
    pub item: &'a Item,
    pub band: SeverityBand,
    pub bar_width: f64,
    pub drift_label: String,
    pub drift_pct_label: String,
}

/// Everything the dashboard renders for the active tab.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView<'a> {
    pub tab: CategoryKey,
    pub category: &'a Category,
    pub rows: Vec<ItemRow<'a>>,
    pub top_drifter: Option<&'a Item>,
    pub total_monthly_label: String,
    pub annualized_label: String,
    pub category_drift_label: String,
    pub category_pct_label: String,
    /// Drives the "up" indicator for the category card.
    pub is_increase: bool,
}

/// Project `dataset` for `tab`. `None` only when the dataset has no
/// categories at all, which a validated dataset never does.
#[must_use]
pub fn project(dataset: &DriftDataset, tab: CategoryKey) -> Option<DashboardView<'_>> {
    let category = active_category(dataset, tab)?;
    let widths = bar_widths(&category.items);
    let rows = category
        .items
        .iter()
        .zip(widths)
        .map(|(item, bar_width)| ItemRow {
            item,
            band: severity_band(item.drift_pct),
            bar_width,
            drift_label: format_signed_currency(item.drift),
            drift_pct_label: format_signed_percent(item.drift_pct),
        })
        .collect();

    Some(DashboardView {
        tab: category.category,
        category,
        rows,
        top_drifter: top_drifter(category),
        total_monthly_label: format_signed_currency(dataset.total_monthly_drift),
        annualized_label: format_signed_currency(dataset.annualized_drift),
        category_drift_label: format_signed_currency(category.total_drift),
        category_pct_label: format_signed_percent(category.drift_pct),
        is_increase: category.total_drift > 0.0,
    })
}

// =============================================================================
// MONTH COMPARISON
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComparisonError {
    #[error("not enough prior data to compare {month}")]
    NotEnoughPriorData { month: String },

    #[error("month {0} is not in the trend data")]
    UnknownMonth(String),
}

/// A single-shot question comparing a month with the one before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthComparison {
    pub previous_month: String,
    pub month: String,
    pub prompt: String,
}

/// Build the comparison prompt for `month` against its predecessor.
///
/// # Errors
///
/// [`ComparisonError::NotEnoughPriorData`] for the earliest month and
/// [`ComparisonError::UnknownMonth`] when `month` is absent.
pub fn month_comparison(dataset: &DriftDataset, month: &str) -> Result<MonthComparison, ComparisonError> {
    let index = dataset
        .trend_index(month)
        .ok_or_else(|| ComparisonError::UnknownMonth(month.to_owned()))?;
    if index == 0 {
        return Err(ComparisonError::NotEnoughPriorData { month: month.to_owned() });
    }
    let previous = &dataset.monthly_trends[index - 1];
    let current = &dataset.monthly_trends[index];

    let mut prompt = format!("Compare my spend in {} against {}.\n", current.month, previous.month);
    write_month_line(&mut prompt, previous);
    write_month_line(&mut prompt, current);
    prompt.push_str(
        "What changed month over month, which category drove it, and what should I do about it?",
    );

    Ok(MonthComparison { previous_month: previous.month.clone(), month: current.month.clone(), prompt })
}

fn write_month_line(out: &mut String, trend: &MonthlyTrend) {
    let _ = write!(out, "{}:", trend.month);
    for (i, key) in CategoryKey::ALL.into_iter().enumerate() {
        let sep = if i == 0 { " " } else { ", " };
        let _ = write!(out, "{sep}{} {}", key.label(), format_currency(trend.value(key)));
    }
    out.push('\n');
}
