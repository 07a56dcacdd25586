use super::*;
use crate::test_helpers::{item, sample_dataset, trend};

// =============================================================
// CategoryKey
// =============================================================

#[test]
fn category_key_wire_names() {
    assert_eq!(serde_json::to_string(&CategoryKey::AiLlm).unwrap(), "\"ai_llm\"");
    assert_eq!(serde_json::from_str::<CategoryKey>("\"saas_cloud\"").unwrap(), CategoryKey::SaasCloud);
    assert_eq!("people".parse::<CategoryKey>().unwrap(), CategoryKey::People);
    assert!(matches!("payroll".parse::<CategoryKey>(), Err(DatasetError::UnknownCategory(_))));
}

#[test]
fn category_key_default_is_people() {
    assert_eq!(CategoryKey::default(), CategoryKey::People);
}

// =============================================================
// Deserialization
// =============================================================

#[test]
fn dataset_parses_backend_payload() {
    let json = serde_json::json!({
        "total_monthly_drift": 100.0,
        "annualized_drift": 1200.0,
        "categories": [
            {"category": "people", "label": "People", "total_drift": 50.0, "total_before": 10.0,
             "total_after": 60.0, "drift_pct": 500.0,
             "items": [{"item": "Eng - FTE", "category": "people", "avg_before": 10.0,
                        "avg_after": 60.0, "drift": 50.0, "drift_pct": 500.0}]},
            {"category": "ai_llm", "total_drift": 25.0, "drift_pct": 5.0, "items": []},
            {"category": "saas_cloud", "total_drift": 25.0, "drift_pct": 5.0, "items": []}
        ],
        "monthly_trends": [{"month": "2025-01", "people": 1.0, "ai_llm": 2.0, "saas_cloud": 3.0}]
    });
    let ds: DriftDataset = serde_json::from_value(json).unwrap();
    let ds = ds.validate().unwrap();
    assert_eq!(ds.categories.len(), 3);
    assert_eq!(ds.categories[0].items[0].category, Some(CategoryKey::People));
    assert_eq!(ds.category(CategoryKey::AiLlm).unwrap().display_label(), "AI/LLM");
    assert_eq!(ds.monthly_trends[0].value(CategoryKey::SaasCloud), 3.0);
}

// =============================================================
// validate
// =============================================================

#[test]
fn validate_accepts_well_formed_dataset() {
    let ds = sample_dataset();
    assert_eq!(ds.clone().validate().unwrap(), ds);
}

#[test]
fn validate_rejects_missing_category() {
    let mut ds = sample_dataset();
    ds.categories.retain(|c| c.category != CategoryKey::AiLlm);
    assert_eq!(ds.validate().unwrap_err(), DatasetError::MissingCategory(CategoryKey::AiLlm));
}

#[test]
fn validate_rejects_duplicate_category() {
    let mut ds = sample_dataset();
    let dup = ds.categories[2].clone();
    ds.categories.push(dup);
    assert_eq!(ds.validate().unwrap_err(), DatasetError::DuplicateCategory(CategoryKey::SaasCloud));
}

#[test]
fn validate_resorts_items_by_absolute_drift() {
    let mut ds = sample_dataset();
    ds.categories[0].items = vec![
        item("small", 100.0, 110.0, 10.0),
        item("big decrease", 1000.0, 100.0, -90.0),
        item("medium", 100.0, 300.0, 200.0),
    ];
    let ds = ds.validate().unwrap();
    let names: Vec<&str> = ds.categories[0].items.iter().map(|i| i.item.as_str()).collect();
    assert_eq!(names, ["big decrease", "medium", "small"]);
}

#[test]
fn validate_keeps_order_of_equal_drifts() {
    let mut ds = sample_dataset();
    ds.categories[0].items = vec![
        item("first", 100.0, 150.0, 50.0),
        item("second", 150.0, 100.0, -33.3),
    ];
    let ds = ds.validate().unwrap();
    assert_eq!(ds.categories[0].items[0].item, "first");
}

#[test]
fn validate_sorts_months_ascending() {
    let mut ds = sample_dataset();
    ds.monthly_trends.reverse();
    let ds = ds.validate().unwrap();
    let months: Vec<&str> = ds.monthly_trends.iter().map(|t| t.month.as_str()).collect();
    assert_eq!(months, ["2025-01", "2025-02", "2025-03", "2025-04"]);
}

#[test]
fn validate_rejects_duplicate_month() {
    let mut ds = sample_dataset();
    ds.monthly_trends.push(trend("2025-02", 0.0, 0.0, 0.0));
    assert_eq!(ds.validate().unwrap_err(), DatasetError::DuplicateMonth("2025-02".into()));
}

#[test]
fn validate_rejects_malformed_month() {
    for bad in ["2025-1", "2025/01", "2025-13", "25-01-01", "abcd-ef"] {
        let mut ds = sample_dataset();
        ds.monthly_trends[0].month = bad.to_owned();
        assert_eq!(ds.validate().unwrap_err(), DatasetError::InvalidMonth(bad.into()), "{bad}");
    }
}

#[test]
fn trend_index_finds_month() {
    let ds = sample_dataset();
    assert_eq!(ds.trend_index("2025-01"), Some(0));
    assert_eq!(ds.trend_index("2025-04"), Some(3));
    assert_eq!(ds.trend_index("2024-12"), None);
}
