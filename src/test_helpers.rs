//! Shared fixtures for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::api::{ApiError, ChatRequest, DatasetType, DriftApi, HealthStatus, UploadAck, UploadFile};
use crate::model::{Category, CategoryKey, DriftDataset, Item, MonthlyTrend};

pub fn item(name: &str, avg_before: f64, avg_after: f64, drift_pct: f64) -> Item {
    Item {
        item: name.to_owned(),
        category: None,
        avg_before,
        avg_after,
        drift: avg_after - avg_before,
        drift_pct,
    }
}

pub fn category(key: CategoryKey, total_drift: f64, drift_pct: f64, items: Vec<Item>) -> Category {
    Category {
        category: key,
        label: key.label().to_owned(),
        total_drift,
        total_before: 0.0,
        total_after: 0.0,
        drift_pct,
        items,
    }
}

pub fn trend(month: &str, people: f64, ai_llm: f64, saas_cloud: f64) -> MonthlyTrend {
    MonthlyTrend { month: month.to_owned(), people, ai_llm, saas_cloud }
}

/// Three categories, four months. `people` is up, `saas_cloud` is down.
pub fn sample_dataset() -> DriftDataset {
    DriftDataset {
        total_monthly_drift: 12345.6,
        annualized_drift: 148_147.2,
        categories: vec![
            category(
                CategoryKey::People,
                5000.0,
                12.3,
                vec![
                    item("Engineering - Contractor", 10_000.0, 14_000.0, 40.0),
                    item("Sales - FTE", 20_000.0, 21_500.0, 7.5),
                    item("Support - FTE", 9_000.0, 8_500.0, -5.6),
                ],
            ),
            category(
                CategoryKey::AiLlm,
                7545.6,
                88.0,
                vec![
                    item("ML - OpenAI GPT-4", 3_000.0, 9_000.0, 200.0),
                    item("Support - Anthropic Claude", 1_000.0, 2_545.6, 154.56),
                ],
            ),
            category(
                CategoryKey::SaasCloud,
                -200.0,
                -4.0,
                vec![
                    item("Figma", 1_000.0, 450.0, -55.0),
                    item("AWS", 4_000.0, 4_350.0, 8.75),
                ],
            ),
        ],
        monthly_trends: vec![
            trend("2025-01", 39_000.4, 4_000.0, 5_000.0),
            trend("2025-02", 39_100.0, 4_100.0, 5_000.0),
            trend("2025-03", 43_600.0, 11_200.0, 4_850.0),
            trend("2025-04", 44_000.6, 11_545.5, 4_800.0),
        ],
    }
}

// =============================================================================
// MockApi
// =============================================================================

pub const SAMPLE_ANALYSIS: &str = "### 🚨 Analysis: What Happened & Why\n\
AI/LLM usage more than doubled. Contractor spend in Engineering grew 40%. \
SaaS is flat.\n\n### ⚡ Strategic Recommendations\n* **Cap GPT-4 usage**: route to cheaper models.";

/// Backend call, in the order it was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fetch,
    Upload(DatasetType),
    Analyze,
    Chat(String),
    Health,
    Reset,
}

/// In-memory backend. Every call yields once before answering so
/// concurrently polled futures interleave the way network calls do.
#[derive(Default)]
pub struct MockApi {
    pub calls: Mutex<Vec<Call>>,
    pub chat_requests: Mutex<Vec<ChatRequest>>,
    pub fetch_results: Mutex<VecDeque<Result<DriftDataset, ApiError>>>,
    pub analyze_results: Mutex<VecDeque<Result<String, ApiError>>>,
    pub chat_results: Mutex<VecDeque<Result<String, ApiError>>>,
    pub fail_upload: Mutex<Option<DatasetType>>,
}

impl MockApi {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn push_fetch(&self, result: Result<DriftDataset, ApiError>) {
        self.fetch_results.lock().unwrap().push_back(result);
    }

    pub fn push_analyze(&self, result: Result<String, ApiError>) {
        self.analyze_results.lock().unwrap().push_back(result);
    }

    pub fn push_chat(&self, result: Result<String, ApiError>) {
        self.chat_results.lock().unwrap().push_back(result);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

pub fn server_error() -> ApiError {
    ApiError::Status { status: 500, body: "boom".into() }
}

#[async_trait::async_trait]
impl DriftApi for MockApi {
    async fn fetch_drift(&self) -> Result<DriftDataset, ApiError> {
        self.record(Call::Fetch);
        tokio::task::yield_now().await;
        let next = self.fetch_results.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(sample_dataset()))
    }

    async fn upload(&self, dataset_type: DatasetType, file: &UploadFile) -> Result<UploadAck, ApiError> {
        self.record(Call::Upload(dataset_type));
        tokio::task::yield_now().await;
        if *self.fail_upload.lock().unwrap() == Some(dataset_type) {
            return Err(server_error());
        }
        Ok(UploadAck { filename: file.file_name.clone(), rows: 3, columns: vec!["month".into()], sample: Vec::new() })
    }

    async fn analyze(&self, _dataset: &DriftDataset) -> Result<String, ApiError> {
        self.record(Call::Analyze);
        tokio::task::yield_now().await;
        let next = self.analyze_results.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(SAMPLE_ANALYSIS.to_owned()))
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String, ApiError> {
        self.record(Call::Chat(request.message.clone()));
        self.chat_requests.lock().unwrap().push(request.clone());
        tokio::task::yield_now().await;
        let next = self.chat_results.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(format!("reply to {}", request.message)))
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.record(Call::Health);
        Ok(HealthStatus { status: "ok".into(), datasets_loaded: vec!["payroll".into()] })
    }

    async fn reset(&self) -> Result<(), ApiError> {
        self.record(Call::Reset);
        Ok(())
    }
}

pub fn csv(name: &str) -> UploadFile {
    UploadFile::new(name, b"month,total\n2025-01,100\n".to_vec())
}
