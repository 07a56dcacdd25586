//! Session state machine: `Landing → Loading → Ready | Error`.
//!
//! DESIGN
//! ======
//! The controller owns every piece of mutable session state and exposes it
//! only through transition methods. Nothing here awaits: each network action
//! is split into a `begin_*` transition that hands out a ticket and a
//! `finish_*` transition that applies the response. Tickets carry the
//! generation (fetch) or epoch (AI streams) current when they were issued;
//! a response whose tag no longer matches is logged and dropped, so a late
//! reply can never overwrite a view that a retry or navigation replaced.
//!
//! A failed refresh keeps the last good dashboard inside `Error` so the view
//! does not blank. Only a failure before any dataset was ever loaded leaves
//! the derived views unavailable.

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

use tracing::{error, info, warn};

use crate::ai::AiSession;
use crate::analytics::{DashboardView, month_comparison, project};
use crate::api::{ApiError, ChatRequest, DatasetType, UploadAck, UploadFile};
use crate::chat::{ChatSession, PendingSend, Submit};
use crate::error::SessionError;
use crate::model::{CategoryKey, DriftDataset};
use crate::upload::{UploadError, UploadForm};

// =============================================================================
// STATE
// =============================================================================

/// A loaded dashboard: the dataset, the selected tab and the AI sub-state.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub dataset: DriftDataset,
    pub tab: CategoryKey,
    pub ai: AiSession,
}

impl Dashboard {
    /// Derived analytics for the current tab, recomputed on every call.
    #[must_use]
    pub fn view(&self) -> Option<DashboardView<'_>> {
        project(&self.dataset, self.tab)
    }
}

#[derive(Debug, Clone)]
pub enum Phase {
    Landing(UploadForm),
    Loading { last_good: Option<Box<Dashboard>> },
    Ready(Box<Dashboard>),
    Error { message: String, last_good: Option<Box<Dashboard>> },
}

impl Phase {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Landing(_) => "landing",
            Self::Loading { .. } => "loading",
            Self::Ready(_) => "ready",
            Self::Error { .. } => "error",
        }
    }
}

// =============================================================================
// TICKETS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    pub epoch: u64,
    pub dataset: DriftDataset,
}

#[derive(Debug, Clone)]
pub struct ComparisonTicket {
    pub epoch: u64,
    pub month: String,
    pub request: ChatRequest,
}

// =============================================================================
// CONTROLLER
// =============================================================================

#[derive(Debug)]
pub struct SessionController {
    phase: Phase,
    fetch_generation: u64,
    next_epoch: u64,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionController {
    #[must_use]
    pub fn new() -> Self {
        Self { phase: Phase::Landing(UploadForm::default()), fetch_generation: 0, next_epoch: 1 }
    }

    #[must_use]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// The dashboard to render: the live one, or the last good one kept
    /// through a reload or a failed refresh.
    #[must_use]
    pub fn dashboard(&self) -> Option<&Dashboard> {
        match &self.phase {
            Phase::Ready(d) => Some(&**d),
            Phase::Loading { last_good } | Phase::Error { last_good, .. } => last_good.as_deref(),
            Phase::Landing(_) => None,
        }
    }

    fn dashboard_mut(&mut self) -> Option<&mut Dashboard> {
        match &mut self.phase {
            Phase::Ready(d) => Some(&mut **d),
            Phase::Loading { last_good } | Phase::Error { last_good, .. } => last_good.as_deref_mut(),
            Phase::Landing(_) => None,
        }
    }

    #[must_use]
    pub fn upload_form(&self) -> Option<&UploadForm> {
        match &self.phase {
            Phase::Landing(form) => Some(form),
            _ => None,
        }
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match &self.phase {
            Phase::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading { .. })
    }

    fn take_epoch(&mut self) -> u64 {
        let epoch = self.next_epoch;
        self.next_epoch += 1;
        epoch
    }

    // -------------------------------------------------------------------------
    // Landing
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// [`SessionError::NotLanding`] outside the landing screen.
    pub fn select_file(&mut self, dataset_type: DatasetType, file: UploadFile) -> Result<(), SessionError> {
        let Phase::Landing(form) = &mut self.phase else {
            return Err(SessionError::NotLanding);
        };
        form.select(dataset_type, file);
        Ok(())
    }

    /// Start an upload sequence and return the files to send in order.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotLanding`], [`SessionError::Busy`] while a sequence is
    /// running, or a missing-file [`UploadError`] (also recorded on the form).
    pub fn begin_upload(&mut self) -> Result<Vec<(DatasetType, UploadFile)>, SessionError> {
        let Phase::Landing(form) = &mut self.phase else {
            return Err(SessionError::NotLanding);
        };
        if form.uploading {
            return Err(SessionError::Busy("upload"));
        }
        match form.ready_files() {
            Ok(files) => {
                form.uploading = true;
                form.error = None;
                Ok(files)
            }
            Err(e) => {
                form.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Apply the outcome of an upload sequence. On success the dashboard
    /// fetch begins; on failure the form keeps its files and shows the error.
    ///
    /// # Errors
    ///
    /// [`SessionError::Upload`] carrying the failure that was recorded.
    pub fn finish_upload(
        &mut self,
        result: Result<Vec<(DatasetType, UploadAck)>, UploadError>,
    ) -> Result<Option<FetchTicket>, SessionError> {
        let Phase::Landing(form) = &mut self.phase else {
            warn!("upload: finished after leaving the landing screen; ignoring");
            return Ok(None);
        };
        form.uploading = false;
        match result {
            Ok(acks) => {
                form.acks = acks;
                Ok(self.enter_loading())
            }
            Err(e) => {
                form.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Skip uploads and fetch the backend's seeded dataset. Suppressed
    /// (returns `None`) while a fetch is already in flight.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotLanding`] outside the landing screen,
    /// [`SessionError::Busy`] while an upload sequence is running.
    pub fn use_demo_data(&mut self) -> Result<Option<FetchTicket>, SessionError> {
        if self.is_loading() {
            return Ok(self.enter_loading());
        }
        let form = self.upload_form().ok_or(SessionError::NotLanding)?;
        if form.uploading {
            return Err(SessionError::Busy("upload"));
        }
        Ok(self.enter_loading())
    }

    // -------------------------------------------------------------------------
    // Fetch
    // -------------------------------------------------------------------------

    /// Explicit reload from `Ready`. Suppressed (returns `None`) while a
    /// fetch is already in flight.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotReady`] from landing or error.
    pub fn reload(&mut self) -> Result<Option<FetchTicket>, SessionError> {
        if !matches!(self.phase, Phase::Ready(_) | Phase::Loading { .. }) {
            return Err(SessionError::NotReady);
        }
        Ok(self.enter_loading())
    }

    /// Retry after a failed fetch.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotReady`] unless the session is in the error phase
    /// (or already loading, which is suppressed).
    pub fn retry(&mut self) -> Result<Option<FetchTicket>, SessionError> {
        if !matches!(self.phase, Phase::Error { .. } | Phase::Loading { .. }) {
            return Err(SessionError::NotReady);
        }
        Ok(self.enter_loading())
    }

    fn enter_loading(&mut self) -> Option<FetchTicket> {
        let last_good = match std::mem::replace(&mut self.phase, Phase::Loading { last_good: None }) {
            Phase::Loading { last_good } => {
                info!("fetch: already in flight; duplicate request suppressed");
                self.phase = Phase::Loading { last_good };
                return None;
            }
            Phase::Ready(dashboard) => Some(dashboard),
            Phase::Error { last_good, .. } => last_good,
            Phase::Landing(_) => None,
        };
        self.phase = Phase::Loading { last_good };
        self.fetch_generation += 1;
        info!(generation = self.fetch_generation, "fetch: started");
        Some(FetchTicket { generation: self.fetch_generation })
    }

    /// Apply a fetch response. `Ok(false)` means the response was stale and
    /// dropped; `Err` means it was applied as the error phase.
    ///
    /// # Errors
    ///
    /// [`SessionError::Fetch`] or [`SessionError::InvalidDataset`].
    pub fn finish_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<DriftDataset, ApiError>,
    ) -> Result<bool, SessionError> {
        if ticket.generation != self.fetch_generation || !self.is_loading() {
            warn!(
                generation = ticket.generation,
                current = self.fetch_generation,
                phase = self.phase.name(),
                "fetch: discarding stale response"
            );
            return Ok(false);
        }
        let Phase::Loading { last_good } = std::mem::replace(&mut self.phase, Phase::Loading { last_good: None }) else {
            return Ok(false);
        };

        let validated = result
            .map_err(SessionError::Fetch)
            .and_then(|dataset| dataset.validate().map_err(SessionError::from));
        match validated {
            Ok(dataset) => {
                info!(generation = ticket.generation, months = dataset.monthly_trends.len(), "fetch: dataset loaded");
                // A dashboard entered from landing gets a fresh chat epoch so
                // replies from a transcript left behind never match it.
                let ai = match last_good {
                    Some(previous) => previous.ai,
                    None => AiSession { chat: ChatSession::new(self.take_epoch()), ..AiSession::default() },
                };
                self.phase = Phase::Ready(Box::new(Dashboard { dataset, tab: CategoryKey::default(), ai }));
                Ok(true)
            }
            Err(e) => {
                error!(error = %e, kept_previous = last_good.is_some(), "fetch: failed");
                self.phase = Phase::Error { message: e.to_string(), last_good };
                Err(e)
            }
        }
    }

    /// Return to the landing screen, dropping the dashboard and transcript.
    /// Any in-flight fetch is invalidated.
    pub fn leave_dashboard(&mut self) {
        if matches!(self.phase, Phase::Landing(_)) {
            return;
        }
        self.fetch_generation += 1;
        info!(from = self.phase.name(), "session: back to landing");
        self.phase = Phase::Landing(UploadForm::default());
    }

    // -------------------------------------------------------------------------
    // Dashboard
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// [`SessionError::NotReady`] without a dashboard.
    pub fn select_tab(&mut self, tab: CategoryKey) -> Result<(), SessionError> {
        let dashboard = self.dashboard_mut().ok_or(SessionError::NotReady)?;
        dashboard.tab = tab;
        Ok(())
    }

    /// # Errors
    ///
    /// [`SessionError::NotReady`] without a dashboard, [`SessionError::Busy`]
    /// while an analysis is running.
    pub fn begin_analysis(&mut self) -> Result<AnalysisTicket, SessionError> {
        let epoch = self.take_epoch();
        let dashboard = self.dashboard_mut().ok_or(SessionError::NotReady)?;
        dashboard.ai.begin_analysis(epoch)?;
        info!(epoch, "analysis: started");
        Ok(AnalysisTicket { epoch, dataset: dashboard.dataset.clone() })
    }

    /// `Ok(false)` when the response was dropped as stale.
    ///
    /// # Errors
    ///
    /// [`SessionError::Analysis`] when the request failed (already applied).
    pub fn finish_analysis(&mut self, epoch: u64, result: Result<String, ApiError>) -> Result<bool, SessionError> {
        let Some(dashboard) = self.dashboard_mut() else {
            warn!(epoch, "analysis: dashboard gone; discarding response");
            return Ok(false);
        };
        dashboard
            .ai
            .finish_analysis(epoch, result)
            .map_err(SessionError::Analysis)
    }

    /// Submit a chat message; see [`crate::chat::ChatSession::submit`].
    ///
    /// # Errors
    ///
    /// [`SessionError::NotReady`] without a dashboard.
    pub fn submit_chat(&mut self, text: &str) -> Result<Submit, SessionError> {
        let dashboard = self.dashboard_mut().ok_or(SessionError::NotReady)?;
        Ok(dashboard.ai.chat.submit(text))
    }

    /// Build the wire request for a pending send, attaching the dataset.
    #[must_use]
    pub fn chat_request(&self, pending: &PendingSend) -> ChatRequest {
        ChatRequest {
            message: pending.message.clone(),
            history: pending.history.clone(),
            drift_data: self.dashboard().map(|d| d.dataset.clone()),
        }
    }

    /// Apply a chat reply; returns the next buffered send, if any.
    pub fn finish_chat(&mut self, epoch: u64, result: Result<String, ApiError>) -> Option<PendingSend> {
        let Some(dashboard) = self.dashboard_mut() else {
            warn!(epoch, "chat: dashboard gone; discarding reply");
            return None;
        };
        dashboard.ai.chat.complete(epoch, result)
    }

    /// Release a chat send whose request will never be completed.
    pub fn abandon_chat(&mut self, epoch: u64) {
        if let Some(dashboard) = self.dashboard_mut() {
            dashboard.ai.chat.abandon(epoch);
        }
    }

    /// Prepare a single-shot month comparison. Fails without issuing any
    /// request when `month` has no predecessor.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotReady`] or [`SessionError::Comparison`].
    pub fn begin_comparison(&mut self, month: &str) -> Result<ComparisonTicket, SessionError> {
        let epoch = self.take_epoch();
        let dashboard = self.dashboard_mut().ok_or(SessionError::NotReady)?;
        let comparison = month_comparison(&dashboard.dataset, month)?;
        dashboard.ai.begin_comparison(epoch, &comparison);
        info!(epoch, month, previous = %comparison.previous_month, "comparison: started");
        let request = ChatRequest {
            message: comparison.prompt,
            history: Vec::new(),
            drift_data: Some(dashboard.dataset.clone()),
        };
        Ok(ComparisonTicket { epoch, month: comparison.month, request })
    }

    /// `Ok(None)` when the response was superseded.
    ///
    /// # Errors
    ///
    /// [`SessionError::ComparisonRequest`] when the request failed (already applied).
    pub fn finish_comparison(
        &mut self,
        epoch: u64,
        result: Result<String, ApiError>,
    ) -> Result<Option<String>, SessionError> {
        let Some(dashboard) = self.dashboard_mut() else {
            warn!(epoch, "comparison: dashboard gone; discarding response");
            return Ok(None);
        };
        dashboard
            .ai
            .finish_comparison(epoch, result)
            .map_err(SessionError::ComparisonRequest)
    }
}
