//! Async driver: runs controller transitions against a [`DriftApi`].
//!
//! DESIGN
//! ======
//! The controller sits behind a `std::sync::Mutex` that is only ever held
//! for a single synchronous transition, never across an await. Several
//! operations may therefore run concurrently on one [`Session`] (a chat send
//! while an analysis is pending, a tab switch while a reload is in flight);
//! the controller's tickets decide which responses still apply.
//!
//! Chat sends are drained by whichever caller found the stream idle: later
//! callers only buffer their message and return.

#[cfg(test)]
#[path = "driver_test.rs"]
mod driver_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use super::controller::{FetchTicket, SessionController};
use crate::api::{ApiError, DatasetType, DriftApi, HealthStatus, UploadFile};
use crate::chat::Submit;
use crate::error::SessionError;
use crate::model::CategoryKey;
use crate::upload::upload_all;

#[derive(Clone)]
pub struct Session {
    api: Arc<dyn DriftApi>,
    state: Arc<Mutex<SessionController>>,
}

impl Session {
    #[must_use]
    pub fn new(api: Arc<dyn DriftApi>) -> Self {
        Self { api, state: Arc::new(Mutex::new(SessionController::new())) }
    }

    fn lock(&self) -> MutexGuard<'_, SessionController> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Read the current state, e.g. to render it.
    pub fn read<R>(&self, f: impl FnOnce(&SessionController) -> R) -> R {
        f(&self.lock())
    }

    // =========================================================================
    // LANDING
    // =========================================================================

    /// # Errors
    ///
    /// [`SessionError::NotLanding`] outside the landing screen.
    pub fn select_file(&self, dataset_type: DatasetType, file: UploadFile) -> Result<(), SessionError> {
        self.lock().select_file(dataset_type, file)
    }

    /// Upload the three selected files in order, then load the dashboard.
    ///
    /// # Errors
    ///
    /// The first upload or fetch failure; it is also reflected in the state.
    pub async fn upload_and_load(&self) -> Result<(), SessionError> {
        let files = self.lock().begin_upload()?;
        let result = upload_all(self.api.as_ref(), &files).await;
        let ticket = self.lock().finish_upload(result)?;
        self.run_fetch(ticket).await
    }

    /// # Errors
    ///
    /// See [`SessionController::use_demo_data`] and [`Self::upload_and_load`].
    pub async fn load_demo(&self) -> Result<(), SessionError> {
        let ticket = self.lock().use_demo_data()?;
        self.run_fetch(ticket).await
    }

    // =========================================================================
    // FETCH
    // =========================================================================

    /// # Errors
    ///
    /// [`SessionError::NotReady`] outside the error phase, or the fetch failure.
    pub async fn retry(&self) -> Result<(), SessionError> {
        let ticket = self.lock().retry()?;
        self.run_fetch(ticket).await
    }

    /// # Errors
    ///
    /// [`SessionError::NotReady`] without a dashboard, or the fetch failure.
    pub async fn reload(&self) -> Result<(), SessionError> {
        let ticket = self.lock().reload()?;
        self.run_fetch(ticket).await
    }

    async fn run_fetch(&self, ticket: Option<FetchTicket>) -> Result<(), SessionError> {
        let Some(ticket) = ticket else {
            return Ok(());
        };
        let result = self.api.fetch_drift().await;
        let applied = self.lock().finish_fetch(ticket, result)?;
        if !applied {
            info!("fetch: response superseded");
        }
        Ok(())
    }

    pub fn leave_dashboard(&self) {
        self.lock().leave_dashboard();
    }

    // =========================================================================
    // DASHBOARD
    // =========================================================================

    /// # Errors
    ///
    /// [`SessionError::NotReady`] without a dashboard.
    pub fn select_tab(&self, tab: CategoryKey) -> Result<(), SessionError> {
        self.lock().select_tab(tab)
    }

    /// Request the narrative analysis; on success it seeds a fresh transcript.
    ///
    /// # Errors
    ///
    /// [`SessionError::Busy`] while one is pending, or the request failure.
    pub async fn analyze(&self) -> Result<(), SessionError> {
        let ticket = self.lock().begin_analysis()?;
        info!(epoch = ticket.epoch, "analysis: requesting");
        let result = self.api.analyze(&ticket.dataset).await;
        self.lock().finish_analysis(ticket.epoch, result)?;
        Ok(())
    }

    /// Send a chat message. If another send is in flight the message is
    /// buffered and this call returns immediately; the in-flight caller
    /// delivers it once the earlier reply has landed.
    ///
    /// Poll the returned future to completion. If it is dropped mid-request
    /// the send is abandoned: a placeholder reply is appended and any
    /// messages buffered behind it are discarded.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotReady`] without a dashboard. Request failures are
    /// shown in the transcript, not returned.
    pub async fn send_chat(&self, text: &str) -> Result<(), SessionError> {
        let submit = self.lock().submit_chat(text)?;
        let Submit::Send(mut pending) = submit else {
            return Ok(());
        };
        let mut flight = ChatFlight { session: self, epoch: pending.epoch, armed: true };
        loop {
            let request = self.lock().chat_request(&pending);
            let result = self.api.chat(&request).await;
            let next = self.lock().finish_chat(pending.epoch, result);
            match next {
                Some(queued) => pending = queued,
                None => {
                    flight.armed = false;
                    return Ok(());
                }
            }
        }
    }

    /// Ask the model to explain `month` against its predecessor.
    ///
    /// # Errors
    ///
    /// [`SessionError::Comparison`] when `month` has no predecessor (no
    /// request is issued), or the request failure.
    pub async fn compare_month(&self, month: &str) -> Result<Option<String>, SessionError> {
        let ticket = self.lock().begin_comparison(month)?;
        let result = self.api.chat(&ticket.request).await;
        let answer = self.lock().finish_comparison(ticket.epoch, result)?;
        if answer.is_none() {
            warn!(month = %ticket.month, "comparison: superseded before it answered");
        }
        Ok(answer)
    }

    // =========================================================================
    // BACKEND
    // =========================================================================

    /// # Errors
    ///
    /// The request failure.
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.api.health().await
    }

    /// Restore the backend's demo datasets.
    ///
    /// # Errors
    ///
    /// The request failure.
    pub async fn reset(&self) -> Result<(), ApiError> {
        self.api.reset().await?;
        info!("backend: demo data restored");
        Ok(())
    }
}

/// Releases the chat stream if a `send_chat` future is dropped mid-request.
struct ChatFlight<'a> {
    session: &'a Session,
    epoch: u64,
    armed: bool,
}

impl Drop for ChatFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.session.lock().abandon_chat(self.epoch);
        }
    }
}
