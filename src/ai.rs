//! AI sub-state of a loaded dashboard: analysis, chat, month comparison.
//!
//! DESIGN
//! ======
//! The three request streams are independent. Analysis and comparison use a
//! single-slot in-flight guard keyed by epoch; the chat keeps its own
//! serialized queue (see [`crate::chat`]). A fresh analysis replaces the
//! transcript, which also invalidates any chat reply still on the wire.

#[cfg(test)]
#[path = "ai_test.rs"]
mod ai_test;

use tracing::warn;

use crate::analytics::MonthComparison;
use crate::api::ApiError;
use crate::chat::ChatSession;
use crate::error::SessionError;

/// Shown in the summary slot when the analysis request fails.
pub const ANALYSIS_FAILED: &str = "Analysis failed. Please try again.";

const SUMMARY_SENTENCES: usize = 2;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ComparisonState {
    #[default]
    Idle,
    Pending { epoch: u64, month: String },
    Answered { previous_month: String, month: String, text: String },
    Failed { month: String, message: String },
}

#[derive(Clone, Debug, Default)]
pub struct AiSession {
    /// Inline summary: extracted from the last analysis, or [`ANALYSIS_FAILED`].
    pub summary: Option<String>,
    pub chat: ChatSession,
    pub comparison: ComparisonState,
    pub(crate) analysis_epoch: Option<u64>,
    pub(crate) comparison_previous: Option<String>,
}

impl AiSession {
    #[must_use]
    pub fn is_analyzing(&self) -> bool {
        self.analysis_epoch.is_some()
    }

    pub(crate) fn begin_analysis(&mut self, epoch: u64) -> Result<(), SessionError> {
        if self.is_analyzing() {
            return Err(SessionError::Busy("analysis"));
        }
        self.analysis_epoch = Some(epoch);
        Ok(())
    }

    /// `Ok(true)` applied, `Ok(false)` stale and dropped, `Err` applied as a failure.
    pub(crate) fn finish_analysis(&mut self, epoch: u64, result: Result<String, ApiError>) -> Result<bool, ApiError> {
        if self.analysis_epoch != Some(epoch) {
            warn!(epoch, "analysis: discarding stale response");
            return Ok(false);
        }
        self.analysis_epoch = None;
        let dropped = self.chat.queued_len();
        if dropped > 0 {
            warn!(epoch, dropped, "chat: transcript replaced; discarding buffered messages");
        }
        match result {
            Ok(text) => {
                self.summary = Some(extract_summary(&text));
                self.chat = ChatSession::seeded(epoch, text);
                Ok(true)
            }
            Err(e) => {
                self.summary = Some(ANALYSIS_FAILED.to_owned());
                self.chat = ChatSession::new(epoch);
                Err(e)
            }
        }
    }

    pub(crate) fn begin_comparison(&mut self, epoch: u64, comparison: &MonthComparison) {
        self.comparison = ComparisonState::Pending { epoch, month: comparison.month.clone() };
        self.comparison_previous = Some(comparison.previous_month.clone());
    }

    /// `Ok(Some)` answered, `Ok(None)` superseded, `Err` applied as a failure.
    pub(crate) fn finish_comparison(
        &mut self,
        epoch: u64,
        result: Result<String, ApiError>,
    ) -> Result<Option<String>, ApiError> {
        let month = match &self.comparison {
            ComparisonState::Pending { epoch: pending, month } if *pending == epoch => month.clone(),
            _ => {
                warn!(epoch, "comparison: discarding superseded response");
                return Ok(None);
            }
        };
        let previous_month = self.comparison_previous.take().unwrap_or_default();
        match result {
            Ok(text) => {
                self.comparison = ComparisonState::Answered { previous_month, month, text: text.clone() };
                Ok(Some(text))
            }
            Err(e) => {
                self.comparison = ComparisonState::Failed { month, message: e.to_string() };
                Err(e)
            }
        }
    }
}

// =============================================================================
// SUMMARY EXTRACTION
// =============================================================================

/// First sentences of a markdown narrative, headings and inline markup removed.
#[must_use]
pub fn extract_summary(markdown: &str) -> String {
    let prose = markdown
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(strip_markup)
        .collect::<Vec<_>>()
        .join(" ");

    let mut sentences = Vec::with_capacity(SUMMARY_SENTENCES);
    let mut start = 0;
    let mut chars = prose.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }
        let at_boundary = chars.peek().is_none_or(|(_, next)| next.is_whitespace());
        if at_boundary {
            let end = i + ch.len_utf8();
            sentences.push(prose[start..end].trim());
            start = end;
            if sentences.len() == SUMMARY_SENTENCES {
                break;
            }
        }
    }
    if sentences.is_empty() {
        return prose.trim().to_owned();
    }
    sentences.join(" ")
}

fn strip_markup(line: &str) -> String {
    let body = ["* ", "- ", "+ ", "> "]
        .iter()
        .find_map(|marker| line.strip_prefix(marker))
        .unwrap_or(line);
    body.replace("**", "")
        .replace("__", "")
        .replace('`', "")
}
