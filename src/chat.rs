//! Conversational session: append-only transcript with serialized sends.
//!
//! DESIGN
//! ======
//! A send is a two-step commit. [`ChatSession::submit`] appends the user
//! message and hands back the request to issue; [`ChatSession::complete`]
//! appends the reply (or a fixed placeholder) and releases the next queued
//! message. While a request is in flight further messages wait in a FIFO
//! buffer and are neither appended nor sent, so replies can never land out
//! of order.
//!
//! Each session carries an epoch. A completion tagged with another epoch
//! belongs to a transcript that has since been replaced and is dropped.

#[cfg(test)]
#[path = "chat_test.rs"]
mod chat_test;

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::{ApiError, HistoryEntry, WireRole};

/// Placeholder appended when a chat request fails.
pub const CHAT_ERROR_REPLY: &str = "Sorry, I couldn't get a response. Please try again.";

/// Offered while the transcript holds only the seed analysis.
pub const SUGGESTED_PROMPTS: [&str; 4] = [
    "Which category should I cut first?",
    "Why did AI/LLM spend jump?",
    "What are the quickest wins under 30 days?",
    "How much could we save annually if we fix the top drifter?",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// The chat endpoint calls the assistant `model`.
    #[must_use]
    pub fn wire(self) -> WireRole {
        match self {
            Self::User => WireRole::User,
            Self::Assistant => WireRole::Model,
        }
    }
}

/// A single transcript entry. `content` is markdown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(), role, content: content.into() }
    }
}

/// A chat request ready to go on the wire.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingSend {
    pub epoch: u64,
    pub message: String,
    /// Transcript before `message` was appended.
    pub history: Vec<HistoryEntry>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Submit {
    /// Nothing in flight: the user message is appended, issue this request.
    Send(PendingSend),
    /// Buffered behind the in-flight request.
    Queued,
    /// Blank input.
    Ignored,
}

#[derive(Clone, Debug, Default)]
pub struct ChatSession {
    epoch: u64,
    messages: Vec<ChatMessage>,
    queued: VecDeque<String>,
    in_flight: bool,
}

impl ChatSession {
    #[must_use]
    pub fn new(epoch: u64) -> Self {
        Self { epoch, ..Self::default() }
    }

    /// A fresh transcript whose first message is the analysis narrative.
    #[must_use]
    pub fn seeded(epoch: u64, analysis: impl Into<String>) -> Self {
        let mut session = Self::new(epoch);
        session
            .messages
            .push(ChatMessage::new(ChatRole::Assistant, analysis));
        session
    }

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn is_sending(&self) -> bool {
        self.in_flight
    }

    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    /// Suggestion prompts, only before the operator has asked anything.
    #[must_use]
    pub fn suggestions(&self) -> &'static [&'static str] {
        match self.messages.as_slice() {
            [seed] if seed.role == ChatRole::Assistant => &SUGGESTED_PROMPTS,
            _ => &[],
        }
    }

    pub fn submit(&mut self, text: impl Into<String>) -> Submit {
        let text = text.into();
        if text.trim().is_empty() {
            return Submit::Ignored;
        }
        if self.in_flight {
            debug!(epoch = self.epoch, queued = self.queued.len() + 1, "chat: send buffered");
            self.queued.push_back(text);
            return Submit::Queued;
        }
        Submit::Send(self.start(text))
    }

    /// Apply the outcome of the in-flight request and release the next
    /// buffered message, if any.
    pub fn complete(&mut self, epoch: u64, result: Result<String, ApiError>) -> Option<PendingSend> {
        if epoch != self.epoch || !self.in_flight {
            warn!(epoch, current = self.epoch, "chat: discarding reply for a replaced transcript");
            return None;
        }
        let content = match result {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "chat: request failed");
                CHAT_ERROR_REPLY.to_owned()
            }
        };
        self.messages
            .push(ChatMessage::new(ChatRole::Assistant, content));
        self.in_flight = false;

        let next = self.queued.pop_front()?;
        Some(self.start(next))
    }

    /// Give up on the in-flight request without a reply. A placeholder is
    /// appended and buffered messages are dropped, since nobody is left to
    /// send them.
    pub fn abandon(&mut self, epoch: u64) {
        if epoch != self.epoch || !self.in_flight {
            return;
        }
        warn!(epoch, dropped = self.queued.len(), "chat: send abandoned before its reply");
        self.messages
            .push(ChatMessage::new(ChatRole::Assistant, CHAT_ERROR_REPLY));
        self.queued.clear();
        self.in_flight = false;
    }

    fn start(&mut self, text: String) -> PendingSend {
        let history = self
            .messages
            .iter()
            .map(|m| HistoryEntry { role: m.role.wire(), content: m.content.clone() })
            .collect();
        self.messages
            .push(ChatMessage::new(ChatRole::User, text.clone()));
        self.in_flight = true;
        PendingSend { epoch: self.epoch, message: text, history }
    }
}
