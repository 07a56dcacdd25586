//! PayDrift client: drift dashboard, AI analysis and chat over the drift backend.
//!
//! SYSTEM CONTEXT
//! ==============
//! The backend ingests payroll, AI-cost and SaaS/cloud spend, computes drift
//! and proxies the language model. This crate consumes that HTTP contract:
//! `api` talks to it, `session` sequences every user action against it, and
//! `analytics`/`render` derive what the operator sees from the dataset.

pub mod ai;
pub mod analytics;
pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod render;
pub mod session;
pub mod upload;

#[cfg(test)]
mod test_helpers;
