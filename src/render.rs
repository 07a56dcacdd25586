//! Plain-text rendering of session state for the terminal.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::fmt::Write;

use crate::ai::{AiSession, ComparisonState};
use crate::analytics::SeverityBand;
use crate::chat::{ChatMessage, ChatRole};
use crate::format::{format_currency, format_signed_currency};
use crate::model::CategoryKey;
use crate::session::{Dashboard, Phase, SessionController};
use crate::upload::UploadForm;

const BAR_CELLS: f64 = 20.0;

/// Render whichever screen the controller is on.
#[must_use]
pub fn render(controller: &SessionController) -> String {
    match controller.phase() {
        Phase::Landing(form) => render_landing(form),
        Phase::Loading { last_good: None } => "Loading drift data...\n".to_owned(),
        Phase::Error { message, last_good: None } => format!("Error: {message}\nRetry to load the dashboard.\n"),
        Phase::Loading { last_good: Some(dashboard) } => {
            format!("(refreshing)\n{}", render_dashboard(dashboard))
        }
        Phase::Error { message, last_good: Some(dashboard) } => {
            format!("Refresh failed: {message}\n{}", render_dashboard(dashboard))
        }
        Phase::Ready(dashboard) => render_dashboard(dashboard),
    }
}

#[must_use]
pub fn render_landing(form: &UploadForm) -> String {
    let mut out = String::from("Upload your spend data\n");
    for slot in form.slots() {
        let file = slot
            .file
            .as_ref()
            .map_or("(none)", |f| f.file_name.as_str());
        let _ = writeln!(out, "  {:<10} {file}", slot.dataset_type.as_str());
    }
    for (dataset_type, ack) in &form.acks {
        let _ = writeln!(out, "  uploaded {dataset_type}: {} ({} rows)", ack.filename, ack.rows);
    }
    if form.uploading {
        out.push_str("Uploading...\n");
    }
    if let Some(error) = &form.error {
        let _ = writeln!(out, "Error: {error}");
    }
    out
}

#[must_use]
pub fn render_dashboard(dashboard: &Dashboard) -> String {
    let mut out = String::new();
    let Some(view) = dashboard.view() else {
        out.push_str("No categories in dataset.\n");
        return out;
    };

    let _ = writeln!(out, "Monthly drift:    {}", view.total_monthly_label);
    let _ = writeln!(out, "Annualized drift: {}", view.annualized_label);
    out.push('\n');

    let tabs = CategoryKey::ALL
        .iter()
        .map(|key| {
            if *key == view.tab { format!("[{}]", key.label()) } else { format!(" {} ", key.label()) }
        })
        .collect::<Vec<_>>()
        .join(" ");
    let _ = writeln!(out, "{tabs}");

    let arrow = if view.is_increase { "up" } else { "down" };
    let _ = writeln!(
        out,
        "{}: {} ({}, {arrow})",
        view.category.display_label(),
        view.category_drift_label,
        view.category_pct_label
    );
    if let Some(top) = view.top_drifter {
        let _ = writeln!(out, "Biggest drifter: {} {}", top.item, format_signed_currency(top.drift));
    }
    out.push('\n');

    for row in &view.rows {
        let _ = writeln!(
            out,
            "{} {:<32} {:>10} -> {:>10} {:>10} {:>8} {}",
            band_marker(row.band),
            row.item.item,
            format_currency(row.item.avg_before),
            format_currency(row.item.avg_after),
            row.drift_label,
            row.drift_pct_label,
            bar(row.bar_width)
        );
    }

    out.push('\n');
    render_trends(&mut out, dashboard);
    render_ai(&mut out, &dashboard.ai);
    out
}

fn render_trends(out: &mut String, dashboard: &Dashboard) {
    let _ = writeln!(out, "{:<8} {:>10} {:>10} {:>10}", "month", "People", "AI/LLM", "SaaS/Cloud");
    for trend in &dashboard.dataset.monthly_trends {
        let _ = writeln!(
            out,
            "{:<8} {:>10} {:>10} {:>10}",
            trend.month,
            format_currency(trend.people),
            format_currency(trend.ai_llm),
            format_currency(trend.saas_cloud)
        );
    }
}

fn render_ai(out: &mut String, ai: &AiSession) {
    if ai.is_analyzing() {
        out.push_str("\nAnalyzing...\n");
    }
    if let Some(summary) = &ai.summary {
        let _ = writeln!(out, "\nSummary: {summary}");
    }
    match &ai.comparison {
        ComparisonState::Idle => {}
        ComparisonState::Pending { month, .. } => {
            let _ = writeln!(out, "\nComparing {month}...");
        }
        ComparisonState::Answered { previous_month, month, text } => {
            let _ = writeln!(out, "\n{month} vs {previous_month}:\n{text}");
        }
        ComparisonState::Failed { month, message } => {
            let _ = writeln!(out, "\nComparison for {month} failed: {message}");
        }
    }
    if !ai.chat.messages().is_empty() {
        out.push('\n');
        out.push_str(&render_transcript(ai.chat.messages()));
    }
    for prompt in ai.chat.suggestions() {
        let _ = writeln!(out, "  try: {prompt}");
    }
}

#[must_use]
pub fn render_transcript(messages: &[ChatMessage]) -> String {
    let mut out = String::new();
    for message in messages {
        let who = match message.role {
            ChatRole::User => "you",
            ChatRole::Assistant => "assistant",
        };
        let _ = writeln!(out, "{who}> {}", message.content);
    }
    out
}

fn band_marker(band: SeverityBand) -> char {
    match band {
        SeverityBand::Strong => '!',
        SeverityBand::Weak => '*',
        SeverityBand::None => ' ',
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bar(width_pct: f64) -> String {
    let cells = (width_pct / 100.0 * BAR_CELLS).round().clamp(0.0, BAR_CELLS) as usize;
    "#".repeat(cells)
}
