//! Display formatting for drift figures.
//!
//! DESIGN
//! ======
//! Pure string builders used by the dashboard projection. They fail closed:
//! a non-finite input is logged and rendered as zero instead of poisoning
//! the whole view.

#[cfg(test)]
#[path = "format_test.rs"]
mod format_test;

use tracing::warn;

fn finite_or_zero(n: f64, what: &'static str) -> f64 {
    if n.is_finite() {
        n
    } else {
        warn!(value = %n, what, "non-finite drift value; rendering as zero");
        0.0
    }
}

/// Group an unsigned integer with `,` every three digits.
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// `"$"` followed by the rounded magnitude with thousands separators.
///
/// The sign is never encoded; callers prefix `+`/`-` from the direction
/// (see [`format_signed_currency`]).
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_currency(n: f64) -> String {
    let n = finite_or_zero(n, "currency");
    let whole = n.abs().round() as u64;
    format!("${}", group_thousands(whole))
}

/// One decimal place, `+` prefixed for every value `>= 0` (so `0` renders
/// as `+0.0%`).
#[must_use]
pub fn format_signed_percent(n: f64) -> String {
    let n = finite_or_zero(n, "percent");
    if n == 0.0 {
        // Covers -0.0, which `{:.1}` would print as "-0.0".
        return "+0.0%".to_owned();
    }
    let sign = if n >= 0.0 { "+" } else { "" };
    format!("{sign}{n:.1}%")
}

/// Currency with an explicit direction prefix: `+$5,000` / `-$200`.
#[must_use]
pub fn format_signed_currency(n: f64) -> String {
    let n = finite_or_zero(n, "currency");
    let sign = if n >= 0.0 { '+' } else { '-' };
    format!("{sign}{}", format_currency(n))
}
