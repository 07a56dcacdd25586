use super::*;

// =============================================================
// format_currency
// =============================================================

#[test]
fn currency_groups_thousands() {
    assert_eq!(format_currency(5000.0), "$5,000");
    assert_eq!(format_currency(1_234_567.0), "$1,234,567");
    assert_eq!(format_currency(999.0), "$999");
    assert_eq!(format_currency(0.0), "$0");
}

#[test]
fn currency_rounds_and_drops_sign() {
    assert_eq!(format_currency(12345.6), "$12,346");
    assert_eq!(format_currency(-200.0), "$200");
    assert_eq!(format_currency(-1499.5), "$1,500");
    assert_eq!(format_currency(0.4), "$0");
}

#[test]
fn currency_treats_non_finite_as_zero() {
    assert_eq!(format_currency(f64::NAN), "$0");
    assert_eq!(format_currency(f64::INFINITY), "$0");
}

// =============================================================
// format_signed_percent
// =============================================================

#[test]
fn percent_has_one_decimal_and_sign() {
    assert_eq!(format_signed_percent(12.3), "+12.3%");
    assert_eq!(format_signed_percent(-4.0), "-4.0%");
    assert_eq!(format_signed_percent(33.333), "+33.3%");
    assert_eq!(format_signed_percent(-55.0), "-55.0%");
}

#[test]
fn percent_zero_renders_positive() {
    assert_eq!(format_signed_percent(0.0), "+0.0%");
    assert_eq!(format_signed_percent(-0.0), "+0.0%");
}

#[test]
fn percent_plus_prefix_iff_non_negative() {
    let samples = [-1000.0, -55.0, -0.5, -0.01, 0.0, 0.01, 0.04, 1.0, 20.0, 50.0, 99.99, 1e6];
    for n in samples {
        let s = format_signed_percent(n);
        assert_eq!(s.starts_with('+'), n >= 0.0, "value {n} rendered {s}");
        assert!(s.ends_with('%'));
    }
}

#[test]
fn percent_non_finite_is_zero() {
    assert_eq!(format_signed_percent(f64::NAN), "+0.0%");
}

// =============================================================
// format_signed_currency
// =============================================================

#[test]
fn signed_currency_prefixes_direction() {
    assert_eq!(format_signed_currency(5000.0), "+$5,000");
    assert_eq!(format_signed_currency(-200.0), "-$200");
    assert_eq!(format_signed_currency(0.0), "+$0");
}
