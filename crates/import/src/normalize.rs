//! Field normalizers shared by every extractor. None of these fail: a value
//! that cannot be normalized falls back (dates pass through, amounts become
//! zero) and the row-level checks decide whether the row survives.

use finflow_core::Money;
use rust_decimal::Decimal;
use std::str::FromStr;

const CURRENCY_SYMBOLS: &[&str] = &["R$", "r$", "US$", "us$", "$", "€", "£"];

re!(re_iso_date, r"^\d{4}-\d{2}-\d{2}$");
re!(re_day_first_long, r"^(\d{1,2})-(\d{1,2})-(\d{4})$");
re!(re_year_first, r"^(\d{4})-(\d{1,2})-(\d{1,2})");
re!(re_day_first_short, r"^(\d{1,2})-(\d{1,2})-(\d{2})$");

/// Parses a statement amount.
///
/// A comma anywhere marks it as the decimal separator and every dot is
/// dropped as a thousands separator. Accounting parentheses negate.
pub fn parse_amount(raw: &str) -> Money {
    let mut s = raw.trim().to_string();
    for symbol in CURRENCY_SYMBOLS {
        s = s.replace(symbol, "");
    }
    s.retain(|c| !c.is_whitespace());

    let (negative, body) = match s.strip_prefix('(').and_then(|b| b.strip_suffix(')')) {
        Some(inner) => (true, inner.to_string()),
        None => (false, s),
    };

    let body = if body.contains(',') {
        body.replace('.', "").replacen(',', ".", 1)
    } else {
        body
    };
    let body = body.strip_prefix('+').unwrap_or(&body);

    match Decimal::from_str(body) {
        Ok(value) if negative => -Money::from_decimal(value),
        Ok(value) => Money::from_decimal(value),
        Err(_) => Money::zero(),
    }
}

/// Normalizes a statement date to `YYYY-MM-DD`.
///
/// Accepts ISO dates (optionally followed by a time), `DD-MM-YYYY` and
/// `DD-MM-YY`, with `/` or `-` separators. Two-digit years pivot at 50:
/// below is 20YY, 50 and above is 19YY. Anything else is returned unchanged.
pub fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if re_iso_date().is_match(trimmed) {
        return trimmed.to_string();
    }

    let s = trimmed.replace('/', "-");

    if let Some(c) = re_day_first_long().captures(&s) {
        return format!("{}-{:0>2}-{:0>2}", &c[3], &c[2], &c[1]);
    }

    if let Some(c) = re_year_first().captures(&s) {
        return format!("{}-{:0>2}-{:0>2}", &c[1], &c[2], &c[3]);
    }

    if let Some(c) = re_day_first_short().captures(&s) {
        let yy: u32 = c[3].parse().unwrap_or_default();
        let century = if yy < 50 { "20" } else { "19" };
        return format!("{century}{}-{:0>2}-{:0>2}", &c[3], &c[2], &c[1]);
    }

    trimmed.to_string()
}

/// True when `date` has the normalized `YYYY-MM-DD` shape.
pub fn is_iso_date(date: &str) -> bool {
    re_iso_date().is_match(date)
}

/// Lower-cases, trims and collapses internal whitespace runs to one space.
pub fn canonical_text(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── parse_amount ──────────────────────────────────────────────────────────

    #[test]
    fn parse_amount_plain() {
        assert_eq!(parse_amount("123.45"), Money::from_cents(12345));
        assert_eq!(parse_amount("-45.90"), Money::from_cents(-4590));
    }

    #[test]
    fn parse_amount_comma_decimal() {
        assert_eq!(parse_amount("150,00"), Money::from_cents(15000));
        assert_eq!(parse_amount("-45,90"), Money::from_cents(-4590));
    }

    #[test]
    fn parse_amount_dots_are_thousands_when_comma_present() {
        assert_eq!(parse_amount("1.234,56"), Money::from_cents(123456));
        assert_eq!(parse_amount("12.345.678,90"), Money::from_cents(1_234_567_890));
    }

    #[test]
    fn parse_amount_strips_currency_and_spaces() {
        assert_eq!(parse_amount("R$ 1.500,00"), Money::from_cents(150000));
        assert_eq!(parse_amount("R$ -20,00"), Money::from_cents(-2000));
        assert_eq!(parse_amount("$99.99"), Money::from_cents(9999));
        assert_eq!(parse_amount(" 7 "), Money::from_cents(700));
    }

    #[test]
    fn parse_amount_accounting_parens() {
        assert_eq!(parse_amount("(75.25)"), Money::from_cents(-7525));
    }

    #[test]
    fn parse_amount_explicit_plus() {
        assert_eq!(parse_amount("+10,50"), Money::from_cents(1050));
    }

    #[test]
    fn parse_amount_unparseable_is_zero() {
        assert_eq!(parse_amount(""), Money::zero());
        assert_eq!(parse_amount("n/a"), Money::zero());
    }

    // ── normalize_date ────────────────────────────────────────────────────────

    #[test]
    fn normalize_date_iso_passes_through() {
        assert_eq!(normalize_date("2024-01-15"), "2024-01-15");
    }

    #[test]
    fn normalize_date_iso_with_time() {
        assert_eq!(normalize_date("2024-01-15T10:30:00"), "2024-01-15");
        assert_eq!(normalize_date("2024/1/5"), "2024-01-05");
    }

    #[test]
    fn normalize_date_day_first() {
        assert_eq!(normalize_date("15/01/2024"), "2024-01-15");
        assert_eq!(normalize_date("5-1-2024"), "2024-01-05");
    }

    #[test]
    fn normalize_date_two_digit_year_pivot() {
        assert_eq!(normalize_date("15/01/24"), "2024-01-15");
        assert_eq!(normalize_date("15/01/49"), "2049-01-15");
        assert_eq!(normalize_date("15/01/50"), "1950-01-15");
        assert_eq!(normalize_date("15/01/99"), "1999-01-15");
    }

    #[test]
    fn normalize_date_unrecognized_is_unchanged() {
        assert_eq!(normalize_date("Jan 15, 2024"), "Jan 15, 2024");
        assert_eq!(normalize_date(""), "");
    }

    #[test]
    fn is_iso_date_shape() {
        assert!(is_iso_date("2024-01-15"));
        assert!(!is_iso_date("15/01/2024"));
    }

    // ── canonical_text ────────────────────────────────────────────────────────

    #[test]
    fn canonical_text_collapses_whitespace() {
        assert_eq!(canonical_text("  Market   Central \t"), "market central");
    }
}
