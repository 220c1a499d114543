// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Token Economy Simulation Suite - Input Adapter

//! Adapter layer: turns loosely formatted command text into validated
//! numbers, and converts between the engine's f64 world and `Decimal` where
//! exact arithmetic matters (contest splits).
//!
//! Accepted formats: surrounding and embedded spaces, `_` and `'` digit
//! grouping, `,` or `.` thousands separators and a `,` decimal point.
//! With both `,` and `.` present, whichever comes last is the decimal point.
//! A lone `,` is a thousands separator only when followed by exactly three
//! digits after a non-zero group of one to three digits (`1,000`);
//! otherwise it is a decimal point (`1,5`, `0,003`).

use std::str::FromStr;

use num_traits::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::error::{Result, SimError};

/// Convert f64 to Decimal (lossy but sufficient for simulation).
pub fn to_decimal(v: f64) -> Decimal {
    Decimal::from_f64(v).unwrap_or(Decimal::ZERO)
}

/// Convert Decimal to f64.
pub fn from_decimal(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(0.0)
}

fn is_thousands_group(head: &str, tail: &str) -> bool {
    tail.len() == 3
        && (1..=3).contains(&head.trim_start_matches('-').len())
        && !head.trim_start_matches('-').starts_with('0')
}

/// Canonical `[-]digits[.digits]` form of `raw`, or `None` if nothing
/// numeric remains.
pub fn normalize_number(raw: &str) -> Option<String> {
    let s: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '\'')
        .collect();
    if s.is_empty() {
        return None;
    }
    let commas = s.matches(',').count();
    let dots = s.matches('.').count();
    let out = match (commas, dots) {
        (0, 0) | (0, 1) => s,
        (0, _) => s.replace('.', ""),
        (_, 0) if commas > 1 => s.replace(',', ""),
        (_, 0) => {
            let (head, tail) = s.split_once(',')?;
            if is_thousands_group(head, tail) {
                format!("{head}{tail}")
            } else {
                format!("{head}.{tail}")
            }
        }
        _ => {
            let last_comma = s.rfind(',')?;
            let last_dot = s.rfind('.')?;
            if last_comma > last_dot {
                s.replace('.', "").replace(',', ".")
            } else {
                s.replace(',', "")
            }
        }
    };
    Some(out)
}

/// Parses loosely formatted text into an exact decimal.
pub fn parse_decimal(raw: &str) -> Result<Decimal> {
    normalize_number(raw)
        .and_then(|s| Decimal::from_str(&s).ok())
        .ok_or_else(|| SimError::validation(format!("not a number: '{}'", raw.trim())))
}

/// Parses a strictly positive, finite amount.
pub fn parse_amount(raw: &str) -> Result<f64> {
    let d = parse_decimal(raw)?;
    if d <= Decimal::ZERO {
        return Err(SimError::validation("amount must be > 0"));
    }
    let v = from_decimal(d);
    if !(v.is_finite() && v > 0.0) {
        return Err(SimError::validation("amount out of range"));
    }
    Ok(v)
}

/// Parses a strictly positive whole number (counts, node numbers).
pub fn parse_count(raw: &str) -> Result<usize> {
    let d = parse_decimal(raw)?;
    if d.fract() != Decimal::ZERO {
        return Err(SimError::validation(format!("'{}' is not a whole number", raw.trim())));
    }
    match d.to_usize() {
        Some(n) if n > 0 => Ok(n),
        _ => Err(SimError::validation("count must be > 0")),
    }
}

/// Parses a percentage in `[0, 100]` and returns it as a fraction.
pub fn parse_percent(raw: &str) -> Result<f64> {
    let d = parse_decimal(raw.trim().trim_end_matches('%'))?;
    if d < Decimal::ZERO || d > Decimal::ONE_HUNDRED {
        return Err(SimError::validation("percentage must be between 0 and 100"));
    }
    Ok(from_decimal(d / Decimal::ONE_HUNDRED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn normalizes_separators() {
        assert_eq!(normalize_number(" 1 000 000 ").as_deref(), Some("1000000"));
        assert_eq!(normalize_number("1,000").as_deref(), Some("1000"));
        assert_eq!(normalize_number("1,000,000").as_deref(), Some("1000000"));
        assert_eq!(normalize_number("1,5").as_deref(), Some("1.5"));
        assert_eq!(normalize_number("0,003").as_deref(), Some("0.003"));
        assert_eq!(normalize_number("1.234,56").as_deref(), Some("1234.56"));
        assert_eq!(normalize_number("1,234.56").as_deref(), Some("1234.56"));
        assert_eq!(normalize_number("1.000.000").as_deref(), Some("1000000"));
        assert_eq!(normalize_number("   "), None);
    }

    #[test]
    fn parse_decimal_is_exact() {
        assert_eq!(parse_decimal("12,5").expect("test: valid"), dec!(12.5));
        assert!(parse_decimal("abc").is_err());
        assert!(parse_decimal("1e5").is_err());
    }

    #[test]
    fn amounts_must_be_positive() {
        assert_eq!(parse_amount("2,5").expect("test: valid"), 2.5);
        assert_eq!(parse_amount("100 000").expect("test: valid"), 100_000.0);
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("-3").is_err());
        assert!(parse_amount("").is_err());
    }

    #[test]
    fn counts_are_whole() {
        assert_eq!(parse_count("4").expect("test: valid"), 4);
        assert_eq!(parse_count("1,000").expect("test: valid"), 1000);
        assert!(parse_count("2,5").is_err());
        assert!(parse_count("0").is_err());
        assert!(parse_count("-1").is_err());
    }

    #[test]
    fn percent_to_fraction() {
        assert_eq!(parse_percent("5").expect("test: valid"), 0.05);
        assert_eq!(parse_percent("12,5%").expect("test: valid"), 0.125);
        assert_eq!(parse_percent("0").expect("test: valid"), 0.0);
        assert!(parse_percent("101").is_err());
        assert!(parse_percent("-1").is_err());
    }

    #[test]
    fn decimal_bridge() {
        assert_eq!(from_decimal(to_decimal(0.25)), 0.25);
        assert_eq!(to_decimal(f64::NAN), Decimal::ZERO);
    }
}
