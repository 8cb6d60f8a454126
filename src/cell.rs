//! Loosely typed spreadsheet cells.
//!
//! Every value that enters the crate is collapsed into a [`CellValue`] at the
//! input boundary, so the analytical modules never have to sniff types again.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

/// A raw cell as produced by a spreadsheet or CSV parser.
///
/// Equality follows "same value zero" semantics: `0.0 == -0.0` and two NaNs
/// compare equal, so cells can be used as set members. A number and a text
/// cell are never equal, even when they print the same.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Types a raw delimited-text field the way spreadsheet importers do:
    /// numeric-looking fields become numbers, everything else stays text.
    pub fn from_field(raw: &str) -> Self {
        if raw.is_empty() {
            return CellValue::Empty;
        }
        match parse_finite(raw.trim()) {
            Some(n) => CellValue::Number(n),
            None => CellValue::Text(raw.to_string()),
        }
    }

    /// Stringified form, untrimmed.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Empty => Cow::Borrowed(""),
            CellValue::Number(n) => Cow::Owned(format_number(*n)),
            CellValue::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }

    /// Stringified and trimmed.
    pub fn trimmed(&self) -> String {
        self.as_text().trim().to_string()
    }

    /// True when the stringified, trimmed value is empty.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Number(_) => false,
            CellValue::Text(s) => s.trim().is_empty(),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, CellValue::Text(_))
    }

    /// Finite numeric reading of the cell, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(n) => Some(*n).filter(|n| n.is_finite()),
            CellValue::Text(s) => parse_finite(s.trim()),
        }
    }
}

/// Parses a finite number. Infinities and NaN spelled out as text are
/// rejected; callers trim first.
pub fn parse_finite(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Formats a number the way spreadsheet front ends stringify it: integral
/// values carry no decimal part, negative zero prints as `0`, and magnitudes
/// from `1e21` up or below `1e-6` switch to exponent form (`1e+21`, `1.5e-7`).
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = n.abs();
    if magnitude.is_finite() && (magnitude >= 1e21 || magnitude < 1e-6) {
        let s = format!("{n:e}");
        return match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => s,
        };
    }
    n.to_string()
}

/// Fixed one-decimal rendering used for bin labels.
pub fn format_fixed1(n: f64) -> String {
    // adding 0.0 folds -0.0 into 0.0
    format!("{:.1}", n + 0.0)
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Empty, CellValue::Empty) => true,
            (CellValue::Number(a), CellValue::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Empty => {}
            CellValue::Number(n) => {
                let canonical = if *n == 0.0 {
                    0.0_f64.to_bits()
                } else if n.is_nan() {
                    f64::NAN.to_bits()
                } else {
                    n.to_bits()
                };
                canonical.hash(state);
            }
            CellValue::Text(s) => s.hash(state),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s)
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn fields_are_typed_like_a_spreadsheet_import() {
        assert_eq!(CellValue::from_field(""), CellValue::Empty);
        assert_eq!(CellValue::from_field(" 25 "), CellValue::Number(25.0));
        assert_eq!(CellValue::from_field("1e3"), CellValue::Number(1000.0));
        assert_eq!(CellValue::from_field("inf"), CellValue::Text("inf".into()));
        assert_eq!(CellValue::from_field("1,5"), CellValue::Text("1,5".into()));
        assert_eq!(CellValue::from_field("   "), CellValue::Text("   ".into()));
    }

    #[test]
    fn numbers_stringify_without_trailing_zero() {
        assert_eq!(CellValue::Number(25.0).as_text(), "25");
        assert_eq!(CellValue::Number(2.5).as_text(), "2.5");
        assert_eq!(CellValue::Number(-0.0).as_text(), "0");
        assert_eq!(format_fixed1(-0.0), "0.0");
        assert_eq!(format_fixed1(4.96), "5.0");
    }

    #[test]
    fn extreme_magnitudes_use_exponent_form() {
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(-2.5e22), "-2.5e+22");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
    }

    #[test]
    fn blank_detection_trims_text() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::Text(" \t".into()).is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
        assert!(!CellValue::Text(" x ".into()).is_blank());
    }

    #[test]
    fn set_membership_uses_same_value_zero() {
        let mut set = HashSet::new();
        set.insert(CellValue::Number(0.0));
        set.insert(CellValue::Number(-0.0));
        set.insert(CellValue::Text("0".into()));
        set.insert(CellValue::Number(f64::NAN));
        set.insert(CellValue::Number(f64::NAN));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn numeric_reading_rejects_non_finite_text() {
        assert_eq!(CellValue::Text(" 7.5".into()).as_number(), Some(7.5));
        assert_eq!(CellValue::Text("NaN".into()).as_number(), None);
        assert_eq!(CellValue::Text("abc".into()).as_number(), None);
        assert_eq!(CellValue::Empty.as_number(), None);
    }
}
