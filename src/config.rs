//! Dashboard configuration.
//!
//! The only recognized option is `maxQuestionsToShow`. It is parsed
//! leniently: anything that does not read as a positive integer disables the
//! limit instead of failing.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::SurveyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardConfig {
    /// Show only the first N surfaced questions; `None` shows all.
    pub max_questions_to_show: Option<usize>,
}

/// Both spellings are accepted; `maxQuestionsToShow` wins when both appear.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default, rename = "maxQuestionsToShow")]
    camel: Option<Value>,
    #[serde(default, rename = "max_questions_to_show")]
    snake: Option<Value>,
}

impl DashboardConfig {
    pub fn from_json_str(json: &str) -> Result<Self, SurveyError> {
        let raw: RawConfig = serde_json::from_str(json)?;
        Ok(DashboardConfig {
            max_questions_to_show: raw.camel.or(raw.snake).as_ref().and_then(parse_limit),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, SurveyError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Applies a command-line limit on top of the file value; 0 disables.
    pub fn with_max_questions(mut self, limit: Option<usize>) -> Self {
        if let Some(limit) = limit {
            self.max_questions_to_show = Some(limit).filter(|&n| n > 0);
        }
        self
    }
}

/// Positive integer reading of a JSON value, truncating like `parseInt`.
fn parse_limit(value: &Value) -> Option<usize> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => parse_int_prefix(s)?,
        _ => return None,
    };
    let n = n.trunc();
    if n >= 1.0 { Some(n as usize) } else { None }
}

/// Leading integer of a string: optional sign, then digits.
fn parse_int_prefix(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let (sign, rest) = match s.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, s.strip_prefix('+').unwrap_or(s)),
    };
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<f64>().ok().map(|n| sign * n)
}
