use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest numeric range `parse_parameter_input` will expand; see
/// [`parse_parameter_input_with_limit`] for a configured cap.
pub const MAX_RANGE_VALUES: usize = 10_000;

static RANGE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s*-\s*(\d+)\s*$").expect("valid range pattern"));

/// One value on a matrix axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Numbers when the text parses cleanly, text otherwise.
    pub fn coerce(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(i) = trimmed.parse::<i64>() {
            return ParamValue::Int(i);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => ParamValue::Float(f),
            _ => ParamValue::Text(trimmed.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            ParamValue::Text(_) => None,
        }
    }

    /// Integral value of a number, including floats such as `20.0`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            ParamValue::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Some(*f as i64)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Text(s) => write!(f, "'{s}'"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeKind {
    List,
    Range,
}

/// A parsed matrix axis input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub kind: RangeKind,
    pub values: Vec<ParamValue>,
    /// Input text as typed
    pub original: String,
}

impl ParameterRange {
    pub fn list(values: Vec<ParamValue>) -> Self {
        let original = values
            .iter()
            .map(|v| match v {
                ParamValue::Text(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            kind: RangeKind::List,
            values,
            original,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Bounds of a `start-end` input, whatever their order.
pub(crate) fn range_bounds(raw: &str) -> Option<(i64, i64)> {
    let caps = RANGE_PATTERN.captures(raw)?;
    let start = caps[1].parse().ok()?;
    let end = caps[2].parse().ok()?;
    Some((start, end))
}

/// Classify a typed axis input.
///
/// `start-end` becomes an inclusive integer range; reversed bounds or spans
/// above [`MAX_RANGE_VALUES`] yield an empty range that validation rejects.
/// Comma-separated input becomes a list with empty items dropped. Anything
/// else is a single-element list. List items become numbers when they parse.
pub fn parse_parameter_input(raw: &str) -> ParameterRange {
    parse_parameter_input_with_limit(raw, MAX_RANGE_VALUES)
}

/// [`parse_parameter_input`] expanding ranges of up to `max_values` values.
pub fn parse_parameter_input_with_limit(raw: &str, max_values: usize) -> ParameterRange {
    let original = raw.to_string();

    if let Some((start, end)) = range_bounds(raw) {
        // both bounds are non-negative, so the difference cannot overflow
        let in_budget = end >= start && ((end - start) as u64) < max_values as u64;
        let values = if in_budget {
            (start..=end).map(ParamValue::Int).collect()
        } else {
            Vec::new()
        };
        return ParameterRange {
            kind: RangeKind::Range,
            values,
            original,
        };
    }

    let values = if raw.contains(',') {
        raw.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(ParamValue::coerce)
            .collect()
    } else {
        vec![ParamValue::coerce(raw)]
    };

    ParameterRange {
        kind: RangeKind::List,
        values,
        original,
    }
}
