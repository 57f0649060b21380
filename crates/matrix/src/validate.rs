use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::range::range_bounds;
use crate::{MatrixAxis, ParamValue, ParameterRange, RangeKind};

/// Outcome of checking one axis; callers must inspect `valid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeValidation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RangeValidation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
        }
    }
}

/// Check a parsed axis against the axis' type and bounds.
pub fn validate_parameter_range(axis: MatrixAxis, range: &ParameterRange) -> RangeValidation {
    let verdict = check(axis, range);
    if let Some(error) = &verdict.error {
        warn!(%axis, input = %range.original, "rejected matrix axis: {error}");
    }
    verdict
}

fn check(axis: MatrixAxis, range: &ParameterRange) -> RangeValidation {
    if range.values.is_empty() {
        return RangeValidation::fail(empty_reason(axis, range));
    }

    for value in &range.values {
        if let Err(reason) = check_value(axis, value) {
            return RangeValidation::fail(reason);
        }
    }
    RangeValidation::ok()
}

fn empty_reason(axis: MatrixAxis, range: &ParameterRange) -> String {
    if range.kind == RangeKind::Range {
        if let Some((start, end)) = range_bounds(&range.original) {
            if end < start {
                return format!("{axis} range {start}-{end} has reversed bounds");
            }
            let span = (end - start) as u64 + 1;
            return format!("{axis} range {start}-{end} exceeds the range limit ({span} values)");
        }
    }
    format!("{axis} needs at least one value")
}

fn check_value(axis: MatrixAxis, value: &ParamValue) -> Result<(), String> {
    let Some((min, max)) = axis.bounds() else {
        return match value {
            ParamValue::Text(name) if !name.is_empty() => Ok(()),
            other => Err(format!("{axis} value {other} is not a sampler name")),
        };
    };

    let number = value
        .as_f64()
        .ok_or_else(|| format!("{axis} value {value} is not a number"))?;
    if axis.is_integral() && value.as_i64().is_none() {
        return Err(format!("{axis} value {value} must be a whole number"));
    }
    if number < min || number > max {
        return Err(format!("{axis} value {value} is outside [{min}, {max}]"));
    }
    Ok(())
}
