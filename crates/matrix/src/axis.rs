use serde::{Deserialize, Serialize};
use settings::GenerationSettings;
use std::fmt;
use std::str::FromStr;

use crate::{MatrixError, ParamValue};

/// A generation parameter the matrix can sweep.
///
/// Declaration order is the nesting order of generated jobs: `Seed` is the
/// outermost loop and `BatchCount` the innermost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixAxis {
    Seed,
    Sampler,
    Steps,
    CfgScale,
    Width,
    Height,
    BatchSize,
    BatchCount,
}

impl MatrixAxis {
    pub const ALL: [MatrixAxis; 8] = [
        MatrixAxis::Seed,
        MatrixAxis::Sampler,
        MatrixAxis::Steps,
        MatrixAxis::CfgScale,
        MatrixAxis::Width,
        MatrixAxis::Height,
        MatrixAxis::BatchSize,
        MatrixAxis::BatchCount,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MatrixAxis::Seed => "seed",
            MatrixAxis::Sampler => "sampler",
            MatrixAxis::Steps => "steps",
            MatrixAxis::CfgScale => "cfg_scale",
            MatrixAxis::Width => "width",
            MatrixAxis::Height => "height",
            MatrixAxis::BatchSize => "batch_size",
            MatrixAxis::BatchCount => "batch_count",
        }
    }

    /// Inclusive bounds for numeric axes; `None` for the sampler.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self {
            MatrixAxis::Seed => Some((-1.0, i32::MAX as f64)),
            MatrixAxis::Sampler => None,
            MatrixAxis::Steps => Some((1.0, 150.0)),
            MatrixAxis::CfgScale => Some((1.0, 20.0)),
            MatrixAxis::Width | MatrixAxis::Height => Some((64.0, 2048.0)),
            MatrixAxis::BatchSize | MatrixAxis::BatchCount => Some((1.0, 100.0)),
        }
    }

    /// Whether values must be whole numbers.
    pub fn is_integral(&self) -> bool {
        !matches!(self, MatrixAxis::Sampler | MatrixAxis::CfgScale)
    }

    /// Current value of this axis in `settings`.
    pub fn value_of(&self, settings: &GenerationSettings) -> ParamValue {
        match self {
            MatrixAxis::Seed => ParamValue::Int(settings.seed),
            MatrixAxis::Sampler => ParamValue::Text(settings.sampler_name.clone()),
            MatrixAxis::Steps => ParamValue::Int(settings.steps.into()),
            MatrixAxis::CfgScale => ParamValue::Float(settings.cfg_scale),
            MatrixAxis::Width => ParamValue::Int(settings.width.into()),
            MatrixAxis::Height => ParamValue::Int(settings.height.into()),
            MatrixAxis::BatchSize => ParamValue::Int(settings.batch_size.into()),
            MatrixAxis::BatchCount => ParamValue::Int(settings.batch_count.into()),
        }
    }

    /// Write `value` into the matching field of `settings`.
    pub fn assign(
        &self,
        settings: &mut GenerationSettings,
        value: &ParamValue,
    ) -> Result<(), MatrixError> {
        match self {
            MatrixAxis::Seed => settings.seed = self.integer(value)?,
            MatrixAxis::Sampler => match value {
                ParamValue::Text(name) if !name.is_empty() => {
                    settings.sampler_name = name.clone()
                }
                _ => return Err(self.invalid(value, "expected a sampler name")),
            },
            MatrixAxis::Steps => settings.steps = self.unsigned(value)?,
            MatrixAxis::CfgScale => {
                settings.cfg_scale = value
                    .as_f64()
                    .ok_or_else(|| self.invalid(value, "expected a number"))?
            }
            MatrixAxis::Width => settings.width = self.unsigned(value)?,
            MatrixAxis::Height => settings.height = self.unsigned(value)?,
            MatrixAxis::BatchSize => settings.batch_size = self.unsigned(value)?,
            MatrixAxis::BatchCount => settings.batch_count = self.unsigned(value)?,
        }
        Ok(())
    }

    fn integer(&self, value: &ParamValue) -> Result<i64, MatrixError> {
        value
            .as_i64()
            .ok_or_else(|| self.invalid(value, "expected an integer"))
    }

    fn unsigned(&self, value: &ParamValue) -> Result<u32, MatrixError> {
        let raw = self.integer(value)?;
        u32::try_from(raw).map_err(|_| self.invalid(value, "out of range"))
    }

    fn invalid(&self, value: &ParamValue, reason: &str) -> MatrixError {
        MatrixError::InvalidValue {
            axis: *self,
            value: value.clone(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for MatrixAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MatrixAxis {
    type Err = MatrixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seed" => Ok(MatrixAxis::Seed),
            "sampler" | "sampler_name" => Ok(MatrixAxis::Sampler),
            "steps" => Ok(MatrixAxis::Steps),
            "cfg_scale" | "cfg" => Ok(MatrixAxis::CfgScale),
            "width" => Ok(MatrixAxis::Width),
            "height" => Ok(MatrixAxis::Height),
            "batch_size" => Ok(MatrixAxis::BatchSize),
            "batch_count" => Ok(MatrixAxis::BatchCount),
            other => Err(MatrixError::UnknownAxis(other.to_string())),
        }
    }
}
