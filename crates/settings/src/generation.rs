/// Text-to-image / image-to-image generation settings
use serde::{Deserialize, Serialize};

use crate::SettingsError;

/// A LoRA applied on top of the base model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoraSelection {
    /// LoRA file name as known to the backend
    pub name: String,

    /// Blend strength
    #[serde(default = "default_lora_strength")]
    pub strength: f64,
}

fn default_lora_strength() -> f64 {
    1.0
}

/// Settings snapshot for one generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Positive prompt
    pub prompt: String,

    /// Negative prompt
    pub negative_prompt: String,

    /// Checkpoint name
    pub model_name: String,

    /// Seed; -1 lets the backend pick one
    pub seed: i64,

    /// Ask the backend for a fresh seed on every run
    pub random_seed: bool,

    /// Sampler name (euler, dpmpp_2m, ...)
    pub sampler_name: String,

    /// Noise scheduler
    pub scheduler: String,

    /// Sampling steps
    pub steps: u32,

    /// Classifier-free guidance scale
    pub cfg_scale: f64,

    /// Output width in pixels
    pub width: u32,

    /// Output height in pixels
    pub height: u32,

    /// Images per batch
    pub batch_size: u32,

    /// Number of batches
    pub batch_count: u32,

    /// Denoising strength for image-to-image
    pub denoising_strength: f64,

    /// VAE override
    pub vae: Option<String>,

    /// LoRAs in application order
    pub loras: Vec<LoraSelection>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            negative_prompt: String::new(),
            model_name: "v1-5-pruned-emaonly.safetensors".to_string(),
            seed: -1,
            random_seed: true,
            sampler_name: "euler".to_string(),
            scheduler: "normal".to_string(),
            steps: 20,
            cfg_scale: 7.0,
            width: 512,
            height: 512,
            batch_size: 1,
            batch_count: 1,
            denoising_strength: 0.75,
            vae: None,
            loras: Vec::new(),
        }
    }
}

impl GenerationSettings {
    /// SDXL base at its native resolution
    pub fn sdxl_preset() -> Self {
        Self {
            model_name: "sd_xl_base_1.0.safetensors".to_string(),
            sampler_name: "dpmpp_2m".to_string(),
            scheduler: "karras".to_string(),
            steps: 30,
            cfg_scale: 7.0,
            width: 1024,
            height: 1024,
            ..Default::default()
        }
    }

    /// SD 1.5 defaults
    pub fn sd15_preset() -> Self {
        Self::default()
    }

    /// Few steps, small images
    pub fn fast_preset() -> Self {
        Self {
            sampler_name: "euler_ancestral".to_string(),
            steps: 8,
            cfg_scale: 5.0,
            ..Default::default()
        }
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "default" => Some(Self::default()),
            "sdxl" => Some(Self::sdxl_preset()),
            "sd15" | "sd1.5" => Some(Self::sd15_preset()),
            "fast" => Some(Self::fast_preset()),
            _ => None,
        }
    }

    /// Assign a field from its textual form, as typed in a form field
    pub fn set_field(&mut self, field: &str, raw: &str) -> Result<(), SettingsError> {
        let value = raw.trim();
        match field.trim() {
            "prompt" => self.prompt = raw.to_string(),
            "negative_prompt" => self.negative_prompt = raw.to_string(),
            "model_name" | "model" => self.model_name = value.to_string(),
            "seed" => self.seed = parse_field(field, value)?,
            "random_seed" => self.random_seed = parse_field(field, value)?,
            "sampler_name" | "sampler" => self.sampler_name = value.to_string(),
            "scheduler" => self.scheduler = value.to_string(),
            "steps" => self.steps = parse_field(field, value)?,
            "cfg_scale" | "cfg" => self.cfg_scale = parse_finite(field, value)?,
            "width" => self.width = parse_field(field, value)?,
            "height" => self.height = parse_field(field, value)?,
            "batch_size" => self.batch_size = parse_field(field, value)?,
            "batch_count" => self.batch_count = parse_field(field, value)?,
            "denoising_strength" => self.denoising_strength = parse_finite(field, value)?,
            "vae" => {
                self.vae = if value.is_empty() || value.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            "loras" => self.loras = parse_loras(value)?,
            other => return Err(SettingsError::UnknownField(other.to_string())),
        }
        Ok(())
    }
}

fn parse_field<T>(field: &str, value: &str) -> Result<T, SettingsError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| SettingsError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Float field; NaN and infinities are rejected.
fn parse_finite(field: &str, value: &str) -> Result<f64, SettingsError> {
    let number: f64 = parse_field(field, value)?;
    if !number.is_finite() {
        return Err(SettingsError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    Ok(number)
}

/// `name:strength` pairs separated by commas; strength defaults to 1.0
fn parse_loras(value: &str) -> Result<Vec<LoraSelection>, SettingsError> {
    let mut loras = Vec::new();
    for item in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (name, strength) = match item.rsplit_once(':') {
            Some((name, strength)) => (name.trim(), parse_finite("loras", strength.trim())?),
            None => (item, default_lora_strength()),
        };
        if name.is_empty() {
            return Err(SettingsError::InvalidValue {
                field: "loras".to_string(),
                value: item.to_string(),
                reason: "missing LoRA name".to_string(),
            });
        }
        loras.push(LoraSelection {
            name: name.to_string(),
            strength,
        });
    }
    Ok(loras)
}
