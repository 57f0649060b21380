use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use settings::GenerationSettings;
use sha2::{Digest, Sha256};
use std::fmt;

/// Matrix job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting for the runner
    Pending,
    /// Being generated
    Running,
    /// Finished with a result
    Completed,
    /// Finished with an error
    Failed,
    /// Held back until resumed
    Paused,
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// One cell of a parameter matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixJob {
    /// Content hash of the output-affecting parameters
    pub id: String,

    /// Position in generation order
    pub index: usize,

    pub status: JobStatus,

    /// Fully resolved settings for this cell
    pub parameters: GenerationSettings,

    pub created_at: DateTime<Utc>,

    pub started_at: Option<DateTime<Utc>>,

    pub completed_at: Option<DateTime<Utc>>,

    /// Opaque runner output, e.g. image references
    #[serde(default)]
    pub result: Option<serde_json::Value>,

    #[serde(default)]
    pub error: Option<String>,
}

impl MatrixJob {
    pub fn new(index: usize, parameters: GenerationSettings, created_at: DateTime<Utc>) -> Self {
        Self {
            id: job_id(&parameters),
            index,
            status: JobStatus::Pending,
            parameters,
            created_at,
            started_at: None,
            completed_at: None,
            result: None,
            error: None,
        }
    }

    /// Seconds between start and completion, or until now while running.
    pub fn duration_secs(&self) -> Option<i64> {
        let started = self.started_at?;
        let end = self.completed_at.unwrap_or_else(Utc::now);
        Some((end - started).num_seconds())
    }
}

/// Output-affecting fields, declared in sorted key order.
#[derive(Serialize)]
struct IdentityFields<'a> {
    batch_count: u32,
    batch_size: u32,
    cfg_scale: f64,
    height: u32,
    model_name: &'a str,
    negative_prompt: &'a str,
    prompt: &'a str,
    sampler: &'a str,
    seed: i64,
    steps: u32,
    width: u32,
}

/// Stable id for a settings snapshot.
///
/// SHA-256 over the canonical (sorted-key) JSON of the fields that change
/// the generated image, truncated to 8 bytes of hex. Equal parameters give
/// equal ids on every platform.
pub fn job_id(parameters: &GenerationSettings) -> String {
    let fields = IdentityFields {
        batch_count: parameters.batch_count,
        batch_size: parameters.batch_size,
        cfg_scale: parameters.cfg_scale,
        height: parameters.height,
        model_name: &parameters.model_name,
        negative_prompt: &parameters.negative_prompt,
        prompt: &parameters.prompt,
        sampler: &parameters.sampler_name,
        seed: parameters.seed,
        steps: parameters.steps,
        width: parameters.width,
    };
    // serializing plain numbers and strings cannot fail
    let canonical = serde_json::to_vec(&fields).unwrap_or_default();
    let hash = Sha256::digest(&canonical);
    hex::encode(&hash[..8])
}
