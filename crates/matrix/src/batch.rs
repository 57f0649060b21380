use std::collections::HashMap;

use crate::MatrixJob;

/// Parameters that force the runner to reload the model or reallocate
/// buffers when they change between consecutive jobs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BatchKey {
    pub model_name: String,
    pub width: u32,
    pub height: u32,
    pub vae: Option<String>,
    /// LoRA names with strengths as raw bits, so the key can hash
    pub loras: Vec<(String, u64)>,
}

impl BatchKey {
    pub fn of(job: &MatrixJob) -> Self {
        let p = &job.parameters;
        Self {
            model_name: p.model_name.clone(),
            width: p.width,
            height: p.height,
            vae: p.vae.clone(),
            loras: p
                .loras
                .iter()
                .map(|lora| (lora.name.clone(), lora.strength.to_bits()))
                .collect(),
        }
    }
}

/// Positions of `jobs` grouped by [`BatchKey`]; groups appear in first-seen
/// order and keep job order inside.
pub fn group_indices(jobs: &[MatrixJob]) -> Vec<Vec<usize>> {
    let mut slots: HashMap<BatchKey, usize> = HashMap::new();
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (pos, job) in jobs.iter().enumerate() {
        let slot = *slots.entry(BatchKey::of(job)).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(pos);
    }
    groups
}

/// Partition jobs into batches that share model, resolution, VAE and LoRAs.
pub fn group_for_batching(jobs: Vec<MatrixJob>) -> Vec<Vec<MatrixJob>> {
    let layout = group_indices(&jobs);
    let mut cells: Vec<Option<MatrixJob>> = jobs.into_iter().map(Some).collect();
    layout
        .into_iter()
        .map(|group| {
            group
                .into_iter()
                .filter_map(|pos| cells[pos].take())
                .collect()
        })
        .collect()
}
