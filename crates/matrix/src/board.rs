use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{group_indices, JobStatus, MatrixError, MatrixJob};

/// Counts by status for a progress grid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatrixProgress {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub paused: usize,
    /// Finished jobs as a percentage of all jobs (0-100)
    pub percent: f32,
}

/// The jobs of one matrix run, mutated by whoever executes them.
///
/// Jobs are addressed by position; positions match `MatrixJob::index`
/// because identical parameter sets share an id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "StoredBoard")]
pub struct JobBoard {
    jobs: Vec<MatrixJob>,
}

/// Persisted form of a [`JobBoard`]; restored boards are renumbered.
#[derive(Deserialize)]
struct StoredBoard {
    #[serde(default)]
    jobs: Vec<MatrixJob>,
}

impl From<StoredBoard> for JobBoard {
    fn from(stored: StoredBoard) -> Self {
        JobBoard::from_jobs(stored.jobs)
    }
}

impl JobBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_jobs(jobs: Vec<MatrixJob>) -> Self {
        let mut board = Self::new();
        board.load(jobs);
        board
    }

    /// Replace the collection, renumbering jobs by position.
    pub fn load(&mut self, jobs: Vec<MatrixJob>) {
        self.jobs = jobs;
        for (pos, job) in self.jobs.iter_mut().enumerate() {
            job.index = pos;
        }
        debug!(jobs = self.jobs.len(), "loaded job board");
    }

    pub fn clear(&mut self) {
        self.jobs.clear();
    }

    pub fn jobs(&self) -> &[MatrixJob] {
        &self.jobs
    }

    pub fn get(&self, index: usize) -> Option<&MatrixJob> {
        self.jobs.get(index)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn next_pending(&self) -> Option<&MatrixJob> {
        self.jobs.iter().find(|job| job.status == JobStatus::Pending)
    }

    /// Mark a pending job as running. Failed jobs may be started again.
    pub fn start(&mut self, index: usize) -> Result<(), MatrixError> {
        let job = self.transition(
            index,
            &[JobStatus::Pending, JobStatus::Failed],
            JobStatus::Running,
        )?;
        job.started_at = Some(Utc::now());
        job.completed_at = None;
        job.error = None;
        Ok(())
    }

    pub fn complete(
        &mut self,
        index: usize,
        result: Option<serde_json::Value>,
    ) -> Result<(), MatrixError> {
        let job = self.transition(index, &[JobStatus::Running], JobStatus::Completed)?;
        job.completed_at = Some(Utc::now());
        job.result = result;
        Ok(())
    }

    /// Record a failure; a pending job may fail before it starts.
    pub fn fail(&mut self, index: usize, error: impl Into<String>) -> Result<(), MatrixError> {
        let job = self.transition(
            index,
            &[JobStatus::Pending, JobStatus::Running],
            JobStatus::Failed,
        )?;
        job.completed_at = Some(Utc::now());
        job.error = Some(error.into());
        Ok(())
    }

    /// Hold every pending job. Returns how many were paused.
    pub fn pause_all(&mut self) -> usize {
        self.retag(JobStatus::Pending, JobStatus::Paused)
    }

    pub fn resume_all(&mut self) -> usize {
        self.retag(JobStatus::Paused, JobStatus::Pending)
    }

    pub fn progress(&self) -> MatrixProgress {
        let mut progress = MatrixProgress {
            total: self.jobs.len(),
            ..Default::default()
        };
        for job in &self.jobs {
            match job.status {
                JobStatus::Pending => progress.pending += 1,
                JobStatus::Running => progress.running += 1,
                JobStatus::Completed => progress.completed += 1,
                JobStatus::Failed => progress.failed += 1,
                JobStatus::Paused => progress.paused += 1,
            }
        }
        if progress.total > 0 {
            let done = progress.completed + progress.failed;
            progress.percent = done as f32 / progress.total as f32 * 100.0;
        }
        progress
    }

    /// True once no job is waiting, running or paused.
    pub fn is_finished(&self) -> bool {
        self.jobs.iter().all(|job| job.status.is_finished())
    }

    /// Batching groups over the board, as job positions.
    pub fn groups(&self) -> Vec<Vec<usize>> {
        group_indices(&self.jobs)
    }

    fn transition(
        &mut self,
        index: usize,
        from: &[JobStatus],
        to: JobStatus,
    ) -> Result<&mut MatrixJob, MatrixError> {
        let job = self
            .jobs
            .get_mut(index)
            .ok_or(MatrixError::JobNotFound(index))?;
        if !from.contains(&job.status) {
            return Err(MatrixError::IllegalTransition {
                index,
                from: job.status,
                to,
            });
        }
        debug!(index, from = %job.status, %to, "job transition");
        job.status = to;
        Ok(job)
    }

    fn retag(&mut self, from: JobStatus, to: JobStatus) -> usize {
        let mut changed = 0;
        for job in self.jobs.iter_mut().filter(|job| job.status == from) {
            job.status = to;
            changed += 1;
        }
        changed
    }
}
