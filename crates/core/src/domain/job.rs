// Job Domain Model

use crate::domain::error::{DomainError, Result};
use crate::domain::platform::{Platform, Processor};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Job ID (queue sequence number, used only for arrival order)
pub type JobId = i64;

/// Score (higher number = dispatched first)
pub type Score = i64;

/// Job Status (only the states the estimator reads)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Waiting,
    Running,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Waiting => write!(f, "WAITING"),
            JobStatus::Running => write!(f, "RUNNING"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "WAITING" => Ok(JobStatus::Waiting),
            "RUNNING" => Ok(JobStatus::Running),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

/// Job Entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub score: Score,

    // Required platform
    pub processor: Option<Processor>,
    pub virtualized: bool,

    pub status: JobStatus,
    pub estimated_duration_ms: i64,

    /// Epoch ms, set only while RUNNING
    pub started_at: Option<i64>,
}

impl Job {
    /// Create a WAITING job for the architecture-independent native platform
    pub fn waiting(id: JobId, score: Score, estimated_duration_ms: i64) -> Self {
        Self {
            id,
            score,
            processor: None,
            virtualized: false,
            status: JobStatus::Waiting,
            estimated_duration_ms,
            started_at: None,
        }
    }

    /// Create a RUNNING job that started at `started_at` (epoch ms)
    pub fn running(id: JobId, started_at: i64, estimated_duration_ms: i64) -> Self {
        Self {
            status: JobStatus::Running,
            started_at: Some(started_at),
            ..Self::waiting(id, 0, estimated_duration_ms)
        }
    }

    pub fn with_processor(mut self, processor: Processor) -> Self {
        self.processor = Some(processor);
        self
    }

    pub fn with_virtualized(mut self, virtualized: bool) -> Self {
        self.virtualized = virtualized;
        self
    }

    pub fn with_score(mut self, score: Score) -> Self {
        self.score = score;
        self
    }

    /// Platform this job requires
    pub fn platform(&self) -> Platform {
        Platform::new(self.processor.clone(), self.virtualized)
    }

    /// Dispatch order: higher score first, then lower id (earlier arrival)
    pub fn outranks(&self, other: &Job) -> bool {
        self.score > other.score || (self.score == other.score && self.id < other.id)
    }

    /// `self` ranks ahead of `other` AND competes with it for workers
    pub fn is_ahead_of(&self, other: &Job) -> bool {
        self.outranks(other) && self.platform().competes_with(&other.platform())
    }

    /// Fails unless the job is still waiting for dispatch
    pub fn ensure_waiting(&self) -> Result<()> {
        if self.status != JobStatus::Waiting {
            return Err(DomainError::InvalidState {
                job_id: self.id,
                status: self.status.to_string(),
            });
        }
        Ok(())
    }

    /// Milliseconds left before the estimate runs out; negative once overrun.
    /// `None` unless the job is running.
    pub fn remaining_ms(&self, now_millis: i64) -> Option<i64> {
        match (self.status, self.started_at) {
            (JobStatus::Running, Some(started_at)) => Some(
                started_at
                    .saturating_add(self.estimated_duration_ms)
                    .saturating_sub(now_millis),
            ),
            _ => None,
        }
    }
}
