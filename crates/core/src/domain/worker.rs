// Worker Domain Model

use crate::domain::job::JobId;
use crate::domain::platform::{Platform, Processor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Worker ID (registry sequence)
pub type WorkerId = i64;

/// A unit of execution capacity in the build farm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub name: String,

    /// Health flag maintained by the registry
    pub enabled: bool,
    /// Administrative opt-out
    pub manual: bool,
    pub virtualized: bool,

    /// Empty means the worker only takes architecture-independent jobs
    pub processors: BTreeSet<Processor>,

    /// Job currently assigned to this worker, if any
    pub current_job: Option<JobId>,
}

impl Worker {
    /// Create an enabled, idle worker
    pub fn new(id: WorkerId, name: impl Into<String>, virtualized: bool) -> Self {
        Self {
            id,
            name: name.into(),
            enabled: true,
            manual: false,
            virtualized,
            processors: BTreeSet::new(),
            current_job: None,
        }
    }

    pub fn with_processor(mut self, processor: Processor) -> Self {
        self.processors.insert(processor);
        self
    }

    pub fn with_current_job(mut self, job_id: JobId) -> Self {
        self.current_job = Some(job_id);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn manual(mut self) -> Self {
        self.manual = true;
        self
    }

    /// Eligible for dispatch consideration
    pub fn is_eligible(&self) -> bool {
        self.enabled && !self.manual
    }

    pub fn is_idle(&self) -> bool {
        self.current_job.is_none()
    }

    /// Whether a job requiring `platform` may run here
    pub fn can_run(&self, platform: &Platform) -> bool {
        if self.virtualized != platform.virtualized {
            return false;
        }
        match &platform.processor {
            None => true,
            Some(p) => self.processors.contains(p),
        }
    }
}
