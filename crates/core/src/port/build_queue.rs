// Build Queue Port (read-only)
use crate::domain::{Job, JobId};
use crate::error::Result;
use async_trait::async_trait;

/// Read access to the build queue
#[async_trait]
pub trait BuildQueue: Send + Sync {
    /// Find job by ID (WAITING or RUNNING)
    async fn find_by_id(&self, id: JobId) -> Result<Option<Job>>;

    /// All WAITING jobs
    async fn waiting_jobs(&self) -> Result<Vec<Job>>;

    /// All RUNNING jobs
    ///
    /// Matched to workers through `Worker::current_job`; a running job's own
    /// platform is not used for worker matching.
    async fn running_jobs(&self) -> Result<Vec<Job>>;
}

// ============================================================================
// In-Memory Implementation (tests, embedding)
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::JobStatus;
    use std::sync::RwLock;

    /// Build queue held in memory
    #[derive(Default)]
    pub struct InMemoryBuildQueue {
        jobs: RwLock<Vec<Job>>,
    }

    impl InMemoryBuildQueue {
        pub fn new(jobs: Vec<Job>) -> Self {
            Self {
                jobs: RwLock::new(jobs),
            }
        }

        pub fn push(&self, job: Job) {
            self.jobs
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .push(job);
        }

        fn with_status(&self, status: JobStatus) -> Vec<Job> {
            let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());
            jobs.iter().filter(|j| j.status == status).cloned().collect()
        }
    }

    #[async_trait]
    impl BuildQueue for InMemoryBuildQueue {
        async fn find_by_id(&self, id: JobId) -> Result<Option<Job>> {
            let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());
            Ok(jobs.iter().find(|j| j.id == id).cloned())
        }

        async fn waiting_jobs(&self) -> Result<Vec<Job>> {
            Ok(self.with_status(JobStatus::Waiting))
        }

        async fn running_jobs(&self) -> Result<Vec<Job>> {
            Ok(self.with_status(JobStatus::Running))
        }
    }
}
