// Worker Registry Port (read-only)
use crate::domain::{Platform, Worker};
use crate::error::Result;
use async_trait::async_trait;

/// Read access to the build farm's worker registry
#[async_trait]
pub trait WorkerRegistry: Send + Sync {
    /// All workers that are enabled and not manually excluded
    async fn eligible_workers(&self) -> Result<Vec<Worker>>;

    /// Eligible workers able to run `platform` that have no job assigned
    /// right now
    ///
    /// Point-in-time count; adapters backed by a query engine should
    /// override this with a direct count.
    async fn count_idle(&self, platform: &Platform) -> Result<usize> {
        let workers = self.eligible_workers().await?;
        Ok(workers
            .iter()
            .filter(|w| w.is_idle() && w.can_run(platform))
            .count())
    }
}

// ============================================================================
// In-Memory Implementation (tests, embedding)
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::WorkerId;
    use std::sync::RwLock;

    /// Worker registry held in memory
    #[derive(Default)]
    pub struct InMemoryWorkerRegistry {
        workers: RwLock<Vec<Worker>>,
    }

    impl InMemoryWorkerRegistry {
        pub fn new(workers: Vec<Worker>) -> Self {
            Self {
                workers: RwLock::new(workers),
            }
        }

        pub fn add(&self, worker: Worker) {
            self.workers
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .push(worker);
        }

        /// Replace the assignment of a worker (None frees it)
        pub fn assign(&self, worker_id: WorkerId, job: Option<i64>) {
            let mut workers = self.workers.write().unwrap_or_else(|e| e.into_inner());
            if let Some(worker) = workers.iter_mut().find(|w| w.id == worker_id) {
                worker.current_job = job;
            }
        }
    }

    #[async_trait]
    impl WorkerRegistry for InMemoryWorkerRegistry {
        async fn eligible_workers(&self) -> Result<Vec<Worker>> {
            let workers = self.workers.read().unwrap_or_else(|e| e.into_inner());
            Ok(workers.iter().filter(|w| w.is_eligible()).cloned().collect())
        }
    }
}
