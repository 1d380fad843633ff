// Dispatch Estimator Service - reads the farm through ports, estimates purely

use crate::application::estimator::{
    self, head_platform, Capacity, DispatchEstimate, EstimatorConfig, QueueSnapshot,
};
use crate::domain::{Job, JobId, Platform};
use crate::error::{AppError, Result};
use crate::port::{BuildQueue, TimeProvider, WorkerRegistry};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// A waiting job together with its estimate (None = no capable worker)
#[derive(Debug, Clone, Serialize)]
pub struct QueueEntry {
    pub job: Job,
    pub estimate: Option<DispatchEstimate>,
}

/// Dispatch Estimator Service
///
/// Stateless: every call takes a fresh snapshot from the registry and queue.
pub struct DispatchEstimator {
    registry: Arc<dyn WorkerRegistry>,
    queue: Arc<dyn BuildQueue>,
    time_provider: Arc<dyn TimeProvider>,
    config: EstimatorConfig,
}

impl DispatchEstimator {
    pub fn new(
        registry: Arc<dyn WorkerRegistry>,
        queue: Arc<dyn BuildQueue>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            registry,
            queue,
            time_provider,
            config: EstimatorConfig::default(),
        }
    }

    /// Replace the tunables, rejecting invalid ones
    pub fn with_config(mut self, config: EstimatorConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Read workers, waiting and running jobs once
    pub async fn snapshot(&self) -> Result<QueueSnapshot> {
        let workers = self.registry.eligible_workers().await?;
        let waiting = self.queue.waiting_jobs().await?;
        let running = self.queue.running_jobs().await?;

        debug!(
            workers = workers.len(),
            waiting = waiting.len(),
            running = running.len(),
            "Took queue snapshot"
        );

        Ok(QueueSnapshot::new(workers, waiting, running))
    }

    /// Current builder counts per platform
    pub async fn capacity(&self) -> Result<Capacity> {
        let workers = self.registry.eligible_workers().await?;
        Ok(Capacity::snapshot(&workers))
    }

    /// Predicted start time (epoch ms) of `job`; `None` when no eligible
    /// worker can ever run it.
    ///
    /// Fails with `InvalidState` when `job` is not WAITING, before any read.
    pub async fn estimate_start_time(&self, job: &Job, now_millis: i64) -> Result<Option<i64>> {
        Ok(self.estimate(job, now_millis).await?.map(|e| e.start_at))
    }

    /// Estimate with breakdown
    pub async fn estimate(&self, job: &Job, now_millis: i64) -> Result<Option<DispatchEstimate>> {
        job.ensure_waiting()?;

        let snapshot = self.snapshot().await?;
        let head = head_platform(job, &snapshot.waiting);
        let idle = self.registry.count_idle(&head).await?;

        Ok(estimator::estimate_for_head(
            job,
            &snapshot,
            head,
            idle,
            now_millis,
            &self.config,
        ))
    }

    /// Look a job up in the queue and estimate it as of now
    pub async fn estimate_job(&self, job_id: JobId) -> Result<Option<DispatchEstimate>> {
        let job = self
            .queue
            .find_by_id(job_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("job {}", job_id)))?;

        let now = self.time_provider.now_millis();
        let estimate = self.estimate(&job, now).await?;

        match &estimate {
            Some(e) => info!(
                job_id,
                platform = %e.platform,
                wait_ms = e.wait_ms,
                delay_ms = e.delay_ms,
                eta_ms = e.start_at - now,
                "Job dispatch estimated"
            ),
            None => info!(job_id, "Job has no capable worker, no estimate"),
        }

        Ok(estimate)
    }

    /// Estimate every waiting job from a single snapshot, in dispatch order
    /// (score descending, then id ascending).
    pub async fn estimate_queue(&self) -> Result<Vec<QueueEntry>> {
        let now = self.time_provider.now_millis();
        let snapshot = self.snapshot().await?;

        let mut jobs = snapshot.waiting.clone();
        jobs.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));

        // Idle counts are asked once per head platform
        let mut idle_by_head: HashMap<Platform, usize> = HashMap::new();
        let mut entries = Vec::with_capacity(jobs.len());

        for job in jobs {
            let head = head_platform(&job, &snapshot.waiting);
            let idle = match idle_by_head.get(&head) {
                Some(n) => *n,
                None => {
                    let n = self.registry.count_idle(&head).await?;
                    idle_by_head.insert(head.clone(), n);
                    n
                }
            };

            let estimate =
                estimator::estimate_for_head(&job, &snapshot, head, idle, now, &self.config);
            entries.push(QueueEntry { job, estimate });
        }

        info!(
            jobs = entries.len(),
            unknown = entries.iter().filter(|e| e.estimate.is_none()).count(),
            "Estimated build queue"
        );

        Ok(entries)
    }
}
