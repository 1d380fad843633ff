//! Dispatch-time estimator
//!
//! Predicts when a WAITING job will start on the build farm from a
//! point-in-time snapshot of workers and queue:
//! - capacity: eligible builders per platform, idle counts
//! - wait: head of queue and time until a suitable worker frees up
//! - delay: apportioned cost of competing jobs ranked ahead
//!
//! Everything here is pure. Results are best-effort and advisory.

pub mod capacity;
pub mod constants;
pub mod delay;
pub mod wait;

pub use capacity::Capacity;
pub use delay::queue_delay;
pub use wait::{head_platform, wait_for_worker};

use crate::domain::{Job, Platform, Worker};
use crate::error::{AppError, Result};
use constants::{MIN_DISPATCH_DELAY_MS, OVERRUN_FALLBACK_MS};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Estimator tunables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Floor on the reported dispatch delay
    pub min_dispatch_delay_ms: i64,
    /// Remaining time assumed for running jobs past their estimate
    pub overrun_fallback_ms: i64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            min_dispatch_delay_ms: MIN_DISPATCH_DELAY_MS,
            overrun_fallback_ms: OVERRUN_FALLBACK_MS,
        }
    }
}

impl EstimatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_dispatch_delay_ms < 0 {
            return Err(AppError::Config(format!(
                "min_dispatch_delay_ms must not be negative (got {})",
                self.min_dispatch_delay_ms
            )));
        }
        if self.overrun_fallback_ms < 0 {
            return Err(AppError::Config(format!(
                "overrun_fallback_ms must not be negative (got {})",
                self.overrun_fallback_ms
            )));
        }
        Ok(())
    }
}

/// Consistent view of the farm for one estimation pass
#[derive(Debug, Clone, Default)]
pub struct QueueSnapshot {
    /// Eligible workers (ineligible ones are ignored if present)
    pub workers: Vec<Worker>,
    pub waiting: Vec<Job>,
    pub running: Vec<Job>,
}

impl QueueSnapshot {
    pub fn new(workers: Vec<Worker>, waiting: Vec<Job>, running: Vec<Job>) -> Self {
        Self {
            workers,
            waiting,
            running,
        }
    }

    pub fn capacity(&self) -> Capacity {
        Capacity::snapshot(&self.workers)
    }

    pub fn count_idle(&self, platform: &Platform) -> usize {
        capacity::count_idle(&self.workers, platform)
    }
}

/// Predicted dispatch of a job, with the terms that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchEstimate {
    pub job_id: i64,
    pub platform: Platform,
    /// Platform of the job in pole position when the estimate was made
    pub head_platform: Platform,
    pub wait_ms: i64,
    pub delay_ms: i64,
    /// Epoch ms
    pub start_at: i64,
}

/// Predicted start time (epoch ms) of `job`, or `None` when no eligible
/// worker can ever run it.
///
/// Fails with `InvalidState` unless `job` is WAITING.
pub fn estimate_start_time(
    job: &Job,
    snapshot: &QueueSnapshot,
    now_millis: i64,
    config: &EstimatorConfig,
) -> Result<Option<i64>> {
    Ok(estimate(job, snapshot, now_millis, config)?.map(|e| e.start_at))
}

/// Like [`estimate_start_time`] but returns the full breakdown.
pub fn estimate(
    job: &Job,
    snapshot: &QueueSnapshot,
    now_millis: i64,
    config: &EstimatorConfig,
) -> Result<Option<DispatchEstimate>> {
    job.ensure_waiting()?;
    let head = head_platform(job, &snapshot.waiting);
    let idle = snapshot.count_idle(&head);
    Ok(estimate_for_head(job, snapshot, head, idle, now_millis, config))
}

/// Estimate once the head platform and its idle-worker count are known.
///
/// `job` must already be checked to be WAITING.
pub(crate) fn estimate_for_head(
    job: &Job,
    snapshot: &QueueSnapshot,
    head: Platform,
    idle: usize,
    now_millis: i64,
    config: &EstimatorConfig,
) -> Option<DispatchEstimate> {
    let capacity = snapshot.capacity();
    let platform = job.platform();
    if capacity.builders_for(&platform) == 0 {
        warn!(job_id = job.id, platform = %platform, "No eligible worker can run job");
        return None;
    }

    let delay_ms = queue_delay(job, &snapshot.waiting, &capacity);
    let wait_ms = wait_for_worker(
        &head,
        idle,
        &snapshot.workers,
        &snapshot.running,
        now_millis,
        config.overrun_fallback_ms,
    );

    let start_at =
        now_millis.saturating_add(config.min_dispatch_delay_ms.max(wait_ms.saturating_add(delay_ms)));

    debug!(
        job_id = job.id,
        platform = %platform,
        head = %head,
        idle,
        wait_ms,
        delay_ms,
        start_at,
        "Estimated dispatch time"
    );

    Some(DispatchEstimate {
        job_id: job.id,
        platform,
        head_platform: head,
        wait_ms,
        delay_ms,
        start_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Processor;

    const NOW: i64 = 1_700_000_000_000;

    fn p1() -> Processor {
        Processor::new("p1")
    }

    fn config() -> EstimatorConfig {
        EstimatorConfig::default()
    }

    #[test]
    fn test_idle_worker_no_competition_hits_floor() {
        let job = Job::waiting(1, 10, 0).with_processor(p1());
        let snapshot = QueueSnapshot::new(
            vec![Worker::new(1, "bob", false).with_processor(p1())],
            vec![job.clone()],
            vec![],
        );

        let start = estimate_start_time(&job, &snapshot, NOW, &config()).unwrap();
        assert_eq!(start, Some(NOW + 5_000));
    }

    #[test]
    fn test_busy_worker_waits_for_running_job() {
        let job = Job::waiting(2, 10, 60_000).with_processor(p1());
        let running = Job::running(1, NOW - 100_000, 500_000).with_processor(p1());
        let snapshot = QueueSnapshot::new(
            vec![Worker::new(1, "bob", false)
                .with_processor(p1())
                .with_current_job(running.id)],
            vec![job.clone()],
            vec![running],
        );

        let estimate = estimate(&job, &snapshot, NOW, &config()).unwrap().unwrap();
        assert_eq!(estimate.wait_ms, 400_000);
        assert_eq!(estimate.delay_ms, 0);
        assert_eq!(estimate.start_at, NOW + 400_000);
    }

    #[test]
    fn test_no_capable_worker_is_unknown() {
        let job = Job::waiting(1, 10, 0).with_processor(Processor::new("s390x"));
        let snapshot = QueueSnapshot::new(
            vec![Worker::new(1, "bob", false).with_processor(p1())],
            vec![job.clone()],
            vec![],
        );

        assert_eq!(
            estimate_start_time(&job, &snapshot, NOW, &config()).unwrap(),
            None
        );
    }

    #[test]
    fn test_only_ineligible_workers_is_unknown() {
        let job = Job::waiting(1, 10, 0).with_processor(p1());
        let snapshot = QueueSnapshot::new(
            vec![
                Worker::new(1, "bob", false).with_processor(p1()).disabled(),
                Worker::new(2, "sue", false).with_processor(p1()).manual(),
            ],
            vec![job.clone()],
            vec![],
        );

        assert_eq!(
            estimate_start_time(&job, &snapshot, NOW, &config()).unwrap(),
            None
        );
    }

    #[test]
    fn test_running_job_is_invalid_state() {
        let job = Job::running(1, NOW, 1_000).with_processor(p1());
        let snapshot = QueueSnapshot::new(
            vec![Worker::new(1, "bob", false).with_processor(p1())],
            vec![],
            vec![job.clone()],
        );

        let err = estimate_start_time(&job, &snapshot, NOW, &config()).unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[test]
    fn test_wait_and_delay_add_up() {
        let job = Job::waiting(10, 0, 60_000).with_processor(p1());
        let running = Job::running(1, NOW, 100_000).with_processor(p1());
        let snapshot = QueueSnapshot::new(
            vec![Worker::new(1, "bob", false)
                .with_processor(p1())
                .with_current_job(1)],
            vec![
                Job::waiting(2, 50, 300_000).with_processor(p1()),
                Job::waiting(3, 50, 300_000).with_processor(p1()),
                job.clone(),
            ],
            vec![running],
        );

        let estimate = estimate(&job, &snapshot, NOW, &config()).unwrap().unwrap();
        assert_eq!(estimate.wait_ms, 100_000);
        assert_eq!(estimate.delay_ms, 600_000);
        assert_eq!(estimate.start_at, NOW + 700_000);
    }

    #[test]
    fn test_custom_floor() {
        let job = Job::waiting(1, 10, 0);
        let snapshot = QueueSnapshot::new(vec![Worker::new(1, "bob", false)], vec![], vec![]);
        let config = EstimatorConfig {
            min_dispatch_delay_ms: 30_000,
            ..EstimatorConfig::default()
        };

        assert_eq!(
            estimate_start_time(&job, &snapshot, NOW, &config).unwrap(),
            Some(NOW + 30_000)
        );
    }

    #[test]
    fn test_idempotent() {
        let job = Job::waiting(10, 0, 60_000).with_processor(p1());
        let snapshot = QueueSnapshot::new(
            vec![Worker::new(1, "bob", false)
                .with_processor(p1())
                .with_current_job(1)],
            vec![Job::waiting(2, 50, 300_000).with_processor(p1()), job.clone()],
            vec![Job::running(1, NOW - 1_000_000, 10_000).with_processor(p1())],
        );

        let first = estimate(&job, &snapshot, NOW, &config()).unwrap();
        let second = estimate(&job, &snapshot, NOW, &config()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_config_validate() {
        assert!(EstimatorConfig::default().validate().is_ok());

        let bad = EstimatorConfig {
            overrun_fallback_ms: -1,
            ..EstimatorConfig::default()
        };
        assert!(matches!(bad.validate(), Err(AppError::Config(_))));
    }
}
