//! Head-of-queue lookup and time until a suitable worker frees up.

use crate::domain::{Job, JobId, JobStatus, Platform, Worker};
use std::collections::HashMap;
use tracing::debug;

/// Platform of the job currently in pole position relative to `job`.
///
/// Among WAITING jobs ahead of and competing with `job`, the best-ranked one
/// (highest score, then lowest id) wins. With no such job, `job` heads its own
/// queue and its platform is returned.
pub fn head_platform(job: &Job, waiting: &[Job]) -> Platform {
    waiting
        .iter()
        .filter(|candidate| candidate.status == JobStatus::Waiting && candidate.is_ahead_of(job))
        .min_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)))
        .map(Job::platform)
        .unwrap_or_else(|| job.platform())
}

/// Milliseconds until the next worker for `head` becomes free.
///
/// Zero when `idle` workers exist for the head platform. Otherwise the
/// smallest remaining time across running jobs whose assigned worker can run
/// `head`, where a job that has overrun its estimate counts as
/// `overrun_fallback_ms`. The worker decides the match, not the running job's
/// own platform: an independent build occupying an amd64 worker still blocks
/// an amd64 head.
pub fn wait_for_worker(
    head: &Platform,
    idle: usize,
    workers: &[Worker],
    running: &[Job],
    now_millis: i64,
    overrun_fallback_ms: i64,
) -> i64 {
    if idle > 0 {
        debug!(platform = %head, idle, "Worker idle for head of queue");
        return 0;
    }

    let running_by_id: HashMap<JobId, &Job> = running
        .iter()
        .filter(|r| r.status == JobStatus::Running)
        .map(|r| (r.id, r))
        .collect();

    workers
        .iter()
        .filter(|w| w.is_eligible() && w.can_run(head))
        .filter_map(|w| running_by_id.get(&w.current_job?).copied())
        .filter_map(|r| {
            let remaining = r.remaining_ms(now_millis)?;
            if remaining < 0 {
                debug!(
                    job_id = r.id,
                    overrun_ms = remaining.saturating_neg(),
                    "Running job overran its estimate, assuming it ends soon"
                );
                Some(overrun_fallback_ms)
            } else {
                Some(remaining)
            }
        })
        .min()
        .unwrap_or(0)
}
