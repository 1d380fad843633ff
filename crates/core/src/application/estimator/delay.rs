//! Queue delay: apportioned cost of competing jobs ranked ahead.

use crate::application::estimator::capacity::Capacity;
use crate::domain::{Job, JobStatus, Platform};
use std::collections::BTreeMap;
use tracing::debug;

/// Jobs ahead of the job of interest that share one platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobGroup {
    pub job_count: usize,
    pub total_duration_ms: i64,
}

impl JobGroup {
    /// Delay this group imposes given `builders` able to run it.
    ///
    /// Divides across `min(job_count, builders)` when that exceeds one,
    /// flooring the result; serialises (full total) otherwise.
    pub fn apportioned_ms(&self, builders: usize) -> i64 {
        let divisor = self.job_count.min(builders);
        if divisor > 1 {
            self.total_duration_ms / divisor as i64
        } else {
            self.total_duration_ms
        }
    }
}

/// Group the WAITING jobs ahead of and competing with `job` by platform.
pub fn group_ahead(job: &Job, waiting: &[Job]) -> BTreeMap<Platform, JobGroup> {
    let mut groups: BTreeMap<Platform, JobGroup> = BTreeMap::new();

    for ahead in waiting
        .iter()
        .filter(|candidate| candidate.status == JobStatus::Waiting && candidate.is_ahead_of(job))
    {
        let group = groups.entry(ahead.platform()).or_default();
        group.job_count += 1;
        group.total_duration_ms = group
            .total_duration_ms
            .saturating_add(ahead.estimated_duration_ms.max(0));
    }

    groups
}

/// Milliseconds of queue delay imposed on `job` by the jobs ranked ahead.
///
/// Groups whose platform has no builder are unschedulable and contribute
/// nothing.
pub fn queue_delay(job: &Job, waiting: &[Job], capacity: &Capacity) -> i64 {
    let own = job.platform();

    group_ahead(job, waiting)
        .iter()
        .filter_map(|(platform, group)| {
            let builders = capacity.builders_for(platform);
            if builders == 0 {
                debug!(
                    job_id = job.id,
                    platform = %platform,
                    jobs = group.job_count,
                    "Skipping unschedulable group"
                );
                return None;
            }
            if !platform.competes_with(&own) {
                return None;
            }

            let delay = group.apportioned_ms(builders);
            debug!(
                job_id = job.id,
                platform = %platform,
                jobs = group.job_count,
                builders,
                delay_ms = delay,
                "Apportioned group delay"
            );
            Some(delay)
        })
        .fold(0i64, i64::saturating_add)
}
