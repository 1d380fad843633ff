//! Worker pool snapshot: per-platform builder counts and idle counts.

use crate::domain::{Platform, Worker};
use std::collections::BTreeMap;

/// Eligible builder counts, keyed by platform.
///
/// A worker is credited once to every `(processor, virtualized)` pair it
/// declares and once to the processor-independent aggregate of its
/// virtualization. Multi-processor workers are therefore counted under each
/// of their processors, which can overstate contention across platforms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capacity {
    by_platform: BTreeMap<Platform, usize>,
    by_virtualization: BTreeMap<bool, usize>,
}

impl Capacity {
    /// Count eligible workers; ineligible ones are skipped.
    pub fn snapshot(workers: &[Worker]) -> Self {
        let mut capacity = Capacity::default();

        for worker in workers.iter().filter(|w| w.is_eligible()) {
            *capacity
                .by_virtualization
                .entry(worker.virtualized)
                .or_default() += 1;

            for processor in &worker.processors {
                let platform = Platform::new(Some(processor.clone()), worker.virtualized);
                *capacity.by_platform.entry(platform).or_default() += 1;
            }
        }

        capacity
    }

    /// Builders able to take a job for `platform`.
    ///
    /// Processor-independent platforms resolve to the aggregate for their
    /// virtualization.
    pub fn builders_for(&self, platform: &Platform) -> usize {
        if platform.is_independent() {
            self.total(platform.virtualized)
        } else {
            self.by_platform.get(platform).copied().unwrap_or(0)
        }
    }

    /// All eligible builders of the given virtualization
    pub fn total(&self, virtualized: bool) -> usize {
        self.by_virtualization
            .get(&virtualized)
            .copied()
            .unwrap_or(0)
    }

    /// Processor-specific platforms with their builder counts, in key order
    pub fn platforms(&self) -> impl Iterator<Item = (&Platform, usize)> {
        self.by_platform.iter().map(|(p, n)| (p, *n))
    }

    pub fn is_empty(&self) -> bool {
        self.by_virtualization.values().all(|n| *n == 0)
    }
}

/// Eligible workers able to run `platform` that have no job right now
pub fn count_idle(workers: &[Worker], platform: &Platform) -> usize {
    workers
        .iter()
        .filter(|w| w.is_eligible() && w.is_idle() && w.can_run(platform))
        .count()
}
