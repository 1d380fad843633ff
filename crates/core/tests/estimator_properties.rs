// Estimator behaviour through the public API
// Floor, capability, overrun, serialisation vs parallelism, unschedulable
// jobs, idempotence and precondition enforcement.

use buildeta_core::application::estimator::{
    estimate, estimate_start_time, queue_delay, Capacity, EstimatorConfig, QueueSnapshot,
};
use buildeta_core::domain::{Job, Processor, Worker};
use buildeta_core::AppError;

const NOW: i64 = 1_700_000_000_000;
const SECOND: i64 = 1_000;

fn p1() -> Processor {
    Processor::new("p1")
}

fn p1_worker(id: i64) -> Worker {
    Worker::new(id, format!("builder-{}", id), false).with_processor(p1())
}

#[test]
fn test_floor_for_every_idle_platform() {
    let platforms = vec![
        (Some(p1()), false),
        (None, false),
        (Some(Processor::new("p2")), true),
        (None, true),
    ];

    for (processor, virtualized) in platforms {
        let mut worker = Worker::new(1, "w", virtualized);
        if let Some(p) = &processor {
            worker = worker.with_processor(p.clone());
        }
        let mut job = Job::waiting(1, 10, 3_600 * SECOND).with_virtualized(virtualized);
        job.processor = processor;

        let snapshot = QueueSnapshot::new(vec![worker], vec![job.clone()], vec![]);
        let start = estimate_start_time(&job, &snapshot, NOW, &EstimatorConfig::default()).unwrap();
        assert_eq!(start, Some(NOW + 5 * SECOND), "platform {}", job.platform());
    }
}

#[test]
fn test_no_eligible_worker_anywhere_is_none() {
    let job = Job::waiting(1, 10, 0).with_processor(p1()).with_virtualized(true);
    let snapshot = QueueSnapshot::new(
        vec![p1_worker(1), Worker::new(2, "v", true).with_processor(Processor::new("p2"))],
        vec![job.clone()],
        vec![],
    );

    let start = estimate_start_time(&job, &snapshot, NOW, &EstimatorConfig::default()).unwrap();
    assert_eq!(start, None);
}

#[test]
fn test_overrun_job_contributes_fallback() {
    let job = Job::waiting(2, 10, 0).with_processor(p1());
    let overrun = Job::running(1, NOW - 1_000 * SECOND, 300 * SECOND).with_processor(p1());
    let snapshot = QueueSnapshot::new(
        vec![p1_worker(1).with_current_job(1)],
        vec![job.clone()],
        vec![overrun],
    );

    let estimate = estimate(&job, &snapshot, NOW, &EstimatorConfig::default())
        .unwrap()
        .unwrap();
    assert_eq!(estimate.wait_ms, 120 * SECOND);
    assert_eq!(estimate.start_at, NOW + 120 * SECOND);
}

#[test]
fn test_two_jobs_ahead_serialize_on_one_worker_and_split_on_two() {
    let job = Job::waiting(3, 0, 0).with_processor(p1());
    let waiting = vec![
        Job::waiting(1, 10, 300 * SECOND).with_processor(p1()),
        Job::waiting(2, 10, 300 * SECOND).with_processor(p1()),
        job.clone(),
    ];

    let one = Capacity::snapshot(&[p1_worker(1)]);
    assert_eq!(queue_delay(&job, &waiting, &one), 600 * SECOND);

    let two = Capacity::snapshot(&[p1_worker(1), p1_worker(2)]);
    assert_eq!(queue_delay(&job, &waiting, &two), 300 * SECOND);
}

#[test]
fn test_unschedulable_jobs_ahead_add_nothing() {
    // Independent job competes with everything of its virtualization,
    // but nobody builds p9.
    let job = Job::waiting(5, 0, 0);
    let waiting = vec![
        Job::waiting(1, 100, 86_400 * SECOND).with_processor(Processor::new("p9")),
        Job::waiting(2, 100, 86_400 * SECOND).with_processor(Processor::new("p9")),
        job.clone(),
    ];
    let snapshot = QueueSnapshot::new(vec![p1_worker(1)], waiting, vec![]);

    let estimate = estimate(&job, &snapshot, NOW, &EstimatorConfig::default())
        .unwrap()
        .unwrap();
    assert_eq!(estimate.delay_ms, 0);
}

#[test]
fn test_repeated_calls_agree() {
    let job = Job::waiting(4, 0, 0).with_processor(p1());
    let snapshot = QueueSnapshot::new(
        vec![p1_worker(1).with_current_job(1), p1_worker(2)],
        vec![
            Job::waiting(2, 5, 200 * SECOND).with_processor(p1()),
            Job::waiting(3, 5, 100 * SECOND),
            job.clone(),
        ],
        vec![Job::running(1, NOW - 10 * SECOND, 50 * SECOND).with_processor(p1())],
    );
    let config = EstimatorConfig::default();

    let first = estimate_start_time(&job, &snapshot, NOW, &config).unwrap();
    let second = estimate_start_time(&job, &snapshot, NOW, &config).unwrap();
    assert!(first.is_some());
    assert_eq!(first, second);
}

#[test]
fn test_running_job_raises_invalid_state() {
    let job = Job::running(1, NOW, 60 * SECOND).with_processor(p1());
    let snapshot = QueueSnapshot::new(vec![p1_worker(1)], vec![], vec![job.clone()]);

    let result = estimate_start_time(&job, &snapshot, NOW, &EstimatorConfig::default());
    assert!(matches!(result, Err(AppError::InvalidState(_))));
}

#[test]
fn test_scenario_running_job_on_only_worker() {
    let job = Job::waiting(2, 10, 0).with_processor(p1());
    let snapshot = QueueSnapshot::new(
        vec![p1_worker(1).with_current_job(1)],
        vec![job.clone()],
        vec![Job::running(1, NOW - 100 * SECOND, 500 * SECOND).with_processor(p1())],
    );

    let start = estimate_start_time(&job, &snapshot, NOW, &EstimatorConfig::default()).unwrap();
    assert_eq!(start, Some(NOW + 400 * SECOND));
}

#[test]
fn test_independent_build_occupying_worker_blocks_dispatch() {
    // The running build has no processor of its own; the worker it holds
    // is still the only p1 builder.
    let job = Job::waiting(2, 10, 0).with_processor(p1());
    let snapshot = QueueSnapshot::new(
        vec![p1_worker(1).with_current_job(1)],
        vec![job.clone()],
        vec![Job::running(1, NOW - 100 * SECOND, 500 * SECOND)],
    );

    let estimate = estimate(&job, &snapshot, NOW, &EstimatorConfig::default())
        .unwrap()
        .unwrap();
    assert_eq!(estimate.wait_ms, 400 * SECOND);
    assert_eq!(estimate.start_at, NOW + 400 * SECOND);
}
