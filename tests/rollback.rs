// Counts the perf fds of the whole process, so everything runs in one test
// to keep other tests from opening counters at the same time.

mod common;

use std::panic;

use common::{open_perf_fds, ret_without_pmu, sum};
use perf_measure::config::Opts;
use perf_measure::count::group::CounterGroup;
use perf_measure::event::{Cache, CacheId, CacheOp, CacheResult, Event, Hardware};
use perf_measure::{measure, try_measure, Error, Measure};

#[test]
fn test_no_counter_outlives_its_owner() {
    ret_without_pmu!();

    let baseline = open_perf_fds();

    partial_group_is_rolled_back(baseline);
    failed_work_releases_session(baseline);
    panicking_work_releases_session(baseline);
    dropped_session_releases_counters(baseline);
    oversized_group_is_exhausted(baseline);

    // Everything above left the PMU usable.
    let (_, counts) = measure([Hardware::Instructions], || sum(1_000)).unwrap();
    assert!(counts[0] > 0);
    assert_eq!(open_perf_fds(), baseline);
}

fn partial_group_is_rolled_back(baseline: usize) {
    let invalid = Cache::new(CacheId::L1i, CacheOp::Write, CacheResult::Miss);
    let events: [Event; 3] = [
        Hardware::Instructions.into(),
        Hardware::CpuCycles.into(),
        invalid.into(),
    ];

    let err = CounterGroup::open(events, Opts::default()).unwrap_err();
    assert!(err.is_unsupported());
    assert_eq!(err.event(), Some(&Event::Cache(invalid)));
    assert_eq!(open_perf_fds(), baseline);
}

#[derive(Debug)]
enum WorkError {
    Perf(Error),
    Failed,
}

impl From<Error> for WorkError {
    fn from(e: Error) -> Self {
        WorkError::Perf(e)
    }
}

fn failed_work_releases_session(baseline: usize) {
    let result = try_measure([Hardware::Instructions, Hardware::CpuCycles], || {
        assert_eq!(open_perf_fds(), baseline + 2);
        Err::<(), _>(WorkError::Failed)
    });
    assert!(matches!(result, Err(WorkError::Failed)), "{:?}", result);
    assert_eq!(open_perf_fds(), baseline);
}

fn panicking_work_releases_session(baseline: usize) {
    let result = panic::catch_unwind(|| {
        measure([Hardware::Instructions], || panic!("work failed")).map(|_| ())
    });
    assert!(result.is_err());
    assert_eq!(open_perf_fds(), baseline);
}

fn dropped_session_releases_counters(baseline: usize) {
    let mut session = Measure::new([Hardware::Instructions, Hardware::CpuCycles]).unwrap();
    session.enable().unwrap();
    assert_eq!(open_perf_fds(), baseline + 2);
    drop(session);
    assert_eq!(open_perf_fds(), baseline);
}

// No PMU holds 64 counters at once. The kernel either rejects the group when
// the members are added, or evicts the pinned group once it is enabled.
fn oversized_group_is_exhausted(baseline: usize) {
    let events = [Hardware::Instructions; 64];
    let result = Measure::new(events).and_then(|mut session| {
        session.enable()?;
        sum(1_000);
        session.read()
    });
    match result {
        Ok(counts) => panic!("64 counters fit on the PMU: {:?}", counts),
        Err(e) => assert!(e.is_exhausted(), "{}", e),
    }
    assert_eq!(open_perf_fds(), baseline);
}
