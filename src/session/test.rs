use super::{measure, try_measure, Measure, State};
use crate::error::Error;
use crate::event::{Cache, CacheId, CacheOp, CacheResult, Event};

fn empty() -> Measure {
    Measure::new(Vec::<Event>::new()).unwrap()
}

#[test]
fn test_lifecycle() {
    let mut session = empty();
    assert_eq!(session.state(), State::Armed);
    assert!(session.is_empty());

    session.enable().unwrap();
    assert_eq!(session.state(), State::Running);
    assert_eq!(session.read().unwrap(), Vec::<u64>::new());

    session.disable().unwrap();
    assert_eq!(session.state(), State::Stopped);
    assert_eq!(session.read().unwrap(), Vec::<u64>::new());

    // Re-enable starts a new window.
    session.enable().unwrap();
    assert_eq!(session.state(), State::Running);
    assert_eq!(session.read().unwrap(), Vec::<u64>::new());

    session.release().unwrap();
    assert_eq!(session.state(), State::Released);
    session.release().unwrap();
    assert_eq!(session.state(), State::Released);
}

#[test]
fn test_read_before_enable() {
    let mut session = empty();
    let err = session.read().unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidState {
            op: "read",
            state: "armed"
        }
    ));
}

#[test]
fn test_invalid_transitions() {
    let mut session = empty();
    assert!(session.disable().unwrap_err().is_invalid_state());

    session.enable().unwrap();
    assert!(session.enable().unwrap_err().is_invalid_state());

    session.disable().unwrap();
    assert!(session.disable().unwrap_err().is_invalid_state());

    session.release().unwrap();
    assert!(session.enable().unwrap_err().is_invalid_state());
    assert!(session.disable().unwrap_err().is_invalid_state());
    assert!(session.read().unwrap_err().is_invalid_state());
}

#[test]
fn test_release_armed_and_running() {
    let mut session = empty();
    session.release().unwrap();
    assert_eq!(session.state(), State::Released);

    let mut session = empty();
    session.enable().unwrap();
    session.release().unwrap();
    assert_eq!(session.state(), State::Released);
}

#[test]
fn test_open_fails_fast() {
    let ev = Cache::new(CacheId::Itlb, CacheOp::Prefetch, CacheResult::Access);
    let err = Measure::new([ev]).unwrap_err();
    assert!(err.is_unsupported());
}

#[test]
fn test_measure_empty() {
    let (out, counts) = measure(Vec::<Event>::new(), || 40 + 2).unwrap();
    assert_eq!(out, 42);
    assert!(counts.is_empty());
}

#[derive(Debug, PartialEq)]
enum WorkError {
    Perf,
    Failed(u32),
}

impl From<Error> for WorkError {
    fn from(_: Error) -> Self {
        WorkError::Perf
    }
}

#[test]
fn test_try_measure_passes_work_error() {
    let result = try_measure(Vec::<Event>::new(), || Err::<(), _>(WorkError::Failed(7)));
    assert_eq!(result.unwrap_err(), WorkError::Failed(7));

    let (out, counts) = try_measure(Vec::<Event>::new(), || Ok::<_, WorkError>("ok")).unwrap();
    assert_eq!(out, "ok");
    assert!(counts.is_empty());
}

#[test]
fn test_try_measure_converts_session_error() {
    let ev = Cache::new(CacheId::Bpu, CacheOp::Prefetch, CacheResult::Miss);
    let result = try_measure([ev], || Ok::<_, WorkError>(()));
    assert_eq!(result.unwrap_err(), WorkError::Perf);
}
