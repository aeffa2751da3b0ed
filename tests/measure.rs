mod common;

use common::{ret_without_pmu, sum};
use perf_measure::config::Opts;
use perf_measure::count::group::CounterGroup;
use perf_measure::count::{Counter, State as CounterState};
use perf_measure::event::{Event, Hardware, Raw};
use perf_measure::session::State;
use perf_measure::{measure, Measure};

#[test]
fn test_measure_scales_with_work() {
    ret_without_pmu!();

    let (sum1, [instrs1]) = one(measure([Hardware::Instructions], || sum(1_000_000)));
    let (sum2, [instrs2]) = one(measure([Hardware::Instructions], || sum(10_000_000)));

    assert_eq!(sum1, 499_999_500_000);
    assert_eq!(sum2, 49_999_995_000_000);
    assert!(instrs1 > 1_000_000, "{}", instrs1);

    let ratio = instrs2 as f64 / instrs1 as f64;
    assert!(7.0 < ratio && ratio < 15.0, "ratio {}", ratio);
}

fn one<R>(result: perf_measure::Result<(R, Vec<u64>)>) -> (R, [u64; 1]) {
    let (out, counts) = result.unwrap();
    let counts: [u64; 1] = counts.try_into().unwrap();
    (out, counts)
}

#[test]
fn test_reads_accumulate_within_window() {
    ret_without_pmu!();

    let mut session = Measure::new([Hardware::Instructions]).unwrap();
    session.enable().unwrap();
    sum(1_000_000);
    let first = session.read().unwrap()[0];
    sum(1_000_000);
    let second = session.read().unwrap()[0];
    session.disable().unwrap();

    let ratio = second as f64 / first as f64;
    assert!(1.5 < ratio && ratio < 2.5, "ratio {}", ratio);

    // Disabled counters keep their counts.
    sum(1_000_000);
    assert_eq!(session.read().unwrap()[0], session.read().unwrap()[0]);
    assert!(session.read().unwrap()[0] >= second);
}

#[test]
fn test_reenable_starts_new_window() {
    ret_without_pmu!();

    let mut session = Measure::new([Hardware::Instructions, Hardware::CpuCycles]).unwrap();
    session.enable().unwrap();
    sum(1_000_000);
    session.disable().unwrap();
    let window1 = session.read().unwrap();
    assert!(window1[0] > 1_000_000);

    session.enable().unwrap();
    let window2 = session.read().unwrap();
    // Only the few instructions between the enable ioctl and the read syscall.
    assert!(window2[0] < 10_000, "{:?}", window2);
    assert!(window2[1] < window1[1], "{:?} {:?}", window1, window2);

    session.release().unwrap();
    assert_eq!(session.state(), State::Released);
}

#[test]
fn test_stat_times_cover_current_window() {
    ret_without_pmu!();

    let mut session = Measure::new([Hardware::Instructions, Hardware::CpuCycles]).unwrap();
    session.enable().unwrap();
    sum(10_000_000);
    session.disable().unwrap();
    let window1 = session.stat().unwrap();

    session.enable().unwrap();
    let window2 = session.stat().unwrap();
    assert!(
        window2.time_enabled < window1.time_enabled,
        "{:?} {:?}",
        window1,
        window2
    );
    assert!(window2.time_running <= window2.time_enabled);
}

#[test]
fn test_group_keeps_caller_order() {
    ret_without_pmu!();

    let events = [Hardware::CpuCycles, Hardware::Instructions, Hardware::CpuCycles];
    let mut group = CounterGroup::open(events, Opts::default()).unwrap();
    let opened: Vec<Event> = group.events().copied().collect();
    assert_eq!(opened, events.map(Event::from));

    group.enable_all().unwrap();
    sum(1_000_000);
    group.disable_all().unwrap();

    let stat = group.stat_all().unwrap();
    assert_eq!(stat.counts.len(), 3);
    assert!(stat.counts[1] > 1_000_000);
    assert!(stat.time_running > 0);
    assert!(stat.time_running <= stat.time_enabled);
    assert!(group.counters().iter().all(|c| c.state() == CounterState::Disabled));
}

#[test]
fn test_counter_lifecycle() {
    ret_without_pmu!();

    let mut counter = Counter::open(Hardware::Instructions, Opts::default()).unwrap();
    assert_eq!(counter.state(), CounterState::Opened);
    assert_eq!(counter.read().unwrap(), 0);
    assert!(counter.disable().unwrap_err().is_invalid_state());

    counter.enable().unwrap();
    assert!(counter.enable().unwrap_err().is_invalid_state());
    sum(100_000);
    let a = counter.read().unwrap();
    sum(100_000);
    let b = counter.read().unwrap();
    assert!(b > a);

    counter.disable().unwrap();
    counter.reset().unwrap();
    assert_eq!(counter.read().unwrap(), 0);

    counter.close().unwrap();
    assert_eq!(counter.state(), CounterState::Closed);
    assert!(counter.close().unwrap_err().is_invalid_state());
    assert!(counter.read().unwrap_err().is_invalid_state());
}

// Event 0xc0 counts retired instructions on both Intel and AMD cores.
#[cfg(target_arch = "x86_64")]
#[test]
fn test_raw_event_matches_generic() {
    ret_without_pmu!();

    let events: [Event; 2] = [Hardware::Instructions.into(), Raw::new(0xc0).into()];
    let (_, counts) = match measure(events, || sum(1_000_000)) {
        Ok(it) => it,
        Err(e) if e.is_unsupported() || e.is_exhausted() => {
            eprintln!("skipped: {}", e);
            return;
        }
        Err(e) => panic!("{}", e),
    };

    let ratio = counts[1] as f64 / counts[0] as f64;
    assert!(0.5 < ratio && ratio < 2.0, "{:?}", counts);
}
