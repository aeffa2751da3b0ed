use std::borrow::Borrow;
use std::fs::File;
use std::io::{self, ErrorKind};

use super::{Counter, Stat, State};
use crate::config::Opts;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::ffi::bindings as b;
use crate::ffi::syscall;

/// Counter group.
///
/// An event group is scheduled onto the CPU as a unit: it will be put onto
/// the CPU only if all of the events in the group can be put onto the CPU.
///
/// This means that the values of the member events can be meaningfully compared, added,
/// divided (to get ratios), and so on with each other, since they have counted events
/// for the same set of executed instructions.
///
/// The first event is the group leader. Enabling, disabling and reading
/// go through the leader, so all members start and stop together and are
/// read in one `read(2)`. Counts are always returned in the order the
/// events were given to [`open`][Self::open].
///
/// # Examples
///
/// ```rust
/// use perf_measure::count::group::CounterGroup;
/// use perf_measure::event::Hardware;
///
/// # if !perf_measure::is_supported() { return; }
/// let events = [Hardware::Instructions, Hardware::CpuCycles];
/// let mut group = CounterGroup::open(events, perf_measure::config::Opts::default()).unwrap();
///
/// group.enable_all().unwrap();
/// std::hint::black_box((0..100_000u64).sum::<u64>());
/// group.disable_all().unwrap();
///
/// let counts = group.read_all().unwrap();
/// println!("IPC: {}", counts[0] as f64 / counts[1] as f64);
/// ```
#[derive(Debug)]
pub struct CounterGroup {
    // The leader comes first, the siblings follow in the caller's order.
    pub(super) counters: Vec<Counter>,
}

type Ioctl = fn(&File, u32) -> io::Result<()>;

/// Counts of a group together with its scheduling times.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupStat {
    /// One count per event, in the order the group was opened with.
    pub counts: Vec<u64>,

    /// Nanoseconds the group has been enabled since the last
    /// [`enable_all`][CounterGroup::enable_all].
    pub time_enabled: u64,

    /// Nanoseconds of `time_enabled` the group has actually been on the PMU.
    ///
    /// Less than `time_enabled` means the group was multiplexed, which can
    /// only happen without [`Opts::pin_on_pmu`].
    pub time_running: u64,
}

impl CounterGroup {
    /// Opens one counter per event, in order.
    ///
    /// If any of them fails, the counters opened so far are closed before
    /// the error is returned.
    pub fn open<I>(events: I, opts: impl Borrow<Opts>) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Event>,
    {
        let opts = opts.borrow();
        let mut group = Self { counters: vec![] };

        for event in events {
            let event = event.into();
            let counter = match group.counters.first() {
                None => Counter::open_in(event, opts, None),
                Some(leader) => Counter::open_in(event, opts, Some(leader))
                    .map_err(|e| sibling_error(e, event, opts)),
            };
            match counter {
                Ok(counter) => group.counters.push(counter),
                Err(e) => {
                    log::debug!("rolling back group of {} counters: {}", group.len(), e);
                    group.close_all();
                    return Err(e);
                }
            }
        }

        let len = group.len();
        if let Some(leader) = group.counters.first_mut() {
            let size = Stat::read_buf_size(len, leader.read_format);
            leader.read_buf.resize(size, 0);
        }

        Ok(group)
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Returns the counters in the order they were opened.
    pub fn counters(&self) -> &[Counter] {
        &self.counters
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.counters.iter().map(Counter::event)
    }

    /// Returns the shared state of the counters, `None` for an empty group.
    pub fn state(&self) -> Option<State> {
        self.counters.first().map(Counter::state)
    }

    fn expect_state(&self, op: &'static str, allowed: &[State]) -> Result<()> {
        match self.counters.iter().find(|c| !allowed.contains(&c.state)) {
            Some(c) => Err(Error::invalid_state(op, c.state.as_str())),
            None => Ok(()),
        }
    }

    fn set_state(&mut self, state: State) {
        for counter in &mut self.counters {
            counter.state = state;
        }
    }

    // Runs the ioctl with `PERF_IOC_FLAG_GROUP` on the leader. Returns `Ok(false)`
    // if the kernel does not accept the group flag so the caller falls back to a
    // sequential loop over the counters.
    fn group_ioctl(&self, ops: &[Ioctl]) -> Result<bool> {
        let Some(leader) = self.counters.first() else {
            return Ok(true);
        };
        let file = leader.file()?;
        for op in ops {
            match op(file, b::PERF_IOC_FLAG_GROUP as _) {
                Ok(()) => {}
                Err(e) if matches!(e.raw_os_error(), Some(libc::EINVAL | libc::ENOTTY)) => {
                    log::debug!("group ioctl rejected ({}), falling back to sequential", e);
                    return Ok(false);
                }
                Err(e) => return Err(Error::io(Some(leader.event), e)),
            }
        }
        Ok(true)
    }

    // Applies `op` to the counters in order. When one fails, `undo` is applied to
    // the counters already switched so the group is left in a single state.
    pub(super) fn each_or_undo(
        &mut self,
        op: fn(&mut Counter) -> Result<()>,
        undo: fn(&mut Counter) -> Result<()>,
    ) -> Result<()> {
        for i in 0..self.counters.len() {
            if let Err(e) = op(&mut self.counters[i]) {
                for counter in self.counters[..i].iter_mut().rev() {
                    if let Err(undo_err) = undo(counter) {
                        log::warn!("failed to roll back {}: {}", counter.event, undo_err);
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Resets and enables all counters in the group.
    ///
    /// Without kernel support for group-wide ioctls the counters are enabled
    /// one by one in order, so later counters miss the first few events the
    /// earlier ones see.
    pub fn enable_all(&mut self) -> Result<()> {
        self.expect_state("enable group", &[State::Opened, State::Disabled])?;
        // The leader reports the times of the whole group.
        if let Some(leader) = self.counters.first_mut() {
            leader.start_window();
        }
        let ops: [Ioctl; 2] = [syscall::reset, syscall::enable];
        if !self.group_ioctl(&ops)? {
            self.each_or_undo(Counter::enable, Counter::disable)?;
        }
        self.set_state(State::Enabled);
        Ok(())
    }

    /// Disables all counters in the group, the counts are kept.
    pub fn disable_all(&mut self) -> Result<()> {
        self.expect_state("disable group", &[State::Enabled])?;
        let ops: [Ioctl; 1] = [syscall::disable];
        if !self.group_ioctl(&ops)? {
            self.each_or_undo(Counter::disable, Counter::resume)?;
        }
        self.set_state(State::Disabled);
        Ok(())
    }

    /// Clears the counts of all counters in the group.
    pub fn reset_all(&mut self) -> Result<()> {
        self.expect_state("reset group", &[State::Opened, State::Enabled, State::Disabled])?;
        let ops: [Ioctl; 1] = [syscall::reset];
        if !self.group_ioctl(&ops)? {
            for counter in &mut self.counters {
                counter.reset()?;
            }
        }
        Ok(())
    }

    /// Reads all counts in one batch, in the order the group was opened with.
    pub fn read_all(&mut self) -> Result<Vec<u64>> {
        Ok(self.stat_all()?.counts)
    }

    pub fn stat_all(&mut self) -> Result<GroupStat> {
        let len = self.counters.len();
        let Some(leader) = self.counters.first_mut() else {
            return Ok(GroupStat::default());
        };
        let leader_event = leader.event;
        let stat = leader.stat()?;

        let time_enabled = stat.time_enabled.unwrap_or(0);
        let time_running = stat.time_running.unwrap_or(0);
        check_scheduled(leader_event, time_enabled, time_running)?;

        let values: Vec<(Option<u64>, u64)> = std::iter::once((stat.id, stat.count))
            .chain(stat.siblings.iter().map(|s| (s.id, s.count)))
            .collect();

        let mut counts = Vec::with_capacity(len);
        for counter in &self.counters {
            let value = values.iter().find(|(id, _)| *id == Some(counter.id));
            match value {
                Some((_, count)) => counts.push(*count),
                None => {
                    let e = io::Error::new(ErrorKind::InvalidData, "member missing from group read");
                    return Err(Error::io(Some(counter.event), e));
                }
            }
        }

        Ok(GroupStat {
            counts,
            time_enabled,
            time_running,
        })
    }

    /// Closes every counter that is still open, siblings first.
    pub fn close_all(&mut self) {
        for counter in self.counters.iter_mut().rev() {
            if counter.state != State::Closed {
                // Only fails for counters that are already closed.
                let _ = counter.close();
            }
        }
    }
}

impl Drop for CounterGroup {
    fn drop(&mut self) {
        self.close_all();
    }
}

// Judges the times of the current window. A group that was enabled but never
// got onto the PMU would otherwise report zero counts.
pub(super) fn check_scheduled(leader: Event, time_enabled: u64, time_running: u64) -> Result<()> {
    if time_enabled > 0 && time_running == 0 {
        return Err(Error::exhausted(
            Some(leader),
            "group was never scheduled on the PMU",
        ));
    }
    if time_running < time_enabled {
        log::warn!(
            "group led by {} was multiplexed, ran {}ns of {}ns",
            leader,
            time_running,
            time_enabled
        );
    }
    Ok(())
}

// The PMU driver validates whether the whole group fits on the hardware when a
// sibling joins, and rejects it with `EINVAL`:
// https://github.com/torvalds/linux/blob/v6.13/arch/x86/events/core.c#L2382
// Tell that apart from an event the CPU can't count at all by opening it alone.
fn sibling_error(err: Error, event: Event, opts: &Opts) -> Error {
    let Error::UnsupportedEvent { source, .. } = &err else {
        return err;
    };
    if source.raw_os_error() != Some(libc::EINVAL) {
        return err;
    }
    match Counter::open_in(event, opts, None) {
        Ok(_) => Error::exhausted(Some(event), "group does not fit on the PMU"),
        Err(_) => err,
    }
}
