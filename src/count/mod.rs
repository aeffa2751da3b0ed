use std::borrow::Borrow;
use std::fmt;
use std::fs::File;
use std::io::{self, ErrorKind};
use std::os::fd::AsRawFd;

use crate::config::attr;
use crate::config::Opts;
use crate::error::{Error, Result};
use crate::event::Event;
use crate::ffi::bindings as b;
use crate::ffi::syscall::{self, perf_event_open};
use crate::support::paranoid_level;

pub mod group;
mod stat;

pub use stat::*;
use stat::TimeBase;

/// Lifecycle of a [`Counter`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Opened and not counting yet.
    Opened,
    /// Counting.
    Enabled,
    /// Not counting, the count is kept.
    Disabled,
    /// The fd has been released.
    Closed,
}

impl State {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            State::Opened => "opened",
            State::Enabled => "enabled",
            State::Disabled => "disabled",
            State::Closed => "closed",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One open hardware counter.
///
/// The counter owns its perf event fd exclusively; the fd is released by
/// [`close`][Self::close] or when the counter is dropped.
///
/// # Examples
///
/// ```rust
/// use perf_measure::config::Opts;
/// use perf_measure::count::Counter;
/// use perf_measure::event::Hardware;
///
/// # if !perf_measure::is_supported() { return; }
/// let mut counter = Counter::open(Hardware::Instructions, Opts::default()).unwrap();
///
/// counter.enable().unwrap();
/// std::hint::black_box((0..1000u64).sum::<u64>());
/// counter.disable().unwrap();
///
/// println!("{} instructions retired", counter.read().unwrap());
/// ```
pub struct Counter {
    pub(crate) event: Event,
    pub(crate) state: State,
    pub(crate) perf: Option<File>,
    pub(crate) id: u64,
    pub(crate) read_format: u64,
    pub(crate) read_buf: Vec<u8>,
    pub(crate) base: TimeBase,
}

impl Counter {
    /// Opens a standalone counter, which is the leader of its own group.
    pub fn open(event: impl Into<Event>, opts: impl Borrow<Opts>) -> Result<Self> {
        Self::open_in(event.into(), opts.borrow(), None)
    }

    // Opens a counter as the group leader (`leader == None`) or as a member of the leader's group.
    pub(crate) fn open_in(event: Event, opts: &Opts, leader: Option<&Counter>) -> Result<Self> {
        let event_cfg = event.config()?;
        let attr = attr::from(event_cfg, opts, leader.is_none());

        let group_fd = match leader {
            Some(leader) => leader.file()?.as_raw_fd(),
            None => -1,
        };
        let target = &opts.target;
        let flags = b::PERF_FLAG_FD_CLOEXEC as u64;
        let perf = perf_event_open(&attr, target.pid, target.cpu, group_fd, flags).map_err(|e| {
            let err = Error::from_os(event, e);
            if err.is_permission_denied() {
                match paranoid_level() {
                    Ok(level) => log::warn!("{} (perf_event_paranoid is {})", err, level),
                    Err(_) => log::warn!("{}", err),
                }
            }
            err
        })?;
        let id = syscall::id(&perf).map_err(|e| Error::io(Some(event), e))?;

        log::debug!("opened {} (fd {}, id {})", event, perf.as_raw_fd(), id);

        Ok(Self {
            event,
            state: State::Opened,
            perf: Some(perf),
            id,
            read_format: attr.read_format,
            read_buf: vec![0; Stat::read_buf_size(1, attr.read_format)],
            base: TimeBase::default(),
        })
    }

    /// The event this counter counts.
    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Kernel event id, unique among all open counters of the system.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn file(&self) -> Result<&File> {
        self.perf
            .as_ref()
            .ok_or_else(|| Error::invalid_state("use counter", State::Closed.as_str()))
    }

    fn expect_state(&self, op: &'static str, allowed: &[State]) -> Result<()> {
        match allowed.contains(&self.state) {
            true => Ok(()),
            false => Err(Error::invalid_state(op, self.state.as_str())),
        }
    }

    /// Starts counting from zero.
    pub fn enable(&mut self) -> Result<()> {
        self.expect_state("enable", &[State::Opened, State::Disabled])?;
        self.start_window();
        let file = self.file()?;
        syscall::reset(file, 0).map_err(|e| Error::io(Some(self.event), e))?;
        syscall::enable(file, 0).map_err(|e| Error::io(Some(self.event), e))?;
        self.state = State::Enabled;
        Ok(())
    }

    /// Stops counting, the count is kept.
    pub fn disable(&mut self) -> Result<()> {
        self.expect_state("disable", &[State::Enabled])?;
        let file = self.file()?;
        syscall::disable(file, 0).map_err(|e| Error::io(Some(self.event), e))?;
        self.state = State::Disabled;
        Ok(())
    }

    // Enables a disabled counter again without clearing its count.
    pub(crate) fn resume(&mut self) -> Result<()> {
        self.expect_state("resume", &[State::Disabled])?;
        let file = self.file()?;
        syscall::enable(file, 0).map_err(|e| Error::io(Some(self.event), e))?;
        self.state = State::Enabled;
        Ok(())
    }

    // Records the scheduling times the next window starts from. Must run before
    // the counter is enabled, the times don't move while it is disabled.
    pub(crate) fn start_window(&mut self) {
        if self.state != State::Disabled {
            // Never enabled, the times are still zero.
            self.base = TimeBase::default();
            return;
        }
        match self.read_raw() {
            Ok(stat) => self.base = TimeBase::of(&stat),
            Err(e) => log::debug!("keeping previous time base of {}: {}", self.event, e),
        }
    }

    /// Clears the count without changing the state.
    pub fn reset(&mut self) -> Result<()> {
        let file = self.file()?;
        syscall::reset(file, 0).map_err(|e| Error::io(Some(self.event), e))?;
        Ok(())
    }

    /// Returns the count since the last [`enable`][Self::enable].
    ///
    /// Reading does not clear the count.
    pub fn read(&mut self) -> Result<u64> {
        Ok(self.stat()?.count)
    }

    /// Returns the count with the scheduling times since the last [`enable`][Self::enable].
    pub fn stat(&mut self) -> Result<Stat> {
        let mut stat = self.read_raw()?;
        self.base.apply(&mut stat);
        Ok(stat)
    }

    fn read_raw(&mut self) -> Result<Stat> {
        let event = self.event;
        let file = self.perf.as_ref().ok_or_else(|| {
            Error::invalid_state("read counter", State::Closed.as_str())
        })?;

        // `CounterGroup::open` grows the leader buffer to fit all siblings.
        let len = syscall::read(file, &mut self.read_buf).map_err(|e| Error::io(Some(event), e))?;

        // A pinned event that lost its PMU slot is in error state and reads as EOF:
        // https://github.com/torvalds/linux/blob/v6.13/kernel/events/core.c#L5800
        if len == 0 {
            return Err(Error::exhausted(Some(event), "counter was evicted from the PMU"));
        }

        Stat::from_bytes(&self.read_buf[..len], self.read_format).ok_or_else(|| {
            let e = io::Error::new(ErrorKind::InvalidData, "short read from perf event");
            Error::io(Some(event), e)
        })
    }

    /// Releases the fd, a second call fails.
    pub fn close(&mut self) -> Result<()> {
        match self.perf.take() {
            Some(perf) => {
                log::debug!("closing {} (fd {})", self.event, perf.as_raw_fd());
                drop(perf);
                self.state = State::Closed;
                Ok(())
            }
            None => Err(Error::invalid_state("close counter", State::Closed.as_str())),
        }
    }
}

impl fmt::Debug for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Counter")
            .field("event", &self.event)
            .field("state", &self.state)
            .field("id", &self.id)
            .finish()
    }
}
