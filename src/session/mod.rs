//! Measurement sessions.
//!
//! A [`Measure`] drives one [`CounterGroup`] through measurement windows:
//!
//! ```text
//! new ──▶ Armed ──enable──▶ Running ──disable──▶ Stopped ──enable──▶ Running …
//!           │                  │                    │
//!           └──────────────────┴──── release ───────┴──▶ Released
//! ```
//!
//! [`measure`] wraps a single window around a closure.

mod oneshot;
#[cfg(test)]
mod test;

use std::borrow::Borrow;
use std::fmt;

pub use oneshot::*;

use crate::config::Opts;
use crate::count::group::{CounterGroup, GroupStat};
use crate::error::{Error, Result};
use crate::event::Event;

/// Lifecycle of a [`Measure`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Counters are open but have not counted yet.
    Armed,
    /// Counting.
    Running,
    /// Not counting, the counts of the last window are kept.
    Stopped,
    /// Counters are closed, terminal.
    Released,
}

impl State {
    fn as_str(&self) -> &'static str {
        match self {
            State::Armed => "armed",
            State::Running => "running",
            State::Stopped => "stopped",
            State::Released => "released",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A measurement session over a fixed list of events.
///
/// Every [`enable`][Self::enable] starts a new window with all counts at
/// zero; [`read`][Self::read] can be called any number of times in a window
/// and returns the counts accumulated since the window started, in the
/// order the events were given.
///
/// Counters are released by [`release`][Self::release] or when the session
/// is dropped. A session is meant to be driven by one thread; the mutating
/// methods take `&mut self`, so sharing one between threads needs external
/// synchronization, which would skew the measurement anyway.
///
/// # Examples
///
/// ```rust
/// use perf_measure::event::Hardware;
/// use perf_measure::Measure;
///
/// # if !perf_measure::is_supported() { return; }
/// let mut session = Measure::new([Hardware::Instructions]).unwrap();
///
/// session.enable().unwrap();
/// std::hint::black_box((0..1_000_000u64).map(std::hint::black_box).sum::<u64>());
/// let first = session.read().unwrap()[0];
/// std::hint::black_box((0..1_000_000u64).map(std::hint::black_box).sum::<u64>());
/// let second = session.read().unwrap()[0];
/// session.disable().unwrap();
///
/// // Reads within one window accumulate.
/// assert!(second > first);
/// ```
#[derive(Debug)]
pub struct Measure {
    group: CounterGroup,
    state: State,
}

impl Measure {
    /// Opens the counters with default [`Opts`].
    pub fn new<I>(events: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Event>,
    {
        Self::with_opts(events, Opts::default())
    }

    /// Opens the counters, failing fast if any of them cannot be opened.
    pub fn with_opts<I>(events: I, opts: impl Borrow<Opts>) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Event>,
    {
        let group = CounterGroup::open(events, opts)?;
        Ok(Self {
            group,
            state: State::Armed,
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.group.events()
    }

    pub fn len(&self) -> usize {
        self.group.len()
    }

    pub fn is_empty(&self) -> bool {
        self.group.is_empty()
    }

    fn expect_state(&self, op: &'static str, allowed: &[State]) -> Result<()> {
        match allowed.contains(&self.state) {
            true => Ok(()),
            false => Err(Error::invalid_state(op, self.state.as_str())),
        }
    }

    /// Starts a new window, all counts restart from zero.
    pub fn enable(&mut self) -> Result<()> {
        self.expect_state("enable", &[State::Armed, State::Stopped])?;
        self.group.enable_all()?;
        self.state = State::Running;
        Ok(())
    }

    /// Stops the current window, the counts are kept for [`read`][Self::read].
    pub fn disable(&mut self) -> Result<()> {
        self.expect_state("disable", &[State::Running])?;
        self.group.disable_all()?;
        self.state = State::Stopped;
        Ok(())
    }

    /// Returns the counts of the current (or last) window.
    pub fn read(&mut self) -> Result<Vec<u64>> {
        Ok(self.stat()?.counts)
    }

    /// Same as [`read`][Self::read], with the scheduling times of the group.
    pub fn stat(&mut self) -> Result<GroupStat> {
        self.expect_state("read", &[State::Running, State::Stopped])?;
        self.group.stat_all()
    }

    /// Closes the counters. A running session is disabled first.
    ///
    /// Releasing twice is a no-op.
    pub fn release(&mut self) -> Result<()> {
        if self.state == State::Released {
            return Ok(());
        }
        let disabled = match self.state {
            State::Running => self.group.disable_all(),
            _ => Ok(()),
        };
        // Close even if disabling failed, the fds must not outlive the session.
        self.group.close_all();
        self.state = State::Released;
        disabled
    }
}

impl Drop for Measure {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("failed to release measurement session: {}", e);
        }
    }
}
