//! Event descriptors.
//!
//! An [`Event`] names one countable hardware event. It is a plain value:
//! nothing is checked against the running CPU until a counter is opened
//! with it, except for the combinations that are invalid everywhere
//! (see [`Cache`] and [`Raw`]).


mod cache;
mod hw;
mod raw;

use std::fmt;

pub use cache::*;
pub use hw::*;
pub use raw::*;

use crate::error::Result;

/// One countable hardware event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Event {
    /// Generic hardware event.
    Hardware(Hardware),
    /// Cache hierarchy event.
    Cache(Cache),
    /// Model-specific raw event code.
    Raw(Raw),
}

/// Kernel encoding of an event, i.e. `perf_event_attr::{type, config}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct EventConfig {
    pub ty: u32,
    pub config: u64,
}

impl Event {
    /// Translates the descriptor into the kernel encoding.
    pub(crate) fn config(&self) -> Result<EventConfig> {
        match self {
            Event::Hardware(hw) => Ok(hw.config()),
            Event::Cache(cache) => cache.config(),
            Event::Raw(raw) => raw.config(),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Hardware(hw) => write!(f, "Hardware({:?})", hw),
            Event::Cache(Cache { id, op, result }) => {
                write!(f, "Cache({:?}, {:?}, {:?})", id, op, result)
            }
            Event::Raw(raw) => write!(f, "Raw({:#x})", raw.code()),
        }
    }
}

macro_rules! into_event {
    ($ty:ident) => {
        impl From<$ty> for crate::event::Event {
            fn from(value: $ty) -> Self {
                Self::$ty(value)
            }
        }

        impl From<&$ty> for crate::event::Event {
            fn from(value: &$ty) -> Self {
                Self::$ty(*value)
            }
        }
    };
}
use into_event;

impl From<&Event> for Event {
    fn from(value: &Event) -> Self {
        *value
    }
}
