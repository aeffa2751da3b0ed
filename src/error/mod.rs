//! Error taxonomy of counter operations.


use std::io;

use thiserror::Error;

use crate::event::Event;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by counters, groups, and sessions.
///
/// Every OS failure keeps the originating [`io::Error`] as its source, and
/// names the event that triggered it whenever there is one.
#[derive(Debug, Error)]
pub enum Error {
    /// The event is not countable on this CPU or kernel.
    #[error("unsupported event {event}: {source}")]
    UnsupportedEvent {
        event: Event,
        #[source]
        source: io::Error,
    },

    /// No counter resources left, either file descriptors or PMU counters.
    #[error("counter resources exhausted{}: {source}", for_event(.event))]
    ResourceExhausted {
        event: Option<Event>,
        #[source]
        source: io::Error,
    },

    /// Not privileged to use performance monitoring, see `perf_event_paranoid`.
    #[error("permission denied to count {event}: {source}")]
    PermissionDenied {
        event: Event,
        #[source]
        source: io::Error,
    },

    /// The operation is not allowed in the current lifecycle state.
    #[error("cannot {op} while {state}")]
    InvalidState {
        op: &'static str,
        state: &'static str,
    },

    /// Any other OS failure.
    #[error("counter I/O failed{}: {source}", for_event(.event))]
    Io {
        event: Option<Event>,
        #[source]
        source: io::Error,
    },
}

fn for_event(event: &Option<Event>) -> String {
    match event {
        Some(event) => format!(" for {}", event),
        None => String::new(),
    }
}

impl Error {
    /// Classifies an OS error returned while opening or operating a counter for `event`.
    pub fn from_os(event: Event, source: io::Error) -> Self {
        let Some(errno) = source.raw_os_error() else {
            return Self::Io {
                event: Some(event),
                source,
            };
        };

        match errno {
            libc::EACCES | libc::EPERM => Self::PermissionDenied { event, source },
            libc::EMFILE | libc::ENFILE | libc::ENOSPC | libc::EBUSY => Self::ResourceExhausted {
                event: Some(event),
                source,
            },
            libc::ENOENT
            | libc::EOPNOTSUPP
            | libc::ENODEV
            | libc::EINVAL
            | libc::ENOSYS
            | libc::E2BIG => Self::UnsupportedEvent { event, source },
            _ => Self::Io {
                event: Some(event),
                source,
            },
        }
    }

    pub(crate) fn unsupported(event: Event, reason: String) -> Self {
        Self::UnsupportedEvent {
            event,
            source: io::Error::new(io::ErrorKind::Unsupported, reason),
        }
    }

    pub(crate) fn exhausted(event: Option<Event>, reason: &'static str) -> Self {
        Self::ResourceExhausted {
            event,
            source: io::Error::other(reason),
        }
    }

    pub(crate) fn io(event: Option<Event>, source: io::Error) -> Self {
        Self::Io { event, source }
    }

    pub(crate) fn invalid_state(op: &'static str, state: &'static str) -> Self {
        Self::InvalidState { op, state }
    }

    /// The event that triggered the error, if any.
    pub fn event(&self) -> Option<&Event> {
        match self {
            Self::UnsupportedEvent { event, .. } | Self::PermissionDenied { event, .. } => {
                Some(event)
            }
            Self::ResourceExhausted { event, .. } | Self::Io { event, .. } => event.as_ref(),
            Self::InvalidState { .. } => None,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedEvent { .. })
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::ResourceExhausted { .. })
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }
}
