use crate::ffi::{bindings as b, deref_offset};

/// Counter statistics as returned by `read(2)` on a perf event fd.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stat {
    pub count: u64,
    pub id: Option<u64>,
    pub time_enabled: Option<u64>,
    pub time_running: Option<u64>,
    /// Counts of the other group members, only filled when reading a group leader.
    pub siblings: Vec<SiblingStat>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SiblingStat {
    pub count: u64,
    pub id: Option<u64>,
}

impl Stat {
    // https://github.com/torvalds/linux/blob/v6.13/include/uapi/linux/perf_event.h#L344
    // struct read_format {
    //     {
    //         u64 value;
    //         { u64 time_enabled; } && PERF_FORMAT_TOTAL_TIME_ENABLED
    //         { u64 time_running; } && PERF_FORMAT_TOTAL_TIME_RUNNING
    //         { u64 id;           } && PERF_FORMAT_ID
    //     } && !PERF_FORMAT_GROUP
    //     {
    //         u64 nr;
    //         { u64 time_enabled; } && PERF_FORMAT_TOTAL_TIME_ENABLED
    //         { u64 time_running; } && PERF_FORMAT_TOTAL_TIME_RUNNING
    //         {
    //             u64 value;
    //             { u64 id;   } && PERF_FORMAT_ID
    //         } cntr[nr];
    //     } && PERF_FORMAT_GROUP
    // };
    //
    // Safety: `ptr` must point to a buffer filled by `read(2)` with `read_format`,
    // at least `Stat::read_buf_size(nr, read_format)` bytes long.
    pub(crate) unsafe fn from_ptr(mut ptr: *const u8, read_format: u64) -> Self {
        let ptr = &mut ptr;

        macro_rules! when {
            ($flag:ident) => {
                (read_format & (b::$flag as u64) > 0).then(|| deref_offset::<u64>(ptr))
            };
        }

        if read_format & b::PERF_FORMAT_GROUP as u64 == 0 {
            let count = deref_offset(ptr);
            let time_enabled = when!(PERF_FORMAT_TOTAL_TIME_ENABLED);
            let time_running = when!(PERF_FORMAT_TOTAL_TIME_RUNNING);
            let id = when!(PERF_FORMAT_ID);

            Self {
                count,
                id,
                time_enabled,
                time_running,
                siblings: vec![],
            }
        } else {
            let nr: u64 = deref_offset(ptr);
            let time_enabled = when!(PERF_FORMAT_TOTAL_TIME_ENABLED);
            let time_running = when!(PERF_FORMAT_TOTAL_TIME_RUNNING);

            let count = deref_offset(ptr);
            let id = when!(PERF_FORMAT_ID);

            let siblings = (1..nr)
                .map(|_| {
                    let count = deref_offset(ptr);
                    let id = when!(PERF_FORMAT_ID);
                    SiblingStat { count, id }
                })
                .collect();

            Self {
                count,
                id,
                time_enabled,
                time_running,
                siblings,
            }
        }
    }

    /// Parses a buffer filled by `read(2)`, `None` if it is too short for its own header.
    pub(crate) fn from_bytes(buf: &[u8], read_format: u64) -> Option<Self> {
        let group = read_format & b::PERF_FORMAT_GROUP as u64 > 0;
        let nr = match group {
            true => {
                let nr = buf.get(..size_of::<u64>())?;
                u64::from_ne_bytes(nr.try_into().ok()?) as usize
            }
            false => 1,
        };
        if nr == 0 || buf.len() < Self::read_buf_size(nr, read_format) {
            return None;
        }
        // The length has been checked against the layout above.
        Some(unsafe { Self::from_ptr(buf.as_ptr(), read_format) })
    }

    pub(crate) fn read_buf_size(group_size: usize, read_format: u64) -> usize {
        let mut size = size_of::<u64>();

        macro_rules! when {
            ($flag:ident, $size:expr) => {
                if read_format & b::$flag as u64 > 0 {
                    size += $size;
                }
            };
        }

        when!(PERF_FORMAT_TOTAL_TIME_ENABLED, size_of::<u64>());
        when!(PERF_FORMAT_TOTAL_TIME_RUNNING, size_of::<u64>());
        when!(PERF_FORMAT_GROUP, group_size * size_of::<u64>());
        when!(PERF_FORMAT_ID, group_size * size_of::<u64>());

        size
    }
}

/// Scheduling times of a counter when its current window was opened.
///
/// `PERF_EVENT_IOC_RESET` only clears the count, the kernel keeps adding up
/// `time_enabled` and `time_running` from the moment the fd was opened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct TimeBase {
    pub(crate) enabled: u64,
    pub(crate) running: u64,
}

impl TimeBase {
    pub(crate) fn of(stat: &Stat) -> Self {
        Self {
            enabled: stat.time_enabled.unwrap_or(0),
            running: stat.time_running.unwrap_or(0),
        }
    }

    /// Turns the since-open times of `stat` into times of the current window.
    pub(crate) fn apply(&self, stat: &mut Stat) {
        stat.time_enabled = stat.time_enabled.map(|t| t.saturating_sub(self.enabled));
        stat.time_running = stat.time_running.map(|t| t.saturating_sub(self.running));
    }
}
