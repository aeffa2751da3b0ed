use std::fs;
use std::io::{self, ErrorKind};
use std::sync::LazyLock;

use crate::config::Opts;
use crate::count::Counter;
use crate::event::Hardware;

const PARANOID_PATH: &str = "/proc/sys/kernel/perf_event_paranoid";

static SUPPORTED: LazyLock<bool> = LazyLock::new(|| {
    // Retired instructions is the one generic event every PMU driver implements,
    // failing to open it means there is no usable PMU for us.
    match Counter::open(Hardware::Instructions, Opts::default()) {
        Ok(_) => true,
        Err(e) => {
            log::info!("hardware counters unavailable: {}", e);
            false
        }
    }
});

/// Returns `true` if hardware counters can be opened by this process.
///
/// The probe runs once. It fails in containers where `perf_event_open` is
/// filtered, in VMs without PMU passthrough, and when `perf_event_paranoid`
/// forbids user space counting.
pub fn is_supported() -> bool {
    *SUPPORTED
}

/// Reads `/proc/sys/kernel/perf_event_paranoid`.
///
/// * `-1`: no restrictions.
/// * `0`: no raw tracepoint access for unprivileged users.
/// * `1`: no CPU-wide counters for unprivileged users.
/// * `2`: user space counting only for unprivileged users (default).
/// * `>= 3`: no counters at all for unprivileged users (some distributions).
pub fn paranoid_level() -> io::Result<i32> {
    let level = fs::read_to_string(PARANOID_PATH)?;
    level
        .trim()
        .parse()
        .map_err(|e| io::Error::new(ErrorKind::InvalidData, e))
}
