#![allow(dead_code)]

use std::fs;
use std::hint::black_box;

/// Returns early from a test if this process can't open hardware counters.
macro_rules! ret_without_pmu {
    () => {
        common::init_logger();
        if !perf_measure::is_supported() {
            eprintln!("skipped: hardware counters are unavailable");
            return;
        }
    };
}
pub(crate) use ret_without_pmu;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Sums `0..n` one element at a time, so the instructions scale with `n`.
#[inline(never)]
pub fn sum(n: u64) -> u64 {
    (0..n).map(black_box).sum()
}

/// Reads `reads` pseudo-random elements of `buf`.
#[inline(never)]
pub fn scattered_reads(buf: &[u64], reads: usize) -> u64 {
    let mut x = 0x2545_f491_4f6c_dd1du64;
    let mut acc = 0u64;
    for _ in 0..reads {
        // xorshift64
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        let i = (x % buf.len() as u64) as usize;
        acc = acc.wrapping_add(black_box(buf[i]));
    }
    acc
}

/// Number of perf event fds this process holds.
pub fn open_perf_fds() -> usize {
    let Ok(entries) = fs::read_dir("/proc/self/fd") else {
        return 0;
    };
    entries
        .filter_map(|entry| fs::read_link(entry.ok()?.path()).ok())
        .filter(|link| link.to_string_lossy() == "anon_inode:[perf_event]")
        .count()
}
