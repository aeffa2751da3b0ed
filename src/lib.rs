//! Scoped hardware performance counter measurements on top of `perf_event_open`.
//!
//! ## Example
//!
//! Count retired instructions and last level cache read misses of a
//! closure, on the current process and any CPU.
//!
//! ```rust
//! use perf_measure::event::{Cache, CacheId, CacheOp, CacheResult, Event, Hardware};
//!
//! # if !perf_measure::is_supported() { return; }
//! let events: [Event; 2] = [
//!     Hardware::Instructions.into(),
//!     Cache::new(CacheId::Ll, CacheOp::Read, CacheResult::Miss).into(),
//! ];
//!
//! fn fib(n: usize) -> usize {
//!     match n {
//!         0 => 0,
//!         1 => 1,
//!         n => fib(n - 1) + fib(n - 2),
//!     }
//! }
//!
//! match perf_measure::measure(events, || fib(std::hint::black_box(25))) {
//!     Ok((_, counts)) => println!("{} instructions, {} LL misses", counts[0], counts[1]),
//!     // Not every CPU can count LL misses.
//!     Err(e) => println!("{}", e),
//! }
//! ```
//!
//! For several measurement windows over the same counters, use a
//! [`Measure`] session.
//!
//! ## Requirements
//!
//! Any Linux kernel since 4.0. Unprivileged processes need
//! `perf_event_paranoid <= 2` to count user space (the default
//! [`Opts`][config::Opts] exclude kernel space), see [`paranoid_level`].

#[cfg(not(any(target_os = "linux", target_os = "android")))]
compile_error!("`perf_event_open` syscall can only be used in linux or android target");

pub mod config;
pub mod count;
pub mod error;
pub mod event;
mod ffi;
pub mod session;
mod support;

pub use error::{Error, Result};
pub use session::{measure, measure_with, try_measure, try_measure_with, Measure};
pub use support::{is_supported, paranoid_level};
