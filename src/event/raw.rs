use super::{Event, EventConfig};
use crate::error::{Error, Result};
use crate::ffi::bindings as b;

// Bits of `perf_event_attr::config` the core PMU driver honours for raw events,
// anything else is masked off silently by the kernel:
// https://github.com/torvalds/linux/blob/v6.13/arch/x86/include/asm/perf_event.h#L109
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
const RAW_CODE_MASK: Option<u64> = Some(0x0F_FF84_FFFF);
// https://github.com/torvalds/linux/blob/v6.13/include/linux/perf/arm_pmuv3.h#L225
#[cfg(target_arch = "aarch64")]
const RAW_CODE_MASK: Option<u64> = Some(0xFFFF);
#[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
const RAW_CODE_MASK: Option<u64> = None;

/// A "raw" implementation-specific event.
///
/// The code is passed to the core PMU as is, so its meaning depends on the
/// CPU model. For example, `0x01c2` is "uops retired" on many Intel cores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Raw(u64);

impl Raw {
    pub const fn new(code: u64) -> Self {
        Self(code)
    }

    /// The event-select code.
    pub const fn code(&self) -> u64 {
        self.0
    }

    pub(super) fn config(&self) -> Result<EventConfig> {
        if let Some(mask) = RAW_CODE_MASK {
            if self.0 & !mask != 0 {
                let reason = format!("raw code has bits outside {:#x}", mask);
                return Err(Error::unsupported(Event::Raw(*self), reason));
            }
        }

        Ok(EventConfig {
            ty: b::PERF_TYPE_RAW as _,
            config: self.0,
        })
    }
}

super::into_event!(Raw);
