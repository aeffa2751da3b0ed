use super::EventConfig;
use crate::ffi::bindings as b;

/// Generic hardware events.
///
/// The kernel maps these to the model-specific event of the running CPU.
/// Not every CPU implements every generic event, e.g. stalled cycles are
/// missing on most recent Intel cores; opening one of those fails with
/// [`UnsupportedEvent`][crate::error::Error::UnsupportedEvent].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Hardware {
    CpuCycles,
    Instructions,
    CacheReferences,
    CacheMisses,
    BranchInstructions,
    BranchMisses,
    BusCycles,
    StalledCyclesFrontend,
    StalledCyclesBackend,
    RefCpuCycles,
}

impl Hardware {
    pub(super) fn config(&self) -> EventConfig {
        let config = match self {
            Hardware::CpuCycles => b::PERF_COUNT_HW_CPU_CYCLES,
            Hardware::Instructions => b::PERF_COUNT_HW_INSTRUCTIONS,
            Hardware::CacheReferences => b::PERF_COUNT_HW_CACHE_REFERENCES,
            Hardware::CacheMisses => b::PERF_COUNT_HW_CACHE_MISSES,
            Hardware::BranchInstructions => b::PERF_COUNT_HW_BRANCH_INSTRUCTIONS,
            Hardware::BranchMisses => b::PERF_COUNT_HW_BRANCH_MISSES,
            Hardware::BusCycles => b::PERF_COUNT_HW_BUS_CYCLES,
            Hardware::StalledCyclesFrontend => b::PERF_COUNT_HW_STALLED_CYCLES_FRONTEND,
            Hardware::StalledCyclesBackend => b::PERF_COUNT_HW_STALLED_CYCLES_BACKEND,
            Hardware::RefCpuCycles => b::PERF_COUNT_HW_REF_CPU_CYCLES,
        };

        EventConfig {
            ty: b::PERF_TYPE_HARDWARE as _,
            config: config as _,
        }
    }
}

super::into_event!(Hardware);
