use super::{Event, EventConfig};
use crate::error::{Error, Result};
use crate::ffi::bindings as b;

/// Cache to monitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CacheId {
    /// Level 1 data cache.
    L1d,
    /// Level 1 instruction cache.
    L1i,
    /// Last level cache.
    Ll,
    /// Data TLB.
    Dtlb,
    /// Instruction TLB.
    Itlb,
    /// Branch prediction unit.
    Bpu,
    /// Local memory accesses (NUMA node).
    Node,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CacheOp {
    Read,
    Write,
    Prefetch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CacheResult {
    Access,
    Miss,
}

/// Cache event, e.g. last level cache read misses:
///
/// ```rust
/// use perf_measure::event::{Cache, CacheId, CacheOp, CacheResult};
///
/// let ll_read_miss = Cache::new(CacheId::Ll, CacheOp::Read, CacheResult::Miss);
/// ```
///
/// Some combinations do not exist on any CPU (nothing writes to the
/// instruction cache or the branch predictor); those are rejected when a
/// counter is opened. Whether the remaining combinations are countable
/// depends on the CPU and is decided by the kernel at open time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cache {
    pub id: CacheId,
    pub op: CacheOp,
    pub result: CacheResult,
}

impl Cache {
    pub const fn new(id: CacheId, op: CacheOp, result: CacheResult) -> Self {
        Self { id, op, result }
    }

    /// Returns `false` for combinations no CPU can count.
    pub const fn is_valid(&self) -> bool {
        !matches!(
            (self.id, self.op),
            (CacheId::L1i, CacheOp::Write)
                | (CacheId::Itlb, CacheOp::Write)
                | (CacheId::Itlb, CacheOp::Prefetch)
                | (CacheId::Bpu, CacheOp::Write)
                | (CacheId::Bpu, CacheOp::Prefetch)
        )
    }

    pub(super) fn config(&self) -> Result<EventConfig> {
        if !self.is_valid() {
            let reason = format!("{:?} caches have no {:?} operation", self.id, self.op);
            return Err(Error::unsupported(Event::Cache(*self), reason));
        }

        let id = match self.id {
            CacheId::L1d => b::PERF_COUNT_HW_CACHE_L1D,
            CacheId::L1i => b::PERF_COUNT_HW_CACHE_L1I,
            CacheId::Ll => b::PERF_COUNT_HW_CACHE_LL,
            CacheId::Dtlb => b::PERF_COUNT_HW_CACHE_DTLB,
            CacheId::Itlb => b::PERF_COUNT_HW_CACHE_ITLB,
            CacheId::Bpu => b::PERF_COUNT_HW_CACHE_BPU,
            CacheId::Node => b::PERF_COUNT_HW_CACHE_NODE,
        } as u64;
        let op = match self.op {
            CacheOp::Read => b::PERF_COUNT_HW_CACHE_OP_READ,
            CacheOp::Write => b::PERF_COUNT_HW_CACHE_OP_WRITE,
            CacheOp::Prefetch => b::PERF_COUNT_HW_CACHE_OP_PREFETCH,
        } as u64;
        let result = match self.result {
            CacheResult::Access => b::PERF_COUNT_HW_CACHE_RESULT_ACCESS,
            CacheResult::Miss => b::PERF_COUNT_HW_CACHE_RESULT_MISS,
        } as u64;

        Ok(EventConfig {
            ty: b::PERF_TYPE_HW_CACHE as _,
            config: id | (op << 8) | (result << 16),
        })
    }
}

super::into_event!(Cache);
