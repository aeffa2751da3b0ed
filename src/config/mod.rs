pub(crate) mod attr;
mod target;

pub use target::*;

/// Counter options.
///
/// The defaults count the current process on any CPU, in user space only,
/// with the group pinned to the PMU:
///
/// ```rust
/// use perf_measure::config::{Cpu, Opts, Proc};
///
/// let mut opts = Opts::default();
/// opts.exclude.kernel = false; // Also count kernel space, needs `perf_event_paranoid <= 1`.
/// opts.target = (Proc::CURRENT, Cpu(0)).into();
/// ```
#[derive(Clone, Debug)]
pub struct Opts {
    /// Exclude events with privilege levels.
    ///
    /// For example, if we set [`Priv::user`] to `true` here,
    /// events that happen in user space will not be counted.
    pub exclude: Priv,

    /// Pin the group leader on the PMU.
    ///
    /// A pinned group is never multiplexed with other groups: if the PMU
    /// cannot hold it, reading it fails with
    /// [`ResourceExhausted`][crate::error::Error::ResourceExhausted].
    /// Without pinning, the kernel may time-share the PMU and the counts
    /// only cover [`GroupStat::time_running`][crate::count::group::GroupStat::time_running].
    pub pin_on_pmu: bool,

    /// Process and CPU to count on.
    pub target: Target,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            exclude: Priv {
                user: false,
                kernel: true,
                hv: true,
            },
            pin_on_pmu: true,
            target: Target::default(),
        }
    }
}

/// Privilege levels.
#[derive(Clone, Debug, Default)]
pub struct Priv {
    /// User space.
    pub user: bool,

    /// Kernel space.
    pub kernel: bool,

    /// Hypervisor.
    pub hv: bool,
}
