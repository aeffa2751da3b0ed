#[derive(Clone, Copy, Debug)]
pub struct All;

#[derive(Clone, Copy, Debug)]
pub struct Cpu(pub u32);

impl Cpu {
    pub const ALL: All = All;
}

#[derive(Clone, Copy, Debug)]
pub struct Proc(pub u32);

impl Proc {
    pub const ALL: All = All;
    pub const CURRENT: Proc = Proc(0);
}

/// Where the counters count, built from a `(Proc, Cpu)` pair.
///
/// `(Proc::ALL, Cpu::ALL)` is rejected by the kernel, so there is no such conversion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub(crate) pid: i32,
    pub(crate) cpu: i32,
}

impl Default for Target {
    fn default() -> Self {
        (Proc::CURRENT, Cpu::ALL).into()
    }
}

macro_rules! into_target {
    ($ty: ty, $destruct: tt, $pid: expr, $cpu: expr) => {
        impl From<$ty> for Target {
            fn from($destruct: $ty) -> Self {
                Target {
                    pid: $pid as _,
                    cpu: $cpu as _,
                }
            }
        }
    };
}

into_target!((Proc, Cpu), (Proc(pid), Cpu(cpu)), pid, cpu);
into_target!((Cpu, Proc), (Cpu(cpu), Proc(pid)), pid, cpu);

into_target!((Proc, All), (Proc(pid), _), pid, -1);
into_target!((All, Proc), (_, Proc(pid)), pid, -1);

into_target!((Cpu, All), (Cpu(cpu), _), -1, cpu);
into_target!((All, Cpu), (_, Cpu(cpu)), -1, cpu);
