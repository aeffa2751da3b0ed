use super::Opts;
use crate::event::EventConfig;
use crate::ffi::{bindings as b, Attr};

pub(crate) const SIBLING_READ_FORMAT: u64 = (b::PERF_FORMAT_ID
    | b::PERF_FORMAT_TOTAL_TIME_ENABLED
    | b::PERF_FORMAT_TOTAL_TIME_RUNNING) as u64;

pub(crate) const LEADER_READ_FORMAT: u64 = SIBLING_READ_FORMAT | b::PERF_FORMAT_GROUP as u64;

pub(crate) fn from(event_cfg: EventConfig, opts: &Opts, leader: bool) -> Attr {
    let mut attr = Attr {
        size: size_of::<Attr>() as _,
        ..Default::default()
    };

    // event config:

    attr.type_ = event_cfg.ty;
    attr.config = event_cfg.config;

    // count config:

    macro_rules! when {
        ($bool:ident, $then:tt) => {
            if opts.exclude.$bool {
                attr.$then(1);
            }
        };
    }
    when!(user, set_exclude_user);
    when!(kernel, set_exclude_kernel);
    when!(hv, set_exclude_hv);

    // Every counter starts disabled, the group is enabled as a unit later.
    attr.set_disabled(1);

    // Only a group leader can be pinned:
    // https://github.com/torvalds/linux/blob/v6.13/kernel/events/core.c#L12982
    if leader {
        attr.set_pinned(opts.pin_on_pmu as _);
        attr.read_format = LEADER_READ_FORMAT;
    } else {
        attr.read_format = SIBLING_READ_FORMAT;
    }

    attr
}
