//! The prelude module re-exports the most commonly used traits and types from the chartwait_core crate.
pub use crate::error::Error;
pub use crate::interval::{set_interval, IntervalHandle};
pub use crate::recovery::{
    schedule_recovery, ElementProbe, FnLoader, Loader, LoaderGroup, RecoveryConfig, RecoveryPlan,
    RecoveryReport, RefreshTarget,
};
pub use crate::result::Result;
pub use crate::task::{sleep, spawn};
pub use crate::time::{Duration, Instant};
pub use crate::waiter::{try_wait_until_ready, wait_until_ready, Options, SessionHandle, State};
pub use crate::MaybeSend;
pub use chartwait_log::{log_debug, log_error, log_info, log_trace, log_warn};
