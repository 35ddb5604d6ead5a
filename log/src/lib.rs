//!
//! [`chartwait_log`] provides the log macros used across the `chartwait` crates.
//!
//! When the application is built for a native target, macros such as
//! `log_info!()` print to stdout (errors and warnings go to stderr).
//! When built for `wasm32`, they invoke `console.log()`, `console.warn()`
//! and `console.error()` in the hosting browser page.
//!
//! The following macros are available:
//! - `log_trace!()`
//! - `log_debug!()`
//! - `log_info!()`
//! - `log_warn!()`
//! - `log_error!()`
//!
//! Each macro accepts an optional `target: "..."` prefix naming the
//! subsystem that emitted the message (for example `target: "waiter"`).
//!
//! # Redirecting log output
//!
//! A log sink can be installed using [`pipe`] by supplying an `Arc` of a
//! type implementing [`Sink`]. [`Sink::write`] returns `true` when the
//! message was consumed and should not reach the console, or `false` to
//! let the console output proceed.
//!
//! ```rust ignore
//! use chartwait_log::*;
//!
//! struct Collector;
//! impl Sink for Collector {
//!     fn write(&self, _target: Option<&str>, _level: Level, args: &std::fmt::Arguments<'_>) -> bool {
//!         // forward somewhere else, suppress console output
//!         true
//!     }
//! }
//!
//! chartwait_log::pipe(Some(Arc::new(Collector)));
//! ```

extern crate self as chartwait_log;

mod log;
pub use self::log::*;

pub mod prelude {
    pub use super::log::*;
    pub use super::{log_debug, log_error, log_info, log_trace, log_warn};
}
