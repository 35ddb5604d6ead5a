//!
//! [`chartwait_core`] waits for a page dependency (typically a charting
//! library global) to become available and then runs a recovery step
//! exactly once. It functions uniformly in native Rust (tokio-backed)
//! and WASM-browser (`setInterval`-backed) environments.
//!
//! This crate provides:
//! - [`waiter`]: the readiness polling state machine with cancellable sessions
//! - [`recovery`]: the post-readiness step that runs data loaders gated on
//!   canvas presence and refreshes explicitly supplied chart instances
//! - [`interval`] and [`task`]: platform-uniform recurring timers, spawn and sleep
//! - [`time`]: WASM32-compatible `Instant` and `Duration`
//!
//! ```rust ignore
//! use chartwait_core::prelude::*;
//!
//! let session = wait_until_ready(
//!     || library_is_loaded(),
//!     || log_info!("library is available"),
//!     Options::default(),
//! )?;
//! // ... elsewhere
//! session.cancel();
//! ```

extern crate self as chartwait_core;

pub mod error;
pub mod interval;
pub mod prelude;
pub mod recovery;
pub mod result;
pub mod task;
pub mod time;
pub mod waiter;

mod native;
mod wasm;

cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        /// Marker for values handed to sessions and timers. Browser builds
        /// run on a single thread and impose no `Send` requirement.
        pub trait MaybeSend {}
        impl<T> MaybeSend for T {}
    } else {
        /// Marker for values handed to sessions and timers. Native builds
        /// drive sessions from a tokio runtime and require `Send + Sync`.
        pub trait MaybeSend: Send + Sync {}
        impl<T> MaybeSend for T where T: Send + Sync {}
    }
}
