//!
//! Platform-uniform recurring timer. [`set_interval()`] returns an
//! [`IntervalHandle`] that stops the timer when cleared or dropped.
//! Backed by tokio intervals on native platforms and by `setInterval()`
//! in the WASM32 browser environment.
//!

cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        pub use crate::wasm::interval::{set_interval, IntervalHandle};
    } else {
        pub use crate::native::interval::{set_interval, IntervalHandle};
    }
}
