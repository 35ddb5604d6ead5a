//!
//! [`task`](self) module provides helper functions that *operate uniformly*
//! in native ([`tokio`](https://crates.io/crates/tokio)-backed) and WASM
//! ([`wasm_bindgen_futures`]-backed) environments (i.e. a web browser).
//!
//! Following functions are available:
//! - [`spawn()`] - non-blocking spawn of the supplied future
//! - [`sleep()`] - suspends the task for a given Duration
//! - [`ensure_runtime()`] - checks that [`spawn()`] can be called
//!

use crate::result::Result;
use cfg_if::cfg_if;
use std::future::Future;

cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        pub use crate::wasm::sleep::sleep;

        /// Spawn the future on the browser microtask queue.
        /// No `Send` requirement in the single-threaded browser environment.
        pub fn spawn<F>(future: F)
        where
            F: Future<Output = ()> + 'static,
        {
            wasm_bindgen_futures::spawn_local(future);
        }

        /// The browser event loop is always available.
        pub fn ensure_runtime() -> Result<()> {
            Ok(())
        }
    } else {
        pub use tokio::time::sleep;

        /// Spawn the future on the current tokio runtime.
        pub fn spawn<F>(future: F)
        where
            F: Future<Output = ()> + Send + 'static,
        {
            tokio::task::spawn(future);
        }

        /// Fails with [`Error::Timer`](crate::error::Error::Timer) outside
        /// of a tokio runtime, where [`spawn()`] would panic.
        pub fn ensure_runtime() -> Result<()> {
            tokio::runtime::Handle::try_current()
                .map(|_| ())
                .map_err(|err| crate::error::Error::Timer(format!("no tokio runtime available: {err}")))
        }
    }
}
