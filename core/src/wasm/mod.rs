//! WASM32 (browser timer-backed) implementations
#[cfg(target_arch = "wasm32")]
pub mod interval;
#[cfg(target_arch = "wasm32")]
pub mod sleep;
