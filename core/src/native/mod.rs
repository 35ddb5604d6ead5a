//! native (tokio-backed) timer implementations
#[cfg(not(target_arch = "wasm32"))]
pub mod interval;
