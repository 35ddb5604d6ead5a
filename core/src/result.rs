//! Result type used by the [`chartwait_core`](super) crate
pub type Result<T> = std::result::Result<T, crate::error::Error>;
