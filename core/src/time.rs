//!
//! `time` module provides re-export of WASM32-compatible `Instant` and
//! helpers converting millisecond configuration values.
//!

/// re-export of [`instant`] crate supporting native and WASM implementations
pub use instant::{Duration, Instant};

/// Convert a [`Duration`] into whole milliseconds, saturating at `u64::MAX`
#[inline]
pub fn as_millis_u64(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Largest delay browsers honour; `setTimeout`/`setInterval` treat
/// anything above it as zero
pub const MAX_TIMER_DELAY_MS: u32 = i32::MAX as u32;

/// Convert a [`Duration`] into a browser timer delay, saturating at
/// [`MAX_TIMER_DELAY_MS`]
#[inline]
pub fn as_millis_u32(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis())
        .unwrap_or(u32::MAX)
        .min(MAX_TIMER_DELAY_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_delay_saturates_at_browser_limit() {
        assert_eq!(as_millis_u32(Duration::from_millis(100)), 100);
        assert_eq!(
            as_millis_u32(Duration::from_millis(u64::from(MAX_TIMER_DELAY_MS))),
            MAX_TIMER_DELAY_MS
        );
        assert_eq!(
            as_millis_u32(Duration::from_millis(u64::from(MAX_TIMER_DELAY_MS) + 1)),
            MAX_TIMER_DELAY_MS
        );
        assert_eq!(as_millis_u32(Duration::from_secs(30 * 24 * 3600)), MAX_TIMER_DELAY_MS);
        assert_eq!(as_millis_u64(Duration::MAX), u64::MAX);
    }
}
