use crate::error::Error;
use crate::result::Result;
use crate::time::{as_millis_u64, Duration};
use crate::MaybeSend;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        pub(crate) type TimeoutFn = Arc<dyn Fn()>;
    } else {
        pub(crate) type TimeoutFn = Arc<dyn Fn() + Send + Sync>;
    }
}

///
/// Polling configuration. Deserializes from `{ "pollIntervalMs": .., "timeoutMs": .. }`
/// with missing fields taking their defaults (100 ms and 5000 ms).
///
/// ```rust ignore
/// let options = Options::default()
///     .with_poll_interval(Duration::from_millis(50))
///     .with_timeout(Duration::from_secs(2))
///     .with_on_timeout(|| log_warn!("library never showed up"));
/// ```
///
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    pub poll_interval_ms: u64,
    pub timeout_ms: u64,
    #[serde(skip)]
    pub(crate) on_timeout: Option<TimeoutFn>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            on_timeout: None,
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("timeout_ms", &self.timeout_ms)
            .field("on_timeout", &self.on_timeout.is_some())
            .finish()
    }
}

impl Options {
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self::default()
            .with_poll_interval(poll_interval)
            .with_timeout(timeout)
    }

    /// Parse options from a JSON object
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval_ms = as_millis_u64(poll_interval);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = as_millis_u64(timeout);
        self
    }

    /// Callback invoked once if the session times out
    pub fn with_on_timeout<F>(mut self, on_timeout: F) -> Self
    where
        F: Fn() + MaybeSend + 'static,
    {
        self.on_timeout = Some(Arc::new(on_timeout));
        self
    }

    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Reject a zero poll interval and a timeout shorter than one interval
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::invalid_configuration(
                "pollIntervalMs must be greater than 0",
            ));
        }
        if self.timeout_ms < self.poll_interval_ms {
            return Err(Error::invalid_configuration(format!(
                "timeoutMs ({}) must not be less than pollIntervalMs ({})",
                self.timeout_ms, self.poll_interval_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = Options::default();
        assert_eq!(options.poll_interval(), Duration::from_millis(100));
        assert_eq!(options.timeout(), Duration::from_millis(5000));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let options = Options::from_json(r#"{ "pollIntervalMs": 250 }"#).unwrap();
        assert_eq!(options.poll_interval_ms, 250);
        assert_eq!(options.timeout_ms, DEFAULT_TIMEOUT_MS);

        let options = Options::from_json("{}").unwrap();
        assert_eq!(options.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);

        assert!(matches!(
            Options::from_json(r#"{ "timeoutMs": "soon" }"#),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn validation() {
        let zero = Options::default().with_poll_interval(Duration::ZERO);
        assert!(matches!(
            zero.validate(),
            Err(Error::InvalidConfiguration(_))
        ));

        let short = Options::new(Duration::from_millis(100), Duration::from_millis(99));
        assert!(matches!(
            short.validate(),
            Err(Error::InvalidConfiguration(_))
        ));

        let equal = Options::new(Duration::from_millis(100), Duration::from_millis(100));
        assert!(equal.validate().is_ok());
    }
}
