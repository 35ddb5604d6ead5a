//!
//! Recurring timer backed by the tokio `Interval`.
//!

use crate::error::Error;
use crate::result::Result;
use crate::time::Duration;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

struct Inner {
    period: Duration,
    cleared: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn clear(&self) {
        self.cleared.store(true, Ordering::SeqCst);
        let task = match self.task.lock() {
            Ok(mut task) => task.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(task) = task {
            task.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.clear();
    }
}

///
/// Handle to a recurring timer created by [`set_interval`]. Clones share
/// the same timer; the timer is cleared by [`IntervalHandle::clear`] or
/// when the last clone is dropped.
///
#[derive(Clone)]
pub struct IntervalHandle {
    inner: Arc<Inner>,
}

impl IntervalHandle {
    /// Interval period
    pub fn period(&self) -> Duration {
        self.inner.period
    }

    /// Stop the timer. No tick starts after this returns;
    /// clearing an already cleared timer is a no-op.
    pub fn clear(&self) {
        self.inner.clear();
    }

    pub fn is_cleared(&self) -> bool {
        self.inner.cleared.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for IntervalHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntervalHandle")
            .field("period", &self.inner.period)
            .field("cleared", &self.is_cleared())
            .finish()
    }
}

/// Start a recurring timer invoking `tick` every `period`, first one
/// `period` after creation. Ticks run inline in the timer task, so a
/// tick never starts before the previous one returned.
///
/// Requires a running tokio runtime.
pub fn set_interval<F>(period: Duration, mut tick: F) -> Result<IntervalHandle>
where
    F: FnMut() + Send + 'static,
{
    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|err| Error::Timer(format!("no tokio runtime available: {err}")))?;

    let cleared = Arc::new(AtomicBool::new(false));
    let cleared_ = cleared.clone();
    let start = Instant::now() + period;
    let task = runtime.spawn(async move {
        let mut interval = interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if cleared_.load(Ordering::SeqCst) {
                break;
            }
            tick();
        }
    });

    let inner = Arc::new(Inner {
        period,
        cleared,
        task: Mutex::new(None),
    });

    match inner.task.lock() {
        Ok(mut slot) => *slot = Some(task),
        Err(poisoned) => *poisoned.into_inner() = Some(task),
    }

    Ok(IntervalHandle { inner })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period_until_cleared() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_ = count.clone();
        let handle = set_interval(Duration::from_millis(100), move || {
            count_.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        handle.clear();
        handle.clear();
        assert!(handle.is_cleared());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_last_handle_clears_timer() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_ = count.clone();
        let handle = set_interval(Duration::from_millis(10), move || {
            count_.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        let clone = handle.clone();
        drop(handle);

        tokio::time::sleep(Duration::from_millis(25)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        drop(clone);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn requires_runtime() {
        let result = set_interval(Duration::from_millis(10), || {});
        assert!(matches!(result, Err(Error::Timer(_))));
    }
}
