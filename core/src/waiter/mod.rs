//!
//! Readiness polling. [`wait_until_ready()`] evaluates a predicate on a
//! fixed interval and runs a callback exactly once when the predicate
//! first holds, or never if the timeout elapses first.
//!
//! Each call creates an independent session driven by one recurring
//! timer. The timer is released whenever the session leaves the
//! [`State::Waiting`] state, whether it fired, timed out, was cancelled
//! through its [`SessionHandle`] or was terminated by a failing predicate.
//!
//! ```rust ignore
//! let session = wait_until_ready(
//!     move || library.is_loaded(),
//!     move || refresh_charts(),
//!     Options::default().with_timeout(Duration::from_secs(5)),
//! )?;
//!
//! match session.wait().await? {
//!     State::Fired => log_info!("charts refreshed"),
//!     state => log_warn!("charts not refreshed: {state}"),
//! }
//! ```
//!

mod options;
mod session;
mod state;

pub use options::{Options, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS};
pub use session::SessionHandle;
pub use state::State;

use crate::error::Error;
use crate::result::Result;
use crate::MaybeSend;
use std::fmt::Display;

/// Poll `predicate` every `options.poll_interval_ms` and invoke `on_ready`
/// once it returns `true`.
///
/// If the predicate already holds, `on_ready` runs synchronously and the
/// returned session is [`State::Fired`] without a timer being started.
/// Fails with [`Error::InvalidConfiguration`] before evaluating anything
/// if the options are invalid.
///
/// On native targets this must be called from within a tokio runtime.
pub fn wait_until_ready<P, R>(mut predicate: P, on_ready: R, options: Options) -> Result<SessionHandle>
where
    P: FnMut() -> bool + MaybeSend + 'static,
    R: FnOnce() + MaybeSend + 'static,
{
    session::start(
        Box::new(move || Ok(predicate())),
        Box::new(move || {
            on_ready();
            Ok(())
        }),
        options,
    )
}

/// Fallible variant of [`wait_until_ready()`]. A predicate error
/// terminates the session in [`State::Failed`]; a callback error is
/// recorded on the fired session. Both are reported by
/// [`SessionHandle::wait()`]. A predicate error during the synchronous
/// first evaluation is returned directly since no session was started.
pub fn try_wait_until_ready<P, R, E>(
    mut predicate: P,
    on_ready: R,
    options: Options,
) -> Result<SessionHandle>
where
    P: FnMut() -> std::result::Result<bool, E> + MaybeSend + 'static,
    R: FnOnce() -> std::result::Result<(), E> + MaybeSend + 'static,
    E: Display,
{
    session::start(
        Box::new(move || predicate().map_err(|err| Error::Predicate(err.to_string()))),
        Box::new(move || on_ready().map_err(|err| Error::Callback(err.to_string()))),
        options,
    )
}

#[cfg(not(target_arch = "wasm32"))]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Duration;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::{sleep, Instant};

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[derive(Clone, Default)]
    struct Counter(Arc<AtomicUsize>);

    impl Counter {
        fn bump(&self) -> usize {
            self.0.fetch_add(1, Ordering::SeqCst) + 1
        }

        fn get(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_when_predicate_turns_true_on_fourth_tick() {
        let evaluations = Counter::default();
        let fired = Counter::default();
        let start = Instant::now();

        let evaluations_ = evaluations.clone();
        let fired_ = fired.clone();
        let session = wait_until_ready(
            move || {
                evaluations_.bump();
                start.elapsed() >= ms(400)
            },
            move || {
                fired_.bump();
            },
            Options::new(ms(100), ms(5000)),
        )
        .unwrap();

        assert_eq!(session.state(), State::Waiting);
        assert_eq!(session.wait().await, Ok(State::Fired));

        let resolved_at = start.elapsed();
        assert!(resolved_at >= ms(400) && resolved_at < ms(500), "{resolved_at:?}");
        assert_eq!(fired.get(), 1);
        assert_eq!(session.ticks(), 4);
        // one synchronous evaluation plus four ticks
        assert_eq!(evaluations.get(), 5);

        sleep(ms(1000)).await;
        assert_eq!(evaluations.get(), 5);
        assert_eq!(fired.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_predicate_never_holds() {
        let fired = Counter::default();
        let timeouts = Counter::default();
        let start = Instant::now();

        let fired_ = fired.clone();
        let timeouts_ = timeouts.clone();
        let options = Options::new(ms(100), ms(300)).with_on_timeout(move || {
            timeouts_.bump();
        });
        let session = wait_until_ready(|| false, move || { fired_.bump(); }, options).unwrap();

        assert_eq!(session.wait().await, Ok(State::TimedOut));
        let resolved_at = start.elapsed();
        assert!(resolved_at >= ms(300) && resolved_at <= ms(400), "{resolved_at:?}");
        assert_eq!(fired.get(), 0);
        assert_eq!(timeouts.get(), 1);
        assert_eq!(session.ticks(), 3);

        sleep(ms(1000)).await;
        assert_eq!(session.ticks(), 3);
        assert_eq!(timeouts.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_not_a_multiple_of_interval_resolves_within_one_interval() {
        let start = Instant::now();
        let session = wait_until_ready(|| false, || {}, Options::new(ms(100), ms(250))).unwrap();
        assert_eq!(session.wait().await, Ok(State::TimedOut));
        let resolved_at = start.elapsed();
        assert!(resolved_at >= ms(250) && resolved_at <= ms(350), "{resolved_at:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_suppresses_callback() {
        let ready = Arc::new(AtomicBool::new(false));
        let fired = Counter::default();
        let evaluations = Counter::default();

        let ready_ = ready.clone();
        let fired_ = fired.clone();
        let evaluations_ = evaluations.clone();
        let session = wait_until_ready(
            move || {
                evaluations_.bump();
                ready_.load(Ordering::SeqCst)
            },
            move || {
                fired_.bump();
            },
            Options::default(),
        )
        .unwrap();

        sleep(ms(150)).await;
        session.cancel();
        assert_eq!(session.state(), State::Cancelled);
        let evaluated = evaluations.get();

        ready.store(true, Ordering::SeqCst);
        sleep(ms(1000)).await;

        assert_eq!(fired.get(), 0);
        assert_eq!(evaluations.get(), evaluated);
        assert_eq!(session.wait().await, Ok(State::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent_and_ignored_after_resolution() {
        let session = wait_until_ready(|| false, || {}, Options::default()).unwrap();
        session.cancel();
        session.cancel();
        assert_eq!(session.state(), State::Cancelled);

        let fired = Counter::default();
        let fired_ = fired.clone();
        let start = Instant::now();
        let session = wait_until_ready(
            move || start.elapsed() >= ms(100),
            move || {
                fired_.bump();
            },
            Options::default(),
        )
        .unwrap();
        assert_eq!(session.wait().await, Ok(State::Fired));
        session.cancel();
        assert_eq!(session.state(), State::Fired);
        assert_eq!(fired.get(), 1);

        let session = wait_until_ready(|| false, || {}, Options::new(ms(100), ms(100))).unwrap();
        assert_eq!(session.wait().await, Ok(State::TimedOut));
        session.cancel();
        assert_eq!(session.state(), State::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_from_a_clone_resolves_waiters() {
        let session = wait_until_ready(|| false, || {}, Options::default()).unwrap();
        let clone = session.clone();
        let waiter = tokio::spawn(async move { clone.wait().await });
        sleep(ms(250)).await;
        session.cancel();
        assert_eq!(waiter.await.unwrap(), Ok(State::Cancelled));
    }

    #[test]
    fn invalid_options_rejected_before_evaluation() {
        let evaluations = Counter::default();

        let evaluations_ = evaluations.clone();
        let result = wait_until_ready(
            move || {
                evaluations_.bump();
                true
            },
            || {},
            Options::default().with_poll_interval(Duration::ZERO),
        );
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));

        let evaluations_ = evaluations.clone();
        let result = wait_until_ready(
            move || {
                evaluations_.bump();
                true
            },
            || {},
            Options::new(ms(100), ms(50)),
        );
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));

        assert_eq!(evaluations.get(), 0);
    }

    // no runtime here: an immediately ready predicate never needs a timer
    #[test]
    fn ready_predicate_fires_synchronously() {
        let fired = Counter::default();
        let fired_ = fired.clone();
        let session = wait_until_ready(
            || true,
            move || {
                fired_.bump();
            },
            Options::default(),
        )
        .unwrap();

        assert_eq!(fired.get(), 1);
        assert_eq!(session.state(), State::Fired);
        assert_eq!(session.ticks(), 0);
        assert!(session.is_terminal());
    }

    #[tokio::test(start_paused = true)]
    async fn predicate_error_terminates_session() {
        let evaluations = Counter::default();
        let fired = Counter::default();

        let evaluations_ = evaluations.clone();
        let fired_ = fired.clone();
        let session = try_wait_until_ready(
            move || match evaluations_.bump() {
                1 | 2 => Ok(false),
                _ => Err("library probe threw"),
            },
            move || {
                fired_.bump();
                Ok(())
            },
            Options::default(),
        )
        .unwrap();

        assert_eq!(
            session.wait().await,
            Err(Error::Predicate("library probe threw".to_string()))
        );
        assert_eq!(session.state(), State::Failed);
        assert_eq!(session.ticks(), 2);

        sleep(ms(1000)).await;
        assert_eq!(evaluations.get(), 3);
        assert_eq!(fired.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn callback_error_is_reported() {
        let start = Instant::now();
        let session = try_wait_until_ready(
            move || Ok::<_, String>(start.elapsed() >= ms(200)),
            || Err("loader missing".to_string()),
            Options::default(),
        )
        .unwrap();

        assert_eq!(
            session.wait().await,
            Err(Error::Callback("loader missing".to_string()))
        );
        assert_eq!(session.state(), State::Fired);
    }

    #[test]
    fn synchronous_predicate_failure_is_returned_to_the_caller() {
        let result = try_wait_until_ready(|| Err("boom"), || Ok(()), Options::default());
        assert_eq!(result.unwrap_err(), Error::Predicate("boom".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_callback_error_is_reported_by_wait() {
        let session = try_wait_until_ready(
            || Ok::<_, String>(true),
            || Err("loader missing".to_string()),
            Options::default(),
        )
        .unwrap();

        assert_eq!(session.state(), State::Fired);
        assert_eq!(session.error(), Some(Error::Callback("loader missing".to_string())));
        assert_eq!(
            session.wait().await,
            Err(Error::Callback("loader missing".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn predicate_panic_releases_timer() {
        let evaluations = Counter::default();
        let evaluations_ = evaluations.clone();
        let session = wait_until_ready(
            move || {
                if evaluations_.bump() == 2 {
                    panic!("predicate exploded");
                }
                false
            },
            || {},
            Options::default(),
        )
        .unwrap();

        assert!(matches!(session.wait().await, Err(Error::Predicate(_))));
        assert_eq!(session.state(), State::Failed);

        sleep(ms(1000)).await;
        assert_eq!(evaluations.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn ready_callback_panic_is_recorded() {
        let evaluations = Counter::default();
        let start = Instant::now();

        let evaluations_ = evaluations.clone();
        let session = wait_until_ready(
            move || {
                evaluations_.bump();
                start.elapsed() >= ms(200)
            },
            || panic!("refresh exploded"),
            Options::default(),
        )
        .unwrap();

        assert_eq!(
            session.wait().await,
            Err(Error::Callback("ready callback panicked".to_string()))
        );
        assert_eq!(session.state(), State::Fired);
        let evaluated = evaluations.get();

        sleep(ms(1000)).await;
        assert_eq!(evaluations.get(), evaluated);
        assert_eq!(session.ticks(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_callback_panic_resolves_waiters() {
        let options = Options::new(ms(100), ms(300)).with_on_timeout(|| panic!("alert failed"));
        let session = wait_until_ready(|| false, || {}, options).unwrap();

        let outcome = tokio::time::timeout(ms(60_000), session.wait()).await;
        assert_eq!(
            outcome,
            Ok(Err(Error::TimeoutCallback("timeout callback panicked".to_string())))
        );
        assert_eq!(session.state(), State::TimedOut);

        sleep(ms(1000)).await;
        assert_eq!(session.ticks(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn sessions_are_independent() {
        let start = Instant::now();
        let fast = wait_until_ready(move || start.elapsed() >= ms(100), || {}, Options::default())
            .unwrap();
        let slow = wait_until_ready(|| false, || {}, Options::new(ms(50), ms(200))).unwrap();
        assert_ne!(fast.id(), slow.id());

        let (fast, slow) = tokio::join!(fast.wait(), slow.wait());
        assert_eq!(fast, Ok(State::Fired));
        assert_eq!(slow, Ok(State::TimedOut));
    }
}
