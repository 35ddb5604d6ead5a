use super::options::{Options, TimeoutFn};
use super::state::State;
use crate::error::Error;
use crate::interval::{set_interval, IntervalHandle};
use crate::result::Result;
use crate::time::{Duration, Instant};
use chartwait_log::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use triggered::{Listener, Trigger};

cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        pub(crate) type PredicateFn = Box<dyn FnMut() -> Result<bool>>;
        pub(crate) type ReadyFn = Box<dyn FnOnce() -> Result<()>>;
    } else {
        pub(crate) type PredicateFn = Box<dyn FnMut() -> Result<bool> + Send>;
        pub(crate) type ReadyFn = Box<dyn FnOnce() -> Result<()> + Send>;
    }
}

static SESSION_ID: AtomicU64 = AtomicU64::new(1);

struct Inner {
    state: State,
    ticks: u64,
    // taken out while a tick evaluates it
    predicate: Option<PredicateFn>,
    on_ready: Option<ReadyFn>,
    on_timeout: Option<TimeoutFn>,
    timer: Option<IntervalHandle>,
    error: Option<Error>,
}

/// Work left to do after a transition, performed with the lock released
struct Release {
    timer: Option<IntervalHandle>,
    // dropped together with the release, outside the lock
    #[allow(dead_code)]
    predicate: Option<PredicateFn>,
    on_ready: Option<ReadyFn>,
    on_timeout: Option<TimeoutFn>,
}

impl Release {
    fn run(self) {
        if let Some(timer) = self.timer {
            timer.clear();
        }
    }
}

pub(crate) struct Session {
    id: u64,
    poll_interval: Duration,
    timeout: Duration,
    started: Instant,
    inner: Mutex<Inner>,
    trigger: Trigger,
    listener: Listener,
}

impl Session {
    fn new(predicate: PredicateFn, on_ready: ReadyFn, options: &Options) -> Self {
        let (trigger, listener) = triggered::trigger();
        Session {
            id: SESSION_ID.fetch_add(1, Ordering::Relaxed),
            poll_interval: options.poll_interval(),
            timeout: options.timeout(),
            started: Instant::now(),
            inner: Mutex::new(Inner {
                state: State::Waiting,
                ticks: 0,
                predicate: Some(predicate),
                on_ready: Some(on_ready),
                on_timeout: options.on_timeout.clone(),
                timer: None,
                error: None,
            }),
            trigger,
            listener,
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        // user code never runs under this lock, recover from poisoning regardless
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Elapsed time as counted by ticks, or wall-clock time if the
    /// timer has been running late
    fn elapsed(&self, ticks: u64) -> Duration {
        let counted = self
            .poll_interval
            .saturating_mul(u32::try_from(ticks).unwrap_or(u32::MAX));
        counted.max(self.started.elapsed())
    }

    /// Move into a terminal state, returning the resources to release.
    /// Returns `None` if the session was already terminal.
    fn transition(&self, inner: &mut Inner, state: State) -> Option<Release> {
        if inner.state.is_terminal() {
            return None;
        }
        inner.state = state;
        Some(Release {
            timer: inner.timer.take(),
            predicate: inner.predicate.take(),
            on_ready: inner.on_ready.take(),
            on_timeout: inner.on_timeout.take(),
        })
    }

    fn resolve(&self) {
        self.trigger.trigger();
    }

    /// Evaluate the predicate once and advance the state machine.
    fn tick(&self) {
        let mut guard = TickGuard::new(self);

        let mut predicate = {
            let mut inner = self.inner();
            if inner.state.is_terminal() {
                guard.disarm();
                return;
            }
            inner.ticks += 1;
            match inner.predicate.take() {
                Some(predicate) => predicate,
                None => {
                    guard.disarm();
                    return;
                }
            }
        };

        let outcome = predicate();

        let mut inner = self.inner();
        if inner.state.is_terminal() {
            // cancelled while the predicate was running
            drop(inner);
            guard.disarm();
            return;
        }

        match outcome {
            Ok(true) => {
                let release = self.transition(&mut inner, State::Fired);
                let ticks = inner.ticks;
                drop(inner);
                drop(predicate);
                let on_ready = release.and_then(|mut release| {
                    let on_ready = release.on_ready.take();
                    release.run();
                    on_ready
                });
                log_debug!(target: "waiter", "session {} ready after {} tick(s)", self.id, ticks);
                guard.fire(on_ready);
            }
            Ok(false) => {
                let elapsed = self.elapsed(inner.ticks);
                if elapsed >= self.timeout {
                    let release = self.transition(&mut inner, State::TimedOut);
                    drop(inner);
                    drop(predicate);
                    let on_timeout = release.and_then(|mut release| {
                        let on_timeout = release.on_timeout.take();
                        release.run();
                        on_timeout
                    });
                    log_warn!(
                        target: "waiter",
                        "session {} timed out after {} ms",
                        self.id,
                        elapsed.as_millis()
                    );
                    guard.time_out(on_timeout);
                } else {
                    inner.predicate = Some(predicate);
                    drop(inner);
                    guard.disarm();
                }
            }
            Err(err) => {
                let release = self.transition(&mut inner, State::Failed);
                inner.error = Some(err.clone());
                drop(inner);
                drop(predicate);
                guard.disarm();
                log_error!(target: "waiter", "session {} terminated: {err}", self.id);
                if let Some(release) = release {
                    release.run();
                }
                self.resolve();
            }
        }
    }

    fn cancel(&self) {
        let release = {
            let mut inner = self.inner();
            self.transition(&mut inner, State::Cancelled)
        };
        if let Some(release) = release {
            release.run();
            log_debug!(target: "waiter", "session {} cancelled", self.id);
            self.resolve();
        }
    }
}

///
/// Scope guard around a tick body. If the body unwinds (the predicate,
/// the ready callback or the timeout callback panicked) the guard
/// terminates the session, releases its timer and resolves waiters,
/// then lets the panic continue into the scheduler.
///
struct TickGuard<'s> {
    session: &'s Session,
    armed: bool,
}

impl<'s> TickGuard<'s> {
    fn new(session: &'s Session) -> Self {
        TickGuard {
            session,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }

    /// Run the ready callback under the guard and resolve the session.
    fn fire(mut self, on_ready: Option<ReadyFn>) {
        if let Some(on_ready) = on_ready {
            if let Err(err) = on_ready() {
                log_error!(target: "waiter", "session {}: {err}", self.session.id);
                self.session.inner().error = Some(err);
            }
        }
        self.disarm();
        self.session.resolve();
    }

    /// Run the timeout callback under the guard and resolve the session.
    fn time_out(mut self, on_timeout: Option<TimeoutFn>) {
        if let Some(on_timeout) = on_timeout {
            on_timeout();
        }
        self.disarm();
        self.session.resolve();
    }
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let release = {
            let mut inner = self.session.inner();
            match inner.state {
                State::Fired => {
                    inner.error = Some(Error::Callback("ready callback panicked".to_string()));
                    None
                }
                State::TimedOut => {
                    inner.error = Some(Error::TimeoutCallback("timeout callback panicked".to_string()));
                    None
                }
                _ => {
                    let release = self.session.transition(&mut inner, State::Failed);
                    if release.is_some() {
                        inner.error =
                            Some(Error::Predicate("readiness predicate panicked".to_string()));
                    }
                    release
                }
            }
        };
        if let Some(release) = release {
            release.run();
        }
        log_error!(target: "waiter", "session {} terminated by a panic", self.session.id);
        self.session.resolve();
    }
}

///
/// Handle to a polling session returned by [`wait_until_ready`](super::wait_until_ready).
///
/// Dropping the handle does not cancel the session; the session keeps
/// polling until it fires, times out or is cancelled through a clone.
///
#[derive(Clone)]
pub struct SessionHandle {
    session: Arc<Session>,
}

impl SessionHandle {
    /// Session identifier, unique within the process
    pub fn id(&self) -> u64 {
        self.session.id
    }

    pub fn state(&self) -> State {
        self.session.inner().state
    }

    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    /// Number of poll ticks evaluated so far
    pub fn ticks(&self) -> u64 {
        self.session.inner().ticks
    }

    /// Time accounted to the session, the greater of the tick
    /// count times the poll interval and the wall-clock time
    pub fn elapsed(&self) -> Duration {
        let ticks = self.ticks();
        self.session.elapsed(ticks)
    }

    /// Failure recorded by the session, if any
    pub fn error(&self) -> Option<Error> {
        self.session.inner().error.clone()
    }

    /// Cancel the session. The timer is released before this returns
    /// and the ready callback will not run. Cancelling a terminal
    /// session is a no-op.
    pub fn cancel(&self) {
        self.session.cancel();
    }

    /// Wait for the session to reach a terminal state. Yields the
    /// predicate or callback failure if one was recorded.
    pub async fn wait(&self) -> Result<State> {
        self.session.listener.clone().await;
        let inner = self.session.inner();
        match &inner.error {
            Some(err) => Err(err.clone()),
            None => Ok(inner.state),
        }
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.session.inner();
        f.debug_struct("SessionHandle")
            .field("id", &self.session.id)
            .field("state", &inner.state)
            .field("ticks", &inner.ticks)
            .finish()
    }
}

/// Validate options, evaluate the predicate once synchronously and
/// either fire immediately or start a polling session.
pub(crate) fn start(
    mut predicate: PredicateFn,
    on_ready: ReadyFn,
    options: Options,
) -> Result<SessionHandle> {
    options.validate()?;

    if predicate()? {
        let session = Arc::new(Session::new(predicate, on_ready, &options));
        let release = {
            let mut inner = session.inner();
            session.transition(&mut inner, State::Fired)
        };
        let on_ready = release.and_then(|mut release| {
            let on_ready = release.on_ready.take();
            release.run();
            on_ready
        });
        log_debug!(target: "waiter", "session {} ready immediately", session.id);
        if let Some(on_ready) = on_ready {
            if let Err(err) = on_ready() {
                log_error!(target: "waiter", "session {}: {err}", session.id);
                session.inner().error = Some(err);
            }
        }
        session.resolve();
        return Ok(SessionHandle { session });
    }

    let session = Arc::new(Session::new(predicate, on_ready, &options));
    let session_ = session.clone();
    let timer = set_interval(options.poll_interval(), move || session_.tick())?;

    {
        let mut inner = session.inner();
        if inner.state.is_terminal() {
            drop(inner);
            timer.clear();
        } else {
            inner.timer = Some(timer);
        }
    }

    log_trace!(
        target: "waiter",
        "session {} waiting (interval {} ms, timeout {} ms)",
        session.id,
        options.poll_interval_ms,
        options.timeout_ms
    );

    Ok(SessionHandle { session })
}
