//!
//! Recurring timer backed by the JavaScript `setInterval()` and `clearInterval()` APIs.
//!

use crate::error::Error;
use crate::result::Result;
use crate::time::{as_millis_u32, Duration};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen (catch, js_name = setInterval)]
    pub fn set_interval_js(
        closure: &Closure<dyn FnMut()>,
        timeout: u32,
    ) -> std::result::Result<JsValue, JsValue>;
    #[wasm_bindgen (catch, js_name = clearInterval)]
    pub fn clear_interval_js(interval: &JsValue) -> std::result::Result<(), JsValue>;
}

type IntervalClosure = Closure<dyn FnMut()>;

struct IntervalContext {
    instance: JsValue,
    // retained for the lifetime of the
    // interval, never read
    #[allow(dead_code)]
    closure: IntervalClosure,
}

struct Inner {
    period: Duration,
    cleared: AtomicBool,
    ctx: Mutex<Option<IntervalContext>>,
}

impl Inner {
    fn clear(&self) {
        self.cleared.store(true, Ordering::SeqCst);
        let ctx = match self.ctx.lock() {
            Ok(mut ctx) => ctx.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(ctx) = ctx {
            if let Err(err) = clear_interval_js(&ctx.instance) {
                chartwait_log::log_error!(target: "interval", "clearInterval failed: {err:?}");
            }
            // the closure may be the one currently executing (a tick that
            // resolves its session clears its own timer), so it is released
            // from a microtask once the running callback has returned
            wasm_bindgen_futures::spawn_local(async move {
                drop(ctx);
            });
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

    /// Stop the timer via `clearInterval()`. Clearing an already
    /// cleared timer is a no-op.
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

/// Start a recurring timer invoking `tick` every `period` using
/// `setInterval()`. The browser event loop never re-enters a running
/// callback, so ticks do not overlap.
pub fn set_interval<F>(period: Duration, mut tick: F) -> Result<IntervalHandle>
where
    F: FnMut() + 'static,
{
    let inner = Arc::new(Inner {
        period,
        cleared: AtomicBool::new(false),
        ctx: Mutex::new(None),
    });

    let closure = Closure::new(move || {
        tick();
    });

    let instance = set_interval_js(&closure, as_millis_u32(period))
        .map_err(|err| Error::Timer(format!("setInterval failed: {err:?}")))?;

    match inner.ctx.lock() {
        Ok(mut ctx) => *ctx = Some(IntervalContext { instance, closure }),
        Err(poisoned) => *poisoned.into_inner() = Some(IntervalContext { instance, closure }),
    }

    Ok(IntervalHandle { inner })
}
