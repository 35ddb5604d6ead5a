//!
//! `Sleep` future backed by the JavaScript `setTimeout()` and `clearTimeout()` APIs.
//!

use crate::time::{as_millis_u32, Duration};
use futures::task::AtomicWaker;
use std::future::Future;
use std::{
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    task::{Context, Poll},
};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen (catch, js_name = setTimeout)]
    pub fn set_timeout(
        closure: &Closure<dyn FnMut()>,
        timeout: u32,
    ) -> std::result::Result<JsValue, JsValue>;
    #[wasm_bindgen (catch, js_name = clearTimeout)]
    pub fn clear_timeout(instance: &JsValue) -> std::result::Result<(), JsValue>;
}

struct SleepContext {
    instance: JsValue,
    #[allow(dead_code)]
    closure: Closure<dyn FnMut()>,
}

struct Inner {
    ready: AtomicBool,
    waker: AtomicWaker,
    ctx: Mutex<Option<SleepContext>>,
}

/// Future resolving once the given duration elapses. Dropping it
/// before resolution clears the underlying timeout.
pub struct Sleep {
    inner: Arc<Inner>,
}

impl Sleep {
    pub fn new(duration: Duration) -> Self {
        let inner = Arc::new(Inner {
            ready: AtomicBool::new(false),
            waker: AtomicWaker::new(),
            ctx: Mutex::new(None),
        });

        let inner_ = inner.clone();
        let closure = Closure::new(move || {
            inner_.ready.store(true, Ordering::SeqCst);
            inner_.waker.wake();
        });

        match set_timeout(&closure, as_millis_u32(duration)) {
            Ok(instance) => {
                if let Ok(mut ctx) = inner.ctx.lock() {
                    *ctx = Some(SleepContext { instance, closure });
                }
            }
            Err(err) => {
                // resolve immediately rather than hang forever
                chartwait_log::log_error!(target: "sleep", "setTimeout failed: {err:?}");
                inner.ready.store(true, Ordering::SeqCst);
            }
        }

        Sleep { inner }
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.inner.ready.load(Ordering::SeqCst) {
            return Poll::Ready(());
        }
        self.inner.waker.register(cx.waker());
        if self.inner.ready.load(Ordering::SeqCst) {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        let ctx = self.inner.ctx.lock().ok().and_then(|mut ctx| ctx.take());
        if let Some(ctx) = ctx {
            if !self.inner.ready.load(Ordering::SeqCst) {
                clear_timeout(&ctx.instance).ok();
            }
        }
    }
}

/// `async sleep()` function backed by the JavaScript `setTimeout()`
pub fn sleep(duration: Duration) -> Sleep {
    Sleep::new(duration)
}
