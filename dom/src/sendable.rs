//!
//! Sendable NewType for automatic Send marker wrapping of JS primitives.
//!

use wasm_bindgen::JsValue;

///
/// Sendable wrapper for JS primitives.
///
/// Wrapping a JS primitive (JsValue, Function, Array etc.) in `Sendable<T>`
/// marks it `Send` and `Sync` so it can be handed to sessions whose
/// callbacks carry the `MaybeSend` bound. JS values only ever exist in
/// the single-threaded WASM environment (browser).
///
#[derive(Debug, Clone)]
pub struct Sendable<T>(pub T);

unsafe impl<T> Send for Sendable<T> {}
// native builds require `Send + Sync` for session callbacks and refresh targets
unsafe impl<T> Sync for Sendable<T> {}

impl<T> std::ops::Deref for Sendable<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> AsRef<T> for Sendable<T> {
    fn as_ref(&self) -> &T {
        &self.0
    }
}

impl<T> From<T> for Sendable<T> {
    fn from(value: T) -> Self {
        Sendable(value)
    }
}

impl From<Sendable<JsValue>> for JsValue {
    fn from(value: Sendable<JsValue>) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartwait_core::MaybeSend;
    use js_sys::Function;

    fn assert_maybe_send<T: MaybeSend>() {}

    #[test]
    fn wrapped_js_values_satisfy_session_bounds() {
        assert_maybe_send::<Sendable<JsValue>>();
        assert_maybe_send::<Sendable<Function>>();
    }
}
