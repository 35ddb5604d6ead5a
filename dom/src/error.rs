//!
//! Errors returned by the [`chartwait_dom`](super) crate
//!
use crate::sendable::Sendable;
use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};

/// Errors returned by the [`chartwait_dom`](super) crate
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Custom string error
    #[error("{0}")]
    String(String),

    /// Error containing a [`wasm_bindgen::JsValue`] value
    #[error("{}", js_error_message(.0))]
    JsValue(Sendable<JsValue>),

    #[error(transparent)]
    Core(#[from] chartwait_core::error::Error),

    /// Options object could not be converted
    #[error("invalid options: {0}")]
    Options(String),

    /// The pending operation was dropped before completion
    #[error("operation canceled")]
    Canceled,
}

impl From<String> for Error {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Error {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<JsValue> for Error {
    fn from(v: JsValue) -> Self {
        Self::JsValue(Sendable(v))
    }
}

impl From<serde_wasm_bindgen::Error> for Error {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        Self::Options(err.to_string())
    }
}

impl From<futures::channel::oneshot::Canceled> for Error {
    fn from(_: futures::channel::oneshot::Canceled) -> Self {
        Self::Canceled
    }
}

impl From<Error> for JsValue {
    fn from(err: Error) -> Self {
        match err {
            Error::JsValue(value) => value.0,
            err => js_sys::Error::new(&err.to_string()).into(),
        }
    }
}

/// Human readable message of a thrown JavaScript value
pub fn js_error_message(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        String::from(err.message())
    } else if let Some(text) = value.as_string() {
        text
    } else {
        format!("{value:?}")
    }
}
