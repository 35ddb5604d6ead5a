//!
//! Page-side [`Loader`] and [`RefreshTarget`] implementations: data loading
//! functions defined as page globals and chart instances handed over by
//! the caller.
//!

use crate::error::js_error_message;
use crate::probe::global;
use crate::sendable::Sendable;
use chartwait_core::recovery::{Loader, RefreshTarget};
use chartwait_log::*;
use js_sys::{Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};

/// Calls the page function `globalThis[name]()` if it exists
#[derive(Debug, Clone)]
pub struct GlobalLoader {
    name: String,
}

impl GlobalLoader {
    pub fn new(name: impl Into<String>) -> Self {
        GlobalLoader { name: name.into() }
    }
}

impl Loader for GlobalLoader {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) {
        match global(&self.name).and_then(|value| value.dyn_into::<Function>().ok()) {
            Some(function) => {
                log_debug!(target: "loader", "calling {}()", self.name);
                if let Err(err) = function.call0(&JsValue::UNDEFINED) {
                    log_error!(target: "loader", "{}() threw: {}", self.name, js_error_message(&err));
                }
            }
            None => {
                log_warn!(target: "loader", "function `{}` does not exist", self.name);
            }
        }
    }
}

/// A chart instance refreshed by calling its `update()` method
#[derive(Debug, Clone)]
pub struct ChartInstance {
    name: String,
    chart: Sendable<JsValue>,
}

impl ChartInstance {
    /// Wrap a chart object; `index` names it when its canvas has no id
    pub fn new(chart: JsValue, index: usize) -> Self {
        let name = Reflect::get(&chart, &JsValue::from_str("canvas"))
            .ok()
            .and_then(|canvas| Reflect::get(&canvas, &JsValue::from_str("id")).ok())
            .and_then(|id| id.as_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("chart#{index}"));

        ChartInstance {
            name,
            chart: Sendable(chart),
        }
    }
}

impl RefreshTarget for ChartInstance {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn refresh(&self) {
        let update = Reflect::get(&self.chart, &JsValue::from_str("update"))
            .ok()
            .and_then(|value| value.dyn_into::<Function>().ok());
        match update {
            Some(update) => {
                if let Err(err) = update.call0(&self.chart) {
                    log_error!(target: "refresh", "`{}`.update() threw: {}", self.name, js_error_message(&err));
                }
            }
            None => {
                log_warn!(target: "refresh", "`{}` has no update() method", self.name);
            }
        }
    }
}
