//!
//! JavaScript API exported with `wasm_bindgen`.
//!

use crate::error::{js_error_message, Error};
use crate::inject;
use crate::probe::{global_exists, library_version, DocumentProbe};
use crate::result::{JsResult, Result};
use crate::sendable::Sendable;
use crate::targets::{ChartInstance, GlobalLoader};
use chartwait_core::recovery::{schedule_recovery, RecoveryConfig, RecoveryPlan, RefreshTarget};
use chartwait_core::waiter::{try_wait_until_ready, Options, SessionHandle};
use chartwait_log::*;
use js_sys::{Array, Function, Promise, Reflect};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use wasm_bindgen::prelude::*;

pub const DEFAULT_LIBRARY: &str = "Chart";
pub const DEFAULT_COMPARATIVE_LOADER: &str = "loadComparativeData";
pub const DEFAULT_PREDICTION_LOADER: &str = "loadPredictionData";

///
/// Options accepted by `fixCharts()`: the recovery configuration plus
/// the names of the library global and of the page's loader functions.
/// When `libraryUrl` is set and the library global is missing, the
/// script is injected while the session polls for it.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FixChartsOptions {
    pub library: String,
    pub library_url: Option<String>,
    pub comparative_loader: String,
    pub prediction_loader: String,
    #[serde(flatten)]
    pub recovery: RecoveryConfig,
}

impl Default for FixChartsOptions {
    fn default() -> Self {
        Self {
            library: DEFAULT_LIBRARY.to_string(),
            library_url: None,
            comparative_loader: DEFAULT_COMPARATIVE_LOADER.to_string(),
            prediction_loader: DEFAULT_PREDICTION_LOADER.to_string(),
            recovery: RecoveryConfig::default(),
        }
    }
}

fn is_absent(value: &JsValue) -> bool {
    value.is_undefined() || value.is_null()
}

/// Convert a JS options object into [`Options`], picking up an
/// optional `onTimeout` function.
fn waiter_options(options: &JsValue) -> Result<Options> {
    if is_absent(options) {
        return Ok(Options::default());
    }
    let mut parsed: Options = serde_wasm_bindgen::from_value(options.clone())?;
    let on_timeout = Reflect::get(options, &JsValue::from_str("onTimeout"))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok());
    if let Some(on_timeout) = on_timeout {
        let on_timeout = Sendable(on_timeout);
        parsed = parsed.with_on_timeout(move || {
            if let Err(err) = on_timeout.call0(&JsValue::UNDEFINED) {
                log_error!(target: "waiter", "onTimeout threw: {}", js_error_message(&err));
            }
        });
    }
    Ok(parsed)
}

/// Session handle returned to JavaScript
#[wasm_bindgen]
pub struct ReadinessSession {
    handle: SessionHandle,
}

#[wasm_bindgen]
impl ReadinessSession {
    /// Cancel the session; a no-op once it is resolved
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    /// One of `waiting`, `fired`, `timedOut`, `cancelled`, `failed`
    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        self.handle.state().to_string()
    }

    #[wasm_bindgen(getter, js_name = isTerminal)]
    pub fn is_terminal(&self) -> bool {
        self.handle.is_terminal()
    }

    #[wasm_bindgen(getter)]
    pub fn ticks(&self) -> u32 {
        u32::try_from(self.handle.ticks()).unwrap_or(u32::MAX)
    }

    /// Promise resolving to the terminal state, rejected with the
    /// predicate or callback error if one was thrown
    pub fn wait(&self) -> Promise {
        let handle = self.handle.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            match handle.wait().await {
                Ok(state) => Ok(JsValue::from_str(state.as_str())),
                Err(err) => Err(Error::from(err).into()),
            }
        })
    }
}

/// `waitUntilReady(predicate, onReady, options?)`: poll `predicate` every
/// `pollIntervalMs` (default 100) and call `onReady` once it returns a
/// truthy value, giving up after `timeoutMs` (default 5000).
#[wasm_bindgen(js_name = waitUntilReady)]
pub fn wait_until_ready_js(
    predicate: Function,
    on_ready: Function,
    options: JsValue,
) -> JsResult<ReadinessSession> {
    let options = waiter_options(&options)?;
    let predicate = Sendable(predicate);
    let on_ready = Sendable(on_ready);

    let handle = try_wait_until_ready(
        move || {
            predicate
                .call0(&JsValue::UNDEFINED)
                .map(|value| value.is_truthy())
                .map_err(|err| js_error_message(&err))
        },
        move || {
            on_ready
                .call0(&JsValue::UNDEFINED)
                .map(|_| ())
                .map_err(|err| js_error_message(&err))
        },
        options,
    )
    .map_err(Error::from)?;

    Ok(ReadinessSession { handle })
}

/// `fixCharts(charts?, options?)`: once the charting library global is
/// available, run the page's data loaders whose canvases are present and
/// call `update()` on each chart in `charts`.
#[wasm_bindgen(js_name = fixCharts)]
pub fn fix_charts(charts: JsValue, options: JsValue) -> JsResult<ReadinessSession> {
    let options: FixChartsOptions = if is_absent(&options) {
        FixChartsOptions::default()
    } else {
        serde_wasm_bindgen::from_value(options).map_err(Error::from)?
    };

    let targets = if is_absent(&charts) {
        Vec::new()
    } else {
        Array::from(&charts)
            .iter()
            .enumerate()
            .map(|(index, chart)| Arc::new(ChartInstance::new(chart, index)) as Arc<dyn RefreshTarget>)
            .collect::<Vec<_>>()
    };

    let plan = RecoveryPlan::standard(
        Arc::new(GlobalLoader::new(options.comparative_loader.clone())),
        Arc::new(GlobalLoader::new(options.prediction_loader.clone())),
    )
    .with_targets(targets);

    let library = options.library.clone();
    if !global_exists(&library) {
        match options.library_url.clone() {
            Some(url) => {
                let name = library.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(err) = inject::ensure_library(&name, &url).await {
                        log_error!(target: "charts", "unable to load `{name}`: {err}");
                    }
                });
            }
            None => {
                log_info!(target: "charts", "`{library}` is not loaded yet, waiting");
            }
        }
    }

    let handle = schedule_recovery(
        move || global_exists(&library),
        DocumentProbe,
        plan,
        options.recovery.clone(),
        move |report| {
            match library_version(&options.library) {
                Some(version) => log_info!(target: "charts", "{} {version} ready", options.library),
                None => log_info!(target: "charts", "{} ready", options.library),
            }
            log_info!(
                target: "charts",
                "recovery complete: loaded {:?}, refreshed {}, missing {:?}",
                report.loaded,
                report.refreshed,
                report.missing
            );
        },
    )
    .map_err(Error::from)?;

    Ok(ReadinessSession { handle })
}

/// `ensureLibrary(name, url)`: inject `url` unless the global `name` exists
#[wasm_bindgen(js_name = ensureLibrary)]
pub fn ensure_library(name: String, url: String) -> Promise {
    wasm_bindgen_futures::future_to_promise(async move {
        inject::ensure_library(&name, &url).await?;
        Ok(JsValue::UNDEFINED)
    })
}

/// `setLogLevel(level)`: one of `off`, `error`, `warn`, `info`, `debug`, `trace`
#[wasm_bindgen(js_name = setLogLevel)]
pub fn set_log_level_js(level: &str) -> JsResult<()> {
    let level = LevelFilter::from_str(level)
        .map_err(|_| Error::Options(format!("unknown log level `{level}`")))?;
    set_log_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fix_charts_options_parse_flat_object() {
        let options: FixChartsOptions = serde_json::from_str(
            r#"{
                "library": "Chart",
                "libraryUrl": "https://cdn.jsdelivr.net/npm/chart.js",
                "pollIntervalMs": 50,
                "settleDelayMs": 0
            }"#,
        )
        .unwrap();

        assert_eq!(
            options.library_url.as_deref(),
            Some("https://cdn.jsdelivr.net/npm/chart.js")
        );
        assert_eq!(options.recovery.waiter.poll_interval_ms, 50);
        assert_eq!(options.recovery.settle_delay_ms, 0);
        assert_eq!(options.comparative_loader, DEFAULT_COMPARATIVE_LOADER);
    }

    #[test]
    fn fix_charts_options_default_to_no_injection() {
        let options: FixChartsOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.library, DEFAULT_LIBRARY);
        assert!(options.library_url.is_none());
        assert_eq!(
            options.recovery.waiter.timeout_ms,
            chartwait_core::waiter::DEFAULT_TIMEOUT_MS
        );
    }
}
