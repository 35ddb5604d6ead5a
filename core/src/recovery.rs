//!
//! Post-readiness recovery of a chart dashboard.
//!
//! Once the charting library is available, a [`RecoveryPlan`] checks the
//! page for the canvases each data loader needs, invokes the loaders whose
//! canvases are all present and refreshes the chart instances it was
//! handed. Nothing is looked up in ambient global state: element lookup
//! goes through an [`ElementProbe`], loaders and refresh targets are
//! supplied explicitly.
//!

use crate::result::Result;
use crate::task;
use crate::time::Duration;
use crate::waiter::{wait_until_ready, Options, SessionHandle};
use crate::MaybeSend;
use chartwait_log::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const STOCK_CHART: &str = "stockChart";
pub const COMPARATIVE_CHARTS: [&str; 4] = [
    "revenueComparisonChart",
    "marginComparisonChart",
    "incomeComparisonChart",
    "growthComparisonChart",
];
pub const PREDICTION_CHARTS: [&str; 2] = ["revenuePredictionChart", "marginPredictionChart"];

pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;

/// Answers whether an element with the given id exists in the page
pub trait ElementProbe: MaybeSend {
    fn exists(&self, id: &str) -> bool;
}

/// A zero-argument data loading function provided by the page.
/// Its outcome is never inspected.
pub trait Loader: MaybeSend {
    fn name(&self) -> &str;
    fn load(&self);
}

/// A chart instance that can be asked to re-render
pub trait RefreshTarget: MaybeSend {
    fn name(&self) -> String;
    fn refresh(&self);
}

/// [`Loader`] wrapping a closure
pub struct FnLoader<F> {
    name: String,
    load: F,
}

impl<F> FnLoader<F>
where
    F: Fn() + MaybeSend,
{
    pub fn new(name: impl Into<String>, load: F) -> Self {
        FnLoader {
            name: name.into(),
            load,
        }
    }
}

impl<F> Loader for FnLoader<F>
where
    F: Fn() + MaybeSend,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) {
        (self.load)()
    }
}

/// A loader together with the canvases that must all be present
/// before it is invoked
#[derive(Clone)]
pub struct LoaderGroup {
    pub name: String,
    pub canvases: Vec<String>,
    pub loader: Arc<dyn Loader>,
}

impl LoaderGroup {
    pub fn new<S>(name: impl Into<String>, canvases: &[S], loader: Arc<dyn Loader>) -> Self
    where
        S: AsRef<str>,
    {
        LoaderGroup {
            name: name.into(),
            canvases: canvases.iter().map(|s| s.as_ref().to_string()).collect(),
            loader,
        }
    }
}

impl std::fmt::Debug for LoaderGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderGroup")
            .field("name", &self.name)
            .field("canvases", &self.canvases)
            .field("loader", &self.loader.name())
            .finish()
    }
}

/// Outcome of running a [`RecoveryPlan`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryReport {
    /// A required canvas was missing and nothing was run
    pub aborted: bool,
    /// Canvases that were not found
    pub missing: Vec<String>,
    /// Groups whose loader was invoked
    pub loaded: Vec<String>,
    /// Groups skipped because a canvas was missing
    pub skipped: Vec<String>,
    /// Number of refresh targets refreshed
    pub refreshed: usize,
}

#[derive(Clone, Default)]
pub struct RecoveryPlan {
    required: Vec<String>,
    groups: Vec<LoaderGroup>,
    targets: Vec<Arc<dyn RefreshTarget>>,
}

impl RecoveryPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dashboard layout: the stock chart is required, comparative and
    /// prediction loaders each run only when all their canvases exist.
    pub fn standard(comparative: Arc<dyn Loader>, prediction: Arc<dyn Loader>) -> Self {
        Self::new()
            .require(STOCK_CHART)
            .with_group(LoaderGroup::new("comparative", &COMPARATIVE_CHARTS, comparative))
            .with_group(LoaderGroup::new("prediction", &PREDICTION_CHARTS, prediction))
    }

    /// Abort the plan if this canvas is missing
    pub fn require(mut self, canvas: impl Into<String>) -> Self {
        self.required.push(canvas.into());
        self
    }

    pub fn with_group(mut self, group: LoaderGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn with_target(mut self, target: Arc<dyn RefreshTarget>) -> Self {
        self.targets.push(target);
        self
    }

    pub fn with_targets<I>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn RefreshTarget>>,
    {
        self.targets.extend(targets);
        self
    }

    pub fn groups(&self) -> &[LoaderGroup] {
        &self.groups
    }

    pub fn targets(&self) -> &[Arc<dyn RefreshTarget>] {
        &self.targets
    }

    pub fn run(&self, probe: &dyn ElementProbe) -> RecoveryReport {
        let mut report = RecoveryReport::default();

        for canvas in self.required.iter() {
            if !probe.exists(canvas) {
                log_error!(target: "recovery", "required element `{canvas}` is missing");
                report.missing.push(canvas.clone());
            }
        }
        if !report.missing.is_empty() {
            report.aborted = true;
            return report;
        }

        for group in self.groups.iter() {
            let missing = group
                .canvases
                .iter()
                .filter(|canvas| !probe.exists(canvas))
                .cloned()
                .collect::<Vec<_>>();

            if missing.is_empty() {
                log_info!(
                    target: "recovery",
                    "loading {} data via `{}`",
                    group.name,
                    group.loader.name()
                );
                group.loader.load();
                report.loaded.push(group.name.clone());
            } else {
                for canvas in missing.iter() {
                    log_warn!(target: "recovery", "element `{canvas}` is missing, skipping {} data", group.name);
                }
                report.skipped.push(group.name.clone());
                report.missing.extend(missing);
            }
        }

        for target in self.targets.iter() {
            log_debug!(target: "recovery", "refreshing chart `{}`", target.name());
            target.refresh();
            report.refreshed += 1;
        }

        report
    }
}

impl std::fmt::Debug for RecoveryPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryPlan")
            .field("required", &self.required)
            .field("groups", &self.groups)
            .field("targets", &self.targets.len())
            .finish()
    }
}

///
/// Recovery configuration. Deserializes from a flat object such as
/// `{ "pollIntervalMs": 100, "timeoutMs": 5000, "settleDelayMs": 500 }`.
///
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecoveryConfig {
    /// Pause between readiness and running the plan
    pub settle_delay_ms: u64,
    #[serde(flatten)]
    pub waiter: Options,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            waiter: Options::default(),
        }
    }
}

impl RecoveryConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay_ms = crate::time::as_millis_u64(delay);
        self
    }

    pub fn with_waiter(mut self, waiter: Options) -> Self {
        self.waiter = waiter;
        self
    }
}

/// Wait for `library_ready` to hold, pause for the settle delay, run the
/// plan against `probe` and hand the report to `on_complete`.
///
/// On native targets this must be called from within a tokio runtime,
/// otherwise it fails with [`Error::Timer`](crate::error::Error::Timer)
/// before evaluating `library_ready`.
pub fn schedule_recovery<R, P, C>(
    library_ready: R,
    probe: P,
    plan: RecoveryPlan,
    config: RecoveryConfig,
    on_complete: C,
) -> Result<SessionHandle>
where
    R: FnMut() -> bool + MaybeSend + 'static,
    P: ElementProbe + 'static,
    C: FnOnce(RecoveryReport) + MaybeSend + 'static,
{
    task::ensure_runtime()?;

    let settle = config.settle_delay();
    wait_until_ready(
        library_ready,
        move || {
            log_info!(target: "recovery", "library available, recovering charts in {} ms", settle.as_millis());
            task::spawn(async move {
                if !settle.is_zero() {
                    task::sleep(settle).await;
                }
                let report = plan.run(&probe);
                on_complete(report);
            });
        },
        config.waiter,
    )
}
