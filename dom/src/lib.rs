//!
//! Browser bindings for [`chartwait_core`].
//!
//! Provides the page-facing side of chart recovery: element and global
//! probes backed by the live document, loaders that call page-defined
//! data loading functions, refresh targets wrapping chart instances and
//! `<script>` injection for a missing charting library. The [`bindings`]
//! module exports the JavaScript API:
//!
//! ```javascript
//! import init, { waitUntilReady, fixCharts } from "./chartwait_dom.js";
//! await init();
//!
//! const session = waitUntilReady(
//!     () => typeof Chart !== "undefined",
//!     () => console.log("Chart.js available"),
//!     { pollIntervalMs: 100, timeoutMs: 5000 },
//! );
//! // session.cancel();
//!
//! fixCharts([revenueChart, marginChart], { settleDelayMs: 500 });
//! ```

pub mod bindings;
pub mod error;
pub mod inject;
pub mod probe;
pub mod result;
pub mod sendable;
pub mod targets;
