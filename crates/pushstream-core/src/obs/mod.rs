//! Observability: render metrics and the sink abstraction.
//!
//! Render and store code never touch the counters directly; every
//! instrumentation point emits a `MetricsEvent` through `sink::record`.

pub(crate) mod metrics;
pub(crate) mod sink;


// re-exports
pub use metrics::{MetricsReport, RenderCounters};
pub use sink::{MetricsEvent, MetricsSink, metrics_report, metrics_reset, with_metrics_sink};
