//! Metrics sink boundary.
//!
//! This module is the only bridge between render/store code and the
//! process-local metrics state.

use crate::{
    error::ErrorClass,
    obs::metrics::{self, MetricsReport, RenderCounters},
};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = const { RefCell::new(None) };
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    RenderStart {
        entity: &'static str,
    },
    RenderFinish {
        entity: &'static str,
        pushed: u64,
        replayed: u64,
        fast_path: bool,
    },
    RenderError {
        entity: &'static str,
        class: ErrorClass,
    },
    TranslationFailure {
        entity: &'static str,
    },
    StoreExecution {
        entity: &'static str,
        rows_scanned: u64,
    },
}

impl MetricsEvent {
    #[must_use]
    pub const fn entity(&self) -> &'static str {
        match self {
            Self::RenderStart { entity }
            | Self::RenderFinish { entity, .. }
            | Self::RenderError { entity, .. }
            | Self::TranslationFailure { entity }
            | Self::StoreExecution { entity, .. } => entity,
        }
    }

    // Counter delta contributed by this event.
    fn delta(self) -> RenderCounters {
        let mut delta = RenderCounters::default();
        match self {
            Self::RenderStart { .. } => delta.renders = 1,
            Self::RenderFinish {
                pushed,
                replayed,
                fast_path,
                ..
            } => {
                delta.operations_pushed = pushed;
                delta.operations_replayed = replayed;
                delta.count_fast_path = u64::from(fast_path);
            }
            Self::RenderError { .. } => delta.render_errors = 1,
            Self::TranslationFailure { .. } => delta.translation_failures = 1,
            Self::StoreExecution { rows_scanned, .. } => {
                delta.store_executions = 1;
                delta.rows_scanned = rows_scanned;
            }
        }

        delta
    }
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

///
/// GlobalMetricsSink
/// default sink; writes into the process-local counters
///

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::accumulate(event.entity(), event.delta());
    }
}

pub(crate) fn record(event: MetricsEvent) {
    // clone out so a sink may itself record without a re-entrant borrow
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match sink {
        Some(sink) => sink.record(event),
        None => GlobalMetricsSink.record(event),
    }
}

/// Snapshot the current counters.
#[must_use]
pub fn metrics_report() -> MetricsReport {
    metrics::with_state(Clone::clone)
}

/// Reset all counters.
pub fn metrics_reset() {
    metrics::reset();
}

/// Run `f` with `sink` receiving every event recorded on this thread.
/// The previous sink is restored on every exit, unwinding included.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let previous = self.0.take();
            SINK_OVERRIDE.with(|cell| *cell.borrow_mut() = previous);
        }
    }

    let previous = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(previous);

    f()
}
