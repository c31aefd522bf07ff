use derive_more::{Add, AddAssign};
use serde::Serialize;
use std::{cell::RefCell, collections::BTreeMap};

///
/// RenderCounters
/// additive counters; per-entity entries and the totals share the shape
///

#[derive(Add, AddAssign, Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct RenderCounters {
    // Render entrypoints
    pub renders: u64,
    pub render_errors: u64,
    pub count_fast_path: u64,

    // Push-down
    pub operations_pushed: u64,
    pub operations_replayed: u64,
    pub translation_failures: u64,

    // Store
    pub store_executions: u64,
    pub rows_scanned: u64,
}

///
/// MetricsReport
/// point-in-time snapshot of the process-local counters
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct MetricsReport {
    pub totals: RenderCounters,
    pub entities: BTreeMap<String, RenderCounters>,
}

thread_local! {
    static METRICS_STATE: RefCell<MetricsReport> = RefCell::new(MetricsReport::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&MetricsReport) -> R) -> R {
    METRICS_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut MetricsReport) -> R) -> R {
    METRICS_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Add `delta` to the totals and to `entity`'s entry.
pub(crate) fn accumulate(entity: &'static str, delta: RenderCounters) {
    with_state_mut(|m| {
        m.totals += delta;
        *m.entities.entry(entity.to_string()).or_default() += delta;
    });
}

pub(crate) fn reset() {
    with_state_mut(|m| *m = MetricsReport::default());
}
