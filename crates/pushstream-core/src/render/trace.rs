//! Render tracing boundary.
//!
//! Tracing is optional, injected by the caller, and must not affect render
//! semantics.

use crate::{
    error::{ErrorClass, RenderError, TranslationError},
    render::RenderPhase,
};

///
/// RenderTraceSink
///

pub trait RenderTraceSink: Send + Sync {
    fn on_event(&self, event: RenderTraceEvent);
}

///
/// RenderTraceEvent
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RenderTraceEvent {
    Start {
        entity: &'static str,
        operations: u64,
    },
    Phase {
        entity: &'static str,
        phase: RenderPhase,
        operations: u64,
    },
    TranslationFailure {
        entity: &'static str,
        error: TranslationError,
    },
    Finish {
        entity: &'static str,
        pushed: u64,
        replayed: u64,
    },
    Error {
        entity: &'static str,
        class: ErrorClass,
    },
}

///
/// TraceScope
///

pub(crate) struct TraceScope {
    sink: &'static dyn RenderTraceSink,
    entity: &'static str,
}

impl TraceScope {
    fn new(sink: &'static dyn RenderTraceSink, entity: &'static str, operations: u64) -> Self {
        sink.on_event(RenderTraceEvent::Start { entity, operations });

        Self { sink, entity }
    }

    pub(crate) fn phase(&self, phase: RenderPhase, operations: usize) {
        self.sink.on_event(RenderTraceEvent::Phase {
            entity: self.entity,
            phase,
            operations: operations as u64,
        });
    }

    pub(crate) fn translation_failure(&self, error: &TranslationError) {
        self.sink.on_event(RenderTraceEvent::TranslationFailure {
            entity: self.entity,
            error: error.clone(),
        });
    }

    pub(crate) fn finish(self, pushed: u64, replayed: u64) {
        self.sink.on_event(RenderTraceEvent::Finish {
            entity: self.entity,
            pushed,
            replayed,
        });
    }

    pub(crate) fn error(self, err: &RenderError) {
        self.sink.on_event(RenderTraceEvent::Error {
            entity: self.entity,
            class: err.class(),
        });
    }
}

pub(crate) fn start_trace(
    sink: Option<&'static dyn RenderTraceSink>,
    entity: &'static str,
    operations: usize,
) -> Option<TraceScope> {
    sink.map(|sink| TraceScope::new(sink, entity, operations as u64))
}
