//! Render orchestration: optimize, merge, execute, replay.
//!
//! One linear run per call and no retries. A pipeline that fails to render
//! is left in its post-merge state and refuses further render calls.

mod configuration;
mod result;
mod terminal;
mod trace;


use crate::{
    config::RendererConfig,
    error::RenderError,
    merge::{CriteriaMerger, MergeRegistry, QueryMerger},
    model::{Pipeline, PipelineState, RowIter, TerminalKind, TerminalOperation},
    obs::{MetricsEvent, sink::record},
    optimize::PipelineOptimizer,
    query::{CriteriaFactory, ExecutableQuery, StandardCriteriaFactory},
    store::QueryExecutor,
    traits::Entity,
};
use std::fmt;

// re-exports
pub use configuration::{Projection, StreamConfiguration};
pub use result::{RenderResult, RenderSummary, ResultSequence};
pub use terminal::TerminalValue;
pub use trace::{RenderTraceEvent, RenderTraceSink};

use trace::{TraceScope, start_trace};

///
/// RenderPhase
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum RenderPhase {
    Init,
    Optimize,
    BuildQuery,
    Execute,
    Replay,
    Done,
}

impl fmt::Display for RenderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Init => "INIT",
            Self::Optimize => "OPTIMIZE",
            Self::BuildQuery => "BUILD_QUERY",
            Self::Execute => "EXECUTE",
            Self::Replay => "REPLAY",
            Self::Done => "DONE",
        };
        f.write_str(label)
    }
}

///
/// Renderer
///
/// Holds the three collaborators (criteria factory, merge registry, query
/// executor) for the lifetime of the renderer. Executors are borrowed per
/// call; pass `&store` to keep ownership outside.
///

pub struct Renderer<E, X, F = StandardCriteriaFactory> {
    factory: F,
    registry: MergeRegistry<E>,
    executor: X,
    optimizer: PipelineOptimizer<E>,
    config: RendererConfig,
    trace: Option<&'static dyn RenderTraceSink>,
}

impl<E: Entity, X: QueryExecutor<E>> Renderer<E, X> {
    /// Standard factory, standard merge strategies, default config.
    #[must_use]
    pub fn new(executor: X) -> Self {
        Self::with_collaborators(StandardCriteriaFactory, MergeRegistry::standard(), executor)
    }
}

impl<E, X, F> Renderer<E, X, F>
where
    E: Entity,
    X: QueryExecutor<E>,
    F: CriteriaFactory<E>,
{
    #[must_use]
    pub fn with_collaborators(factory: F, registry: MergeRegistry<E>, executor: X) -> Self {
        let config = RendererConfig::default();

        Self {
            factory,
            registry,
            executor,
            optimizer: PipelineOptimizer::new(config.optimizer),
            config,
            trace: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: RendererConfig) -> Self {
        self.optimizer = PipelineOptimizer::new(config.optimizer);
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: MergeRegistry<E>) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub const fn with_trace(mut self, trace: &'static dyn RenderTraceSink) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Turn on `[debug]` logging.
    #[must_use]
    pub const fn debug(mut self) -> Self {
        self.config.debug = true;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &RendererConfig {
        &self.config
    }

    #[must_use]
    pub const fn registry(&self) -> &MergeRegistry<E> {
        &self.registry
    }

    #[must_use]
    pub const fn executor(&self) -> &X {
        &self.executor
    }

    fn debug_log(&self, s: impl AsRef<str>) {
        if self.config.debug {
            println!("[debug] {}", s.as_ref());
        }
    }

    /// Render `pipeline` against the executor.
    ///
    /// `configuration` is forwarded uninterpreted: joins and projection to
    /// the criteria factory, hints to the executable query.
    pub fn render(
        &self,
        pipeline: &mut Pipeline<E>,
        configuration: &StreamConfiguration<E>,
    ) -> Result<RenderResult<E>, RenderError> {
        let terminal = pipeline.begin_render()?.clone();
        let trace = start_trace(self.trace, E::ENTITY_NAME, pipeline.len());
        record(MetricsEvent::RenderStart {
            entity: E::ENTITY_NAME,
        });

        match self.render_inner(pipeline, configuration, terminal, trace.as_ref()) {
            Ok(result) => {
                pipeline.mark(PipelineState::Rendered);

                let summary = result.summary();
                record(MetricsEvent::RenderFinish {
                    entity: E::ENTITY_NAME,
                    pushed: summary.pushed as u64,
                    replayed: summary.replayed as u64,
                    fast_path: summary.count_fast_path,
                });
                if let Some(trace) = trace {
                    trace.finish(summary.pushed as u64, summary.replayed as u64);
                }
                self.debug_log(format!("Render phase {}", RenderPhase::Done));

                Ok(result)
            }
            Err(err) => {
                pipeline.mark(PipelineState::Failed);

                record(MetricsEvent::RenderError {
                    entity: E::ENTITY_NAME,
                    class: err.class(),
                });
                if let Some(trace) = trace {
                    trace.error(&err);
                }
                self.debug_log(format!("Render failed: {err}"));

                Err(err)
            }
        }
    }

    fn render_inner(
        &self,
        pipeline: &mut Pipeline<E>,
        configuration: &StreamConfiguration<E>,
        terminal: TerminalOperation<E>,
        trace: Option<&TraceScope>,
    ) -> Result<RenderResult<E>, RenderError> {
        let phase = |phase: RenderPhase, operations: usize| {
            if let Some(trace) = trace {
                trace.phase(phase, operations);
            }
            self.debug_log(format!("Render phase {phase} ({operations} operations)"));
        };
        phase(RenderPhase::Init, pipeline.len());
        self.debug_log(format!("Pipeline: {pipeline}"));

        // optimize
        self.optimizer.optimize(pipeline);
        phase(RenderPhase::Optimize, pipeline.len());
        self.debug_log(format!("Optimized: {pipeline}"));

        // build query
        let mut criteria = self.factory.create(configuration);
        let criteria_outcome = CriteriaMerger::new(&self.registry).merge(pipeline, &mut criteria);

        let mut summary = RenderSummary {
            pushed: criteria_outcome.removed,
            merged: criteria_outcome.merged,
            failures: criteria_outcome.failures,
            ..RenderSummary::default()
        };

        if terminal.kind() == TerminalKind::Count
            && pipeline.is_empty()
            && self.config.count_fast_path
        {
            let count_criteria = criteria.to_count();
            phase(RenderPhase::BuildQuery, pipeline.len());
            self.report_failures(&summary, trace);
            self.debug_log(format!("Count fast path: {count_criteria}"));

            phase(RenderPhase::Execute, 0);
            let count = self.executor.count(&count_criteria)?;

            summary.count_fast_path = true;
            summary.query = Some(ExecutableQuery::new(count_criteria));

            return Ok(RenderResult::new(
                ResultSequence::counted(count),
                terminal,
                summary,
            ));
        }

        let mut query = ExecutableQuery::new(criteria);
        query.extend_hints(configuration.hints());
        let query_outcome = QueryMerger::new(&self.registry).merge(pipeline, &mut query);

        summary.pushed += query_outcome.removed;
        summary.merged.extend(query_outcome.merged);
        summary.failures.extend(query_outcome.failures);
        summary.replayed = pipeline.len();

        phase(RenderPhase::BuildQuery, pipeline.len());
        self.report_failures(&summary, trace);
        self.debug_log(format!("Merged: {:?}", summary.merged));
        self.debug_log(format!("Query: {query}"));

        if let Some(op) = pipeline.operations().iter().find(|op| !op.has_transform()) {
            return Err(RenderError::unsupported(format!(
                "{op} has no in-memory replay and was not pushed down"
            )));
        }

        // execute
        phase(RenderPhase::Execute, pipeline.len());
        let base = self.executor.execute(&query)?;

        // replay
        phase(RenderPhase::Replay, pipeline.len());
        let rows = replay(pipeline, base)?;
        summary.query = Some(query);

        Ok(RenderResult::new(ResultSequence::rows(rows), terminal, summary))
    }

    fn report_failures(&self, summary: &RenderSummary, trace: Option<&TraceScope>) {
        for failure in &summary.failures {
            record(MetricsEvent::TranslationFailure {
                entity: E::ENTITY_NAME,
            });
            if let Some(trace) = trace {
                trace.translation_failure(failure);
            }
            self.debug_log(format!("Left for replay: {failure}"));
        }
    }
}

/// Wrap `base` in each remaining operation's transform, left to right.
/// Nothing is pulled from the store until the terminal operation runs.
fn replay<E>(pipeline: &Pipeline<E>, base: RowIter<E>) -> Result<RowIter<E>, RenderError> {
    pipeline.operations().iter().try_fold(base, |rows, op| {
        op.apply(rows).ok_or_else(|| {
            RenderError::unsupported(format!("{op} has no in-memory replay"))
        })
    })
}

impl<E, X, F> fmt::Debug for Renderer<E, X, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("trace", &self.trace.is_some())
            .finish_non_exhaustive()
    }
}
