//! Fluent stream front end.
//!
//! `StreamBuilder` accumulates intermediate operations into a pipeline and
//! renders it when a terminal method is called. Every terminal consumes the
//! builder, so one builder renders exactly once.

use crate::{
    error::RenderError,
    model::{
        Comparator, IntermediateOperation, Pipeline, Predicate, RowIter, TerminalOperation,
    },
    query::CriteriaFactory,
    render::{Renderer, StreamConfiguration, TerminalValue},
    store::QueryExecutor,
    traits::Entity,
};

///
/// StreamBuilder
///

pub struct StreamBuilder<'r, E, X, F> {
    renderer: &'r Renderer<E, X, F>,
    pipeline: Pipeline<E>,
    configuration: StreamConfiguration<E>,
}

impl<E, X, F> Renderer<E, X, F>
where
    E: Entity,
    X: QueryExecutor<E>,
    F: CriteriaFactory<E>,
{
    /// Start a stream over every `E` row.
    #[must_use]
    pub fn stream(&self) -> StreamBuilder<'_, E, X, F> {
        self.stream_with(StreamConfiguration::new())
    }

    #[must_use]
    pub fn stream_with(&self, configuration: StreamConfiguration<E>) -> StreamBuilder<'_, E, X, F> {
        StreamBuilder {
            renderer: self,
            pipeline: Pipeline::new(),
            configuration,
        }
    }
}

impl<E, X, F> StreamBuilder<'_, E, X, F>
where
    E: Entity,
    X: QueryExecutor<E>,
    F: CriteriaFactory<E>,
{
    #[must_use]
    pub const fn pipeline(&self) -> &Pipeline<E> {
        &self.pipeline
    }

    // ------------------------------------------------------------------
    // Intermediate operations
    // ------------------------------------------------------------------

    /// Append any operation, including push-down-only custom kinds.
    #[must_use]
    pub fn operation(mut self, operation: IntermediateOperation<E>) -> Self {
        self.pipeline.append(operation);
        self
    }

    #[must_use]
    pub fn filter(self, predicate: Predicate<E>) -> Self {
        self.operation(IntermediateOperation::filter(predicate))
    }

    #[must_use]
    pub fn map(self, f: impl Fn(E) -> E + 'static) -> Self {
        self.operation(IntermediateOperation::map(f))
    }

    #[must_use]
    pub fn flat_map(self, f: impl Fn(E) -> Vec<E> + 'static) -> Self {
        self.operation(IntermediateOperation::flat_map(f))
    }

    #[must_use]
    pub fn peek(self, f: impl Fn(&E) + 'static) -> Self {
        self.operation(IntermediateOperation::peek(f))
    }

    #[must_use]
    pub fn distinct(self) -> Self {
        self.operation(IntermediateOperation::distinct())
    }

    /// Natural order (primary key ascending).
    #[must_use]
    pub fn sorted(self) -> Self {
        self.operation(IntermediateOperation::sorted())
    }

    #[must_use]
    pub fn sorted_by(self, comparator: Comparator<E>) -> Self {
        self.operation(IntermediateOperation::sorted_by(comparator))
    }

    #[must_use]
    pub fn limit(self, n: u64) -> Self {
        self.operation(IntermediateOperation::limit(n))
    }

    #[must_use]
    pub fn skip(self, n: u64) -> Self {
        self.operation(IntermediateOperation::skip(n))
    }

    #[must_use]
    pub fn take_while(self, predicate: Predicate<E>) -> Self {
        self.operation(IntermediateOperation::take_while(predicate))
    }

    #[must_use]
    pub fn drop_while(self, predicate: Predicate<E>) -> Self {
        self.operation(IntermediateOperation::drop_while(predicate))
    }

    // ------------------------------------------------------------------
    // Terminal operations
    // ------------------------------------------------------------------

    pub fn count(self) -> Result<u64, RenderError> {
        self.finish(TerminalOperation::count())?
            .as_count()
            .ok_or_else(|| mismatch("COUNT"))
    }

    pub fn find_first(self) -> Result<Option<E>, RenderError> {
        self.finish(TerminalOperation::find_first())?
            .into_element()
            .ok_or_else(|| mismatch("FIND_FIRST"))
    }

    pub fn find_any(self) -> Result<Option<E>, RenderError> {
        self.finish(TerminalOperation::find_any())?
            .into_element()
            .ok_or_else(|| mismatch("FIND_ANY"))
    }

    pub fn any_match(self, predicate: Predicate<E>) -> Result<bool, RenderError> {
        self.finish(TerminalOperation::any_match(predicate))?
            .as_match()
            .ok_or_else(|| mismatch("ANY_MATCH"))
    }

    pub fn all_match(self, predicate: Predicate<E>) -> Result<bool, RenderError> {
        self.finish(TerminalOperation::all_match(predicate))?
            .as_match()
            .ok_or_else(|| mismatch("ALL_MATCH"))
    }

    pub fn none_match(self, predicate: Predicate<E>) -> Result<bool, RenderError> {
        self.finish(TerminalOperation::none_match(predicate))?
            .as_match()
            .ok_or_else(|| mismatch("NONE_MATCH"))
    }

    pub fn collect(self) -> Result<Vec<E>, RenderError> {
        self.finish(TerminalOperation::collect())?
            .into_elements()
            .ok_or_else(|| mismatch("COLLECT"))
    }

    pub fn for_each(self, f: impl Fn(&E) + 'static) -> Result<(), RenderError> {
        let value = self.finish(TerminalOperation::for_each(f))?;
        if value.is_done() {
            Ok(())
        } else {
            Err(mismatch("FOR_EACH"))
        }
    }

    pub fn min(self, comparator: Comparator<E>) -> Result<Option<E>, RenderError> {
        self.finish(TerminalOperation::min(comparator))?
            .into_element()
            .ok_or_else(|| mismatch("MIN"))
    }

    pub fn max(self, comparator: Comparator<E>) -> Result<Option<E>, RenderError> {
        self.finish(TerminalOperation::max(comparator))?
            .into_element()
            .ok_or_else(|| mismatch("MAX"))
    }

    /// Lazy rows; the store has executed but replay runs as they are pulled.
    pub fn rows(self) -> Result<RowIter<E>, RenderError> {
        self.finish(TerminalOperation::iterator())?
            .into_rows()
            .ok_or_else(|| mismatch("ITERATOR"))
    }

    fn finish(self, terminal: TerminalOperation<E>) -> Result<TerminalValue<E>, RenderError> {
        let Self {
            renderer,
            mut pipeline,
            configuration,
        } = self;

        pipeline.set_terminal(terminal)?;
        renderer.render(&mut pipeline, &configuration)?.execute()
    }
}

fn mismatch(terminal: &str) -> RenderError {
    RenderError::illegal_state(format!("{terminal} produced a value of another shape"))
}

///
/// TESTS
///
