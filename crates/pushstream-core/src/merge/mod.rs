//! Push-down: criteria and query mergers over a strategy registry.
//!
//! Both mergers walk the pipeline from the front and stop at the first
//! operation that is not fully absorbed. Everything pushed down therefore
//! sits before anything left for replay, which keeps the executed query plus
//! replay equivalent to applying the original operations in order.

mod registry;
mod strategy;
mod tracker;
mod translate;

#[cfg(test)]
mod tests;

use crate::{
    error::TranslationError,
    model::{IntermediateOperation, Pipeline},
    query::{CriteriaQuery, ExecutableQuery},
    traits::Entity,
};

// re-exports
pub use registry::MergeRegistry;
pub use strategy::{
    CriteriaStrategy, DistinctCriteria, FilterCriteria, LimitQuery, QueryStrategy, SkipQuery,
    SortedCriteria,
};
pub use tracker::{MergeOutcome, MergingTracker};

///
/// CriteriaMerger
///

pub struct CriteriaMerger<'a, E> {
    registry: &'a MergeRegistry<E>,
}

impl<'a, E: Entity> CriteriaMerger<'a, E> {
    #[must_use]
    pub const fn new(registry: &'a MergeRegistry<E>) -> Self {
        Self { registry }
    }

    pub fn merge(&self, pipeline: &mut Pipeline<E>, criteria: &mut CriteriaQuery) -> MergeOutcome {
        merge_prefix(pipeline, |index, operation, tracker| {
            for strategy in self.registry.criteria_for(operation.kind()) {
                strategy.apply(index, operation, criteria, tracker)?;
                if tracker.is_marked_for_removal(index) || tracker.is_replaced(index) {
                    break;
                }
            }
            Ok(())
        })
    }
}

///
/// QueryMerger
/// runs after the criteria merger, for execution-time properties
///

pub struct QueryMerger<'a, E> {
    registry: &'a MergeRegistry<E>,
}

impl<'a, E: Entity> QueryMerger<'a, E> {
    #[must_use]
    pub const fn new(registry: &'a MergeRegistry<E>) -> Self {
        Self { registry }
    }

    pub fn merge(&self, pipeline: &mut Pipeline<E>, query: &mut ExecutableQuery) -> MergeOutcome {
        merge_prefix(pipeline, |index, operation, tracker| {
            for strategy in self.registry.query_for(operation.kind()) {
                strategy.apply(index, operation, query, tracker)?;
                if tracker.is_marked_for_removal(index) || tracker.is_replaced(index) {
                    break;
                }
            }
            Ok(())
        })
    }
}

///
/// Merger
/// criteria pass then query pass, over one registry
///

pub struct Merger<'a, E> {
    registry: &'a MergeRegistry<E>,
}

impl<'a, E: Entity> Merger<'a, E> {
    #[must_use]
    pub const fn new(registry: &'a MergeRegistry<E>) -> Self {
        Self { registry }
    }

    pub fn merge_criteria(
        &self,
        pipeline: &mut Pipeline<E>,
        criteria: &mut CriteriaQuery,
    ) -> MergeOutcome {
        CriteriaMerger::new(self.registry).merge(pipeline, criteria)
    }

    pub fn merge_query(
        &self,
        pipeline: &mut Pipeline<E>,
        query: &mut ExecutableQuery,
    ) -> MergeOutcome {
        QueryMerger::new(self.registry).merge(pipeline, query)
    }

    /// Both passes against an already materialized query.
    pub fn merge(&self, pipeline: &mut Pipeline<E>, query: &mut ExecutableQuery) -> MergeOutcome {
        let criteria = self.merge_criteria(pipeline, query.criteria_mut());
        let window = self.merge_query(pipeline, query);

        MergeOutcome {
            removed: criteria.removed + window.removed,
            replaced: criteria.replaced + window.replaced,
            merged: criteria.merged.into_iter().chain(window.merged).collect(),
            failures: criteria.failures.into_iter().chain(window.failures).collect(),
        }
    }
}

// Apply `merge_one` to each operation from the front until one is not
// absorbed, then strip everything the tracker marked.
fn merge_prefix<E>(
    pipeline: &mut Pipeline<E>,
    mut merge_one: impl FnMut(
        usize,
        &IntermediateOperation<E>,
        &mut MergingTracker<E>,
    ) -> Result<(), TranslationError>,
) -> MergeOutcome {
    let mut tracker = MergingTracker::new();

    for (index, operation) in pipeline.operations().iter().enumerate() {
        if let Err(err) = merge_one(index, operation, &mut tracker) {
            tracker.record_failure(index, err);
            break;
        }
        if !tracker.is_marked_for_removal(index) {
            break;
        }
    }

    tracker.apply(pipeline)
}
