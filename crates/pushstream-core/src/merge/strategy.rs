use crate::{
    error::TranslationError,
    merge::{
        MergingTracker,
        translate::{ParameterBinder, translate_comparator, translate_predicate},
    },
    model::{Comparator, IntermediateKind, IntermediateOperation, Predicate},
    query::{CriteriaQuery, ExecutableQuery, Expr},
    traits::Entity,
};

///
/// CriteriaStrategy
///
/// Pushes one operation kind into the criteria. A strategy that absorbs the
/// operation marks its index for removal (or registers a residual); one that
/// declines leaves the tracker alone. Errors are isolated to the operation.
///

pub trait CriteriaStrategy<E> {
    fn matches(&self, kind: IntermediateKind) -> bool;

    fn apply(
        &self,
        index: usize,
        operation: &IntermediateOperation<E>,
        criteria: &mut CriteriaQuery,
        tracker: &mut MergingTracker<E>,
    ) -> Result<(), TranslationError>;
}

///
/// QueryStrategy
/// same contract as `CriteriaStrategy`, against the executable query
///

pub trait QueryStrategy<E> {
    fn matches(&self, kind: IntermediateKind) -> bool;

    fn apply(
        &self,
        index: usize,
        operation: &IntermediateOperation<E>,
        query: &mut ExecutableQuery,
        tracker: &mut MergingTracker<E>,
    ) -> Result<(), TranslationError>;
}

///
/// FilterCriteria
///
/// Translatable conjuncts go to the WHERE clause; closure-backed conjuncts
/// stay behind as a residual filter in the same position.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct FilterCriteria;

impl<E: Entity> CriteriaStrategy<E> for FilterCriteria {
    fn matches(&self, kind: IntermediateKind) -> bool {
        kind == IntermediateKind::Filter
    }

    fn apply(
        &self,
        index: usize,
        operation: &IntermediateOperation<E>,
        criteria: &mut CriteriaQuery,
        tracker: &mut MergingTracker<E>,
    ) -> Result<(), TranslationError> {
        if criteria.is_windowed() {
            return Ok(());
        }
        let Some(predicate) = operation.predicate() else {
            return Ok(());
        };

        let (pushable, residual): (Vec<_>, Vec<_>) = predicate
            .clone()
            .into_conjuncts()
            .into_iter()
            .partition(Predicate::is_pushable);
        if pushable.is_empty() {
            return Ok(());
        }

        let mut binder = ParameterBinder::after(criteria.parameters().len());
        let exprs = pushable
            .iter()
            .map(|p| translate_predicate(p, &mut binder))
            .collect::<Result<Vec<_>, _>>()?;
        criteria.restrict(Expr::from_conjuncts(exprs), binder.into_parameters());

        if residual.is_empty() {
            tracker.mark_for_removal(index);
        } else {
            tracker.replace_with(
                index,
                IntermediateOperation::filter(Predicate::from_conjuncts(residual)),
            );
        }
        tracker.mark_merged(IntermediateKind::Filter);

        Ok(())
    }
}

///
/// SortedCriteria
///

#[derive(Clone, Copy, Debug, Default)]
pub struct SortedCriteria;

impl<E: Entity> CriteriaStrategy<E> for SortedCriteria {
    fn matches(&self, kind: IntermediateKind) -> bool {
        kind == IntermediateKind::Sorted
    }

    fn apply(
        &self,
        index: usize,
        operation: &IntermediateOperation<E>,
        criteria: &mut CriteriaQuery,
        tracker: &mut MergingTracker<E>,
    ) -> Result<(), TranslationError> {
        if criteria.is_windowed() {
            return Ok(());
        }

        let natural = Comparator::Natural;
        let comparator = operation.comparator().unwrap_or(&natural);
        if !comparator.is_pushable() {
            return Ok(());
        }

        criteria.prepend_order(translate_comparator(comparator)?);
        tracker.mark_for_removal(index);
        tracker.mark_merged(IntermediateKind::Sorted);

        Ok(())
    }
}

///
/// DistinctCriteria
///

#[derive(Clone, Copy, Debug, Default)]
pub struct DistinctCriteria;

impl<E: Entity> CriteriaStrategy<E> for DistinctCriteria {
    fn matches(&self, kind: IntermediateKind) -> bool {
        kind == IntermediateKind::Distinct
    }

    fn apply(
        &self,
        index: usize,
        operation: &IntermediateOperation<E>,
        criteria: &mut CriteriaQuery,
        tracker: &mut MergingTracker<E>,
    ) -> Result<(), TranslationError> {
        if criteria.is_windowed() || !operation.arguments().is_empty() {
            return Ok(());
        }

        // a repeated DISTINCT in the same pass is simply absorbed
        if !tracker.was_merged(IntermediateKind::Distinct) {
            criteria.set_distinct(true);
            tracker.mark_merged(IntermediateKind::Distinct);
        }
        tracker.mark_for_removal(index);

        Ok(())
    }
}

///
/// SkipQuery
/// advances the first result; an existing cap shrinks by the same amount
///

#[derive(Clone, Copy, Debug, Default)]
pub struct SkipQuery;

impl<E: Entity> QueryStrategy<E> for SkipQuery {
    fn matches(&self, kind: IntermediateKind) -> bool {
        kind == IntermediateKind::Skip
    }

    fn apply(
        &self,
        index: usize,
        operation: &IntermediateOperation<E>,
        query: &mut ExecutableQuery,
        tracker: &mut MergingTracker<E>,
    ) -> Result<(), TranslationError> {
        let Some(n) = operation.count() else {
            return Ok(());
        };

        query.set_first_result(query.first_result().saturating_add(n));
        if let Some(max) = query.max_results() {
            query.set_max_results(max.saturating_sub(n));
        }
        tracker.mark_for_removal(index);
        tracker.mark_merged(IntermediateKind::Skip);

        Ok(())
    }
}

///
/// LimitQuery
///

#[derive(Clone, Copy, Debug, Default)]
pub struct LimitQuery;

impl<E: Entity> QueryStrategy<E> for LimitQuery {
    fn matches(&self, kind: IntermediateKind) -> bool {
        kind == IntermediateKind::Limit
    }

    fn apply(
        &self,
        index: usize,
        operation: &IntermediateOperation<E>,
        query: &mut ExecutableQuery,
        tracker: &mut MergingTracker<E>,
    ) -> Result<(), TranslationError> {
        let Some(n) = operation.count() else {
            return Ok(());
        };

        let max = query.max_results().map_or(n, |current| current.min(n));
        query.set_max_results(max);
        tracker.mark_for_removal(index);
        tracker.mark_merged(IntermediateKind::Limit);

        Ok(())
    }
}
