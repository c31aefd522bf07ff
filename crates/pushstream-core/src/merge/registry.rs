use crate::{
    merge::strategy::{
        CriteriaStrategy, DistinctCriteria, FilterCriteria, LimitQuery, QueryStrategy, SkipQuery,
        SortedCriteria,
    },
    model::IntermediateKind,
    traits::Entity,
};
use std::{collections::BTreeMap, fmt};

///
/// MergeRegistry
///
/// Operation kind → merge strategies. New kinds (including `Custom` ones)
/// register their strategies here; the mergers never change.
///

pub struct MergeRegistry<E> {
    criteria: BTreeMap<IntermediateKind, Vec<Box<dyn CriteriaStrategy<E>>>>,
    query: BTreeMap<IntermediateKind, Vec<Box<dyn QueryStrategy<E>>>>,
}

impl<E: Entity> MergeRegistry<E> {
    /// Registry with no strategies; nothing is pushed down.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            criteria: BTreeMap::new(),
            query: BTreeMap::new(),
        }
    }

    /// FILTER, SORTED, DISTINCT into the criteria; SKIP, LIMIT into the query.
    #[must_use]
    pub fn standard() -> Self {
        Self::empty()
            .with_criteria(IntermediateKind::Filter, FilterCriteria)
            .with_criteria(IntermediateKind::Sorted, SortedCriteria)
            .with_criteria(IntermediateKind::Distinct, DistinctCriteria)
            .with_query(IntermediateKind::Skip, SkipQuery)
            .with_query(IntermediateKind::Limit, LimitQuery)
    }

    #[must_use]
    pub fn with_criteria(
        mut self,
        kind: IntermediateKind,
        strategy: impl CriteriaStrategy<E> + 'static,
    ) -> Self {
        self.register_criteria(kind, strategy);
        self
    }

    #[must_use]
    pub fn with_query(
        mut self,
        kind: IntermediateKind,
        strategy: impl QueryStrategy<E> + 'static,
    ) -> Self {
        self.register_query(kind, strategy);
        self
    }

    pub fn register_criteria(
        &mut self,
        kind: IntermediateKind,
        strategy: impl CriteriaStrategy<E> + 'static,
    ) {
        self.criteria
            .entry(kind)
            .or_default()
            .push(Box::new(strategy));
    }

    pub fn register_query(
        &mut self,
        kind: IntermediateKind,
        strategy: impl QueryStrategy<E> + 'static,
    ) {
        self.query.entry(kind).or_default().push(Box::new(strategy));
    }
}

impl<E> MergeRegistry<E> {
    pub(crate) fn criteria_for(
        &self,
        kind: IntermediateKind,
    ) -> impl Iterator<Item = &dyn CriteriaStrategy<E>> {
        self.criteria
            .get(&kind)
            .into_iter()
            .flatten()
            .map(Box::as_ref)
            .filter(move |strategy| strategy.matches(kind))
    }

    pub(crate) fn query_for(
        &self,
        kind: IntermediateKind,
    ) -> impl Iterator<Item = &dyn QueryStrategy<E>> {
        self.query
            .get(&kind)
            .into_iter()
            .flatten()
            .map(Box::as_ref)
            .filter(move |strategy| strategy.matches(kind))
    }

    #[must_use]
    pub fn has_strategy(&self, kind: IntermediateKind) -> bool {
        self.criteria.contains_key(&kind) || self.query.contains_key(&kind)
    }
}

impl<E: Entity> Default for MergeRegistry<E> {
    fn default() -> Self {
        Self::standard()
    }
}

impl<E> fmt::Debug for MergeRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeRegistry")
            .field("criteria", &self.criteria.keys().collect::<Vec<_>>())
            .field("query", &self.query.keys().collect::<Vec<_>>())
            .finish()
    }
}
