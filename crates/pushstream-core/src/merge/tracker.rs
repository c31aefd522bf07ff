use crate::{
    error::TranslationError,
    model::{IntermediateKind, IntermediateOperation, Pipeline},
};
use std::collections::{BTreeMap, BTreeSet};

///
/// MergingTracker
///
/// Per-pass bookkeeping: which operation indices were absorbed, which were
/// partially absorbed and must be swapped for a residual, which kinds merged,
/// and which translations failed. Discarded once `apply` has run.
///

pub struct MergingTracker<E> {
    removals: BTreeSet<usize>,
    replacements: BTreeMap<usize, IntermediateOperation<E>>,
    merged: BTreeSet<IntermediateKind>,
    failures: Vec<(usize, TranslationError)>,
}

impl<E> MergingTracker<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            removals: BTreeSet::new(),
            replacements: BTreeMap::new(),
            merged: BTreeSet::new(),
            failures: Vec::new(),
        }
    }

    pub fn mark_for_removal(&mut self, index: usize) {
        self.replacements.remove(&index);
        self.removals.insert(index);
    }

    /// Keep the operation at `index` but replace it with what is left of it.
    pub fn replace_with(&mut self, index: usize, residual: IntermediateOperation<E>) {
        self.removals.remove(&index);
        self.replacements.insert(index, residual);
    }

    pub fn mark_merged(&mut self, kind: IntermediateKind) {
        self.merged.insert(kind);
    }

    pub(crate) fn record_failure(&mut self, index: usize, error: TranslationError) {
        self.failures.push((index, error));
    }

    #[must_use]
    pub fn is_marked_for_removal(&self, index: usize) -> bool {
        self.removals.contains(&index)
    }

    #[must_use]
    pub fn is_replaced(&self, index: usize) -> bool {
        self.replacements.contains_key(&index)
    }

    #[must_use]
    pub fn was_merged(&self, kind: IntermediateKind) -> bool {
        self.merged.contains(&kind)
    }

    #[must_use]
    pub fn failures(&self) -> &[(usize, TranslationError)] {
        &self.failures
    }

    /// Swap residuals in, then strip absorbed indices high-to-low.
    pub fn apply(self, pipeline: &mut Pipeline<E>) -> MergeOutcome {
        let replaced = self.replacements.len();
        for (index, residual) in self.replacements {
            pipeline.replace(index, residual);
        }

        let removed = self.removals.len();
        for index in self.removals.into_iter().rev() {
            pipeline.remove(index);
        }

        MergeOutcome {
            removed,
            replaced,
            merged: self.merged.into_iter().collect(),
            failures: self.failures.into_iter().map(|(_, err)| err).collect(),
        }
    }
}

impl<E> Default for MergingTracker<E> {
    fn default() -> Self {
        Self::new()
    }
}

///
/// MergeOutcome
/// what one merge pass did to the pipeline
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MergeOutcome {
    pub removed: usize,
    pub replaced: usize,
    pub merged: Vec<IntermediateKind>,
    pub failures: Vec<TranslationError>,
}

impl MergeOutcome {
    /// True when the pass changed neither the pipeline nor the query.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.removed == 0 && self.replaced == 0
    }
}
