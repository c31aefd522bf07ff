//! Single-value squash: fuse runs of same-kind operations in one backward
//! pass.
//!
//! The pass walks the pipeline from the back, folding each operation of the
//! strategy's kind into a pending value and removing it. The fused operation
//! is written back immediately after the first operation of any other kind
//! (or after an argument-free marker of the same kind), and at the front when
//! the scan ends. Neutral pending values are never written back.

use crate::{
    model::{Comparator, IntermediateKind, IntermediateOperation, Pipeline, Predicate},
    traits::Entity,
};
use std::marker::PhantomData;

///
/// SingleValueSquash
///

pub trait SingleValueSquash<E> {
    type Value;

    fn kind(&self) -> IntermediateKind;

    fn neutral(&self) -> Self::Value;

    fn is_neutral(&self, value: &Self::Value) -> bool;

    /// The operation's squashable value; `None` marks an argument-free marker.
    fn extract(&self, operation: &IntermediateOperation<E>) -> Option<Self::Value>;

    /// Fold an earlier operation's value into the pending (later) value.
    fn combine(&self, earlier: Self::Value, pending: Self::Value) -> Self::Value;

    fn build(&self, value: Self::Value) -> IntermediateOperation<E>;
}

/// Run one backward squash pass of `strategy` over `pipeline`.
pub fn squash<E, S>(strategy: &S, pipeline: &mut Pipeline<E>)
where
    S: SingleValueSquash<E>,
{
    let kind = strategy.kind();
    let mut pending = strategy.neutral();

    for index in (0..pipeline.len()).rev() {
        let extracted = match pipeline.get(index) {
            Some(op) if op.kind() == kind => strategy.extract(op),
            _ => None,
        };

        match extracted {
            Some(value) => {
                pending = strategy.combine(value, pending);
                pipeline.remove(index);
            }
            None => flush(strategy, pipeline, index + 1, &mut pending),
        }
    }

    flush(strategy, pipeline, 0, &mut pending);
}

fn flush<E, S>(strategy: &S, pipeline: &mut Pipeline<E>, at: usize, pending: &mut S::Value)
where
    S: SingleValueSquash<E>,
{
    let value = std::mem::replace(pending, strategy.neutral());
    if !strategy.is_neutral(&value) {
        pipeline.insert(at, strategy.build(value));
    }
}

/// Collapse adjacent argument-free DISTINCT operations.
pub fn squash_distinct<E>(pipeline: &mut Pipeline<E>) {
    let is_distinct = |op: Option<&IntermediateOperation<E>>| {
        op.is_some_and(|op| op.kind() == IntermediateKind::Distinct && op.arguments().is_empty())
    };

    for index in (1..pipeline.len()).rev() {
        if is_distinct(pipeline.get(index)) && is_distinct(pipeline.get(index - 1)) {
            pipeline.remove(index);
        }
    }
}

///
/// SkipSquash
/// skip(a), skip(b) → skip(a + b)
///

pub struct SkipSquash<E>(PhantomData<fn() -> E>);

impl<E> SkipSquash<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E: Entity> SingleValueSquash<E> for SkipSquash<E> {
    type Value = u64;

    fn kind(&self) -> IntermediateKind {
        IntermediateKind::Skip
    }

    fn neutral(&self) -> u64 {
        0
    }

    fn is_neutral(&self, value: &u64) -> bool {
        *value == 0
    }

    fn extract(&self, operation: &IntermediateOperation<E>) -> Option<u64> {
        operation.count()
    }

    fn combine(&self, earlier: u64, pending: u64) -> u64 {
        earlier.saturating_add(pending)
    }

    fn build(&self, value: u64) -> IntermediateOperation<E> {
        IntermediateOperation::skip(value)
    }
}

///
/// LimitSquash
/// limit(a), limit(b) → limit(min(a, b))
///

pub struct LimitSquash<E>(PhantomData<fn() -> E>);

impl<E> LimitSquash<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E: Entity> SingleValueSquash<E> for LimitSquash<E> {
    type Value = u64;

    fn kind(&self) -> IntermediateKind {
        IntermediateKind::Limit
    }

    fn neutral(&self) -> u64 {
        u64::MAX
    }

    fn is_neutral(&self, value: &u64) -> bool {
        *value == u64::MAX
    }

    fn extract(&self, operation: &IntermediateOperation<E>) -> Option<u64> {
        operation.count()
    }

    fn combine(&self, earlier: u64, pending: u64) -> u64 {
        earlier.min(pending)
    }

    fn build(&self, value: u64) -> IntermediateOperation<E> {
        IntermediateOperation::limit(value)
    }
}

///
/// FilterSquash
/// filter(p1), filter(p2) → filter(p1 ∧ p2), p1 evaluated first
///

pub struct FilterSquash<E>(PhantomData<fn() -> E>);

impl<E> FilterSquash<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E: Entity> SingleValueSquash<E> for FilterSquash<E> {
    type Value = Option<Predicate<E>>;

    fn kind(&self) -> IntermediateKind {
        IntermediateKind::Filter
    }

    fn neutral(&self) -> Self::Value {
        None
    }

    fn is_neutral(&self, value: &Self::Value) -> bool {
        value.is_none()
    }

    fn extract(&self, operation: &IntermediateOperation<E>) -> Option<Self::Value> {
        operation.predicate().map(|p| Some(p.clone()))
    }

    fn combine(&self, earlier: Self::Value, pending: Self::Value) -> Self::Value {
        match (earlier, pending) {
            (Some(Predicate::True), other) | (other, Some(Predicate::True)) => {
                other.or(Some(Predicate::True))
            }
            (Some(earlier), Some(pending)) => Some(earlier.and(pending)),
            (earlier, None) => earlier,
            (None, pending) => pending,
        }
    }

    fn build(&self, value: Self::Value) -> IntermediateOperation<E> {
        IntermediateOperation::filter(value.unwrap_or(Predicate::True))
    }
}

///
/// SortedSquash
/// sorted(c1), sorted(c2) → sorted(c2 then c1); sorted() is the marker
///

pub struct SortedSquash<E>(PhantomData<fn() -> E>);

impl<E> SortedSquash<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E: Entity> SingleValueSquash<E> for SortedSquash<E> {
    type Value = Option<Comparator<E>>;

    fn kind(&self) -> IntermediateKind {
        IntermediateKind::Sorted
    }

    fn neutral(&self) -> Self::Value {
        None
    }

    fn is_neutral(&self, value: &Self::Value) -> bool {
        value.is_none()
    }

    fn extract(&self, operation: &IntermediateOperation<E>) -> Option<Self::Value> {
        operation.comparator().map(|c| Some(c.clone()))
    }

    // A later stable sort dominates; the earlier key only breaks its ties.
    fn combine(&self, earlier: Self::Value, pending: Self::Value) -> Self::Value {
        match (earlier, pending) {
            (Some(earlier), Some(pending)) => Some(pending.then(earlier)),
            (earlier, None) => earlier,
            (None, pending) => pending,
        }
    }

    fn build(&self, value: Self::Value) -> IntermediateOperation<E> {
        value.map_or_else(IntermediateOperation::sorted, IntermediateOperation::sorted_by)
    }
}
