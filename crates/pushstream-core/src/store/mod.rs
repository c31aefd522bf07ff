//! Store execution capability.
//!
//! The renderer borrows a `QueryExecutor` for one call and never owns the
//! session behind it. `MemoryStore` is the in-process reference executor.

mod memory;


use crate::{
    error::StoreError,
    model::RowIter,
    query::{CriteriaQuery, ExecutableQuery},
    traits::Entity,
};

// re-exports
pub use memory::{MemoryStore, StoreStats};

///
/// QueryExecutor
///
/// `execute` returns a lazy row sequence for a built query; `count` answers a
/// count-only criteria without materializing rows. Errors pass through the
/// renderer untouched.
///

pub trait QueryExecutor<E: Entity> {
    fn execute(&self, query: &ExecutableQuery) -> Result<RowIter<E>, StoreError>;

    fn count(&self, criteria: &CriteriaQuery) -> Result<u64, StoreError>;
}

impl<E: Entity, X: QueryExecutor<E> + ?Sized> QueryExecutor<E> for &X {
    fn execute(&self, query: &ExecutableQuery) -> Result<RowIter<E>, StoreError> {
        (**self).execute(query)
    }

    fn count(&self, criteria: &CriteriaQuery) -> Result<u64, StoreError> {
        (**self).count(criteria)
    }
}
