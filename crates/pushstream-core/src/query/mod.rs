//! Store query representation.
//!
//! `CriteriaQuery` carries what a criteria builder can express (selection,
//! fetch joins, restriction, order, distinct, bindings); `ExecutableQuery`
//! wraps it with the execution-time window and hints.

mod criteria;
mod executable;
mod expr;


use crate::{render::StreamConfiguration, traits::Entity};

// re-exports
pub use criteria::{CriteriaQuery, Fetch, JoinType, OrderTerm, Selection};
pub use executable::{ExecutableQuery, QueryHints};
pub use expr::{BoundPredicate, Expr, QueryParameter, Qualified};

///
/// CriteriaFactory
///
/// Builds the initial criteria for a render call. Join and projection
/// settings from the stream configuration are applied here and nowhere else.
///

pub trait CriteriaFactory<E: Entity> {
    fn create(&self, configuration: &StreamConfiguration<E>) -> CriteriaQuery;
}

///
/// StandardCriteriaFactory
///

#[derive(Clone, Copy, Debug, Default)]
pub struct StandardCriteriaFactory;

impl<E: Entity> CriteriaFactory<E> for StandardCriteriaFactory {
    fn create(&self, configuration: &StreamConfiguration<E>) -> CriteriaQuery {
        let mut criteria = CriteriaQuery::new(E::ENTITY_NAME);

        if let Some(projection) = configuration.projection() {
            criteria.select(Selection::Columns(projection.columns()));
        }
        for (field, join) in configuration.joins() {
            criteria.fetch(field.column(), *join);
        }

        criteria
    }
}
