use crate::{query::CriteriaQuery, value::Value};
use derive_more::{Deref, DerefMut};
use serde::Serialize;
use std::{collections::BTreeMap, fmt};

///
/// QueryHints
/// opaque store hints, forwarded verbatim
///

#[derive(Clone, Debug, Default, Deref, DerefMut, Eq, PartialEq, Serialize)]
pub struct QueryHints(BTreeMap<String, Value>);

impl QueryHints {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }
}

impl FromIterator<(String, Value)> for QueryHints {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

///
/// ExecutableQuery
///
/// Materialized query: the criteria plus the properties only settable at
/// execution time (result window and hints).
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExecutableQuery {
    criteria: CriteriaQuery,
    first_result: u64,
    max_results: Option<u64>,
    hints: QueryHints,
}

impl ExecutableQuery {
    #[must_use]
    pub const fn new(criteria: CriteriaQuery) -> Self {
        Self {
            criteria,
            first_result: 0,
            max_results: None,
            hints: QueryHints::new(),
        }
    }

    #[must_use]
    pub const fn criteria(&self) -> &CriteriaQuery {
        &self.criteria
    }

    pub const fn criteria_mut(&mut self) -> &mut CriteriaQuery {
        &mut self.criteria
    }

    #[must_use]
    pub const fn first_result(&self) -> u64 {
        self.first_result
    }

    #[must_use]
    pub const fn max_results(&self) -> Option<u64> {
        self.max_results
    }

    #[must_use]
    pub const fn hints(&self) -> &QueryHints {
        &self.hints
    }

    pub fn set_first_result(&mut self, first: u64) {
        self.first_result = first;
        self.criteria.mark_windowed();
    }

    pub fn set_max_results(&mut self, max: u64) {
        self.max_results = Some(max);
        self.criteria.mark_windowed();
    }

    pub fn set_hint(&mut self, name: impl Into<String>, value: Value) {
        self.hints.insert(name.into(), value);
    }

    /// Copy `hints` in; an existing hint of the same name is overwritten.
    pub fn extend_hints(&mut self, hints: &QueryHints) {
        self.hints
            .extend(hints.iter().map(|(name, value)| (name.clone(), value.clone())));
    }
}

impl fmt::Display for ExecutableQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.criteria)?;
        if let Some(max) = self.max_results {
            write!(f, " LIMIT {max}")?;
        }
        if self.first_result > 0 {
            write!(f, " OFFSET {}", self.first_result)?;
        }
        Ok(())
    }
}
