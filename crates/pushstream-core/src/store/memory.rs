use crate::{
    error::StoreError,
    model::{Comparator, RowIter},
    obs::{MetricsEvent, sink::record},
    query::{CriteriaQuery, ExecutableQuery, Selection},
    store::QueryExecutor,
    traits::Entity,
};
use std::{
    cell::{Cell, RefCell},
    collections::HashSet,
};

///
/// StoreStats
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StoreStats {
    pub executions: u64,
    pub counts: u64,
}

///
/// MemoryStore
///
/// Interprets the query representation over an in-memory row set:
/// restriction, distinct, order, then the result window. Projections and
/// fetch joins are validated but whole rows are returned.
///

pub struct MemoryStore<E> {
    rows: Vec<E>,
    failure: Option<StoreError>,
    stats: Cell<StoreStats>,
    last_query: RefCell<Option<ExecutableQuery>>,
    debug: bool,
}

impl<E: Entity> MemoryStore<E> {
    #[must_use]
    pub const fn new(rows: Vec<E>) -> Self {
        Self {
            rows,
            failure: None,
            stats: Cell::new(StoreStats {
                executions: 0,
                counts: 0,
            }),
            last_query: RefCell::new(None),
            debug: false,
        }
    }

    /// Answer every call with `error`.
    #[must_use]
    pub fn failing(mut self, error: StoreError) -> Self {
        self.failure = Some(error);
        self
    }

    #[must_use]
    pub const fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    #[must_use]
    pub fn rows(&self) -> &[E] {
        &self.rows
    }

    #[must_use]
    pub fn stats(&self) -> StoreStats {
        self.stats.get()
    }

    /// The most recent query passed to `execute`.
    #[must_use]
    pub fn last_query(&self) -> Option<ExecutableQuery> {
        self.last_query.borrow().clone()
    }

    fn debug_log(&self, s: impl AsRef<str>) {
        if self.debug {
            println!("[debug] {}", s.as_ref());
        }
    }

    // ------------------------------------------------------------------
    // Plan
    // ------------------------------------------------------------------

    fn validate(&self, criteria: &CriteriaQuery) -> Result<(), StoreError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        if criteria.root() != E::ENTITY_NAME {
            return Err(StoreError::unsupported(format!(
                "store holds '{}' rows, query is rooted on '{}'",
                E::ENTITY_NAME,
                criteria.root()
            )));
        }

        let projected = match criteria.selection() {
            Selection::Columns(columns) => columns.as_slice(),
            Selection::Root | Selection::Count => &[],
        };
        let referenced = projected
            .iter()
            .chain(criteria.fetches().iter().map(|fetch| &fetch.column))
            .chain(criteria.order().iter().map(|term| &term.column));
        for column in referenced {
            if !E::has_column(column) {
                return Err(StoreError::unsupported(format!(
                    "unknown column '{column}' on '{}'",
                    E::ENTITY_NAME
                )));
            }
        }

        Ok(())
    }

    // Restriction, then distinct (first occurrence), then a stable sort.
    fn select(&self, criteria: &CriteriaQuery) -> Vec<E> {
        let mut rows: Vec<E> = self
            .rows
            .iter()
            .filter(|row| criteria.restriction().is_none_or(|expr| expr.eval(*row)))
            .cloned()
            .collect();

        if criteria.is_distinct() {
            let mut seen = HashSet::new();
            rows.retain(|row| seen.insert(row.row_key()));
        }

        if !criteria.order().is_empty() && criteria.selection() != &Selection::Count {
            let comparator = Comparator::<E>::Then(
                criteria
                    .order()
                    .iter()
                    .map(|term| Comparator::Field {
                        column: term.column,
                        direction: term.direction,
                    })
                    .collect(),
            );
            rows.sort_by(|a, b| comparator.compare(a, b));
        }

        rows
    }

    fn bump(&self, f: impl FnOnce(&mut StoreStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}

impl<E: Entity> QueryExecutor<E> for MemoryStore<E> {
    fn execute(&self, query: &ExecutableQuery) -> Result<RowIter<E>, StoreError> {
        let criteria = query.criteria();
        self.validate(criteria)?;
        self.bump(|s| s.executions += 1);
        *self.last_query.borrow_mut() = Some(query.clone());
        self.debug_log(format!("Executing {query}"));

        let rows = self.select(criteria);
        record(MetricsEvent::StoreExecution {
            entity: E::ENTITY_NAME,
            rows_scanned: self.rows.len() as u64,
        });

        let skip = usize::try_from(query.first_result()).unwrap_or(usize::MAX);
        let take = query
            .max_results()
            .map_or(usize::MAX, |max| usize::try_from(max).unwrap_or(usize::MAX));

        Ok(Box::new(rows.into_iter().skip(skip).take(take)))
    }

    fn count(&self, criteria: &CriteriaQuery) -> Result<u64, StoreError> {
        self.validate(criteria)?;
        self.bump(|s| s.counts += 1);
        self.debug_log(format!("Counting {criteria}"));

        let count = self.select(criteria).len() as u64;
        record(MetricsEvent::StoreExecution {
            entity: E::ENTITY_NAME,
            rows_scanned: self.rows.len() as u64,
        });

        Ok(count)
    }
}

impl<E: Entity> FromIterator<E> for MemoryStore<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
