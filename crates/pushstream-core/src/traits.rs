use crate::value::Value;
use std::fmt::Debug;

///
/// Entity
///
/// A persistent record type that pipelines can be rooted on.
/// `value` is the single column-read path shared by in-memory replay and the
/// store's evaluation of pushed-down predicates, so both agree bit-for-bit.
///

pub trait Entity: Clone + Debug + 'static {
    const ENTITY_NAME: &'static str;
    const PRIMARY_KEY: &'static str;
    const COLUMNS: &'static [&'static str];

    /// Read one column; `None` when the column is not defined.
    fn value(&self, column: &str) -> Option<Value>;

    /// Full-row identity used by DISTINCT.
    fn row_key(&self) -> Vec<Value> {
        Self::COLUMNS
            .iter()
            .map(|column| self.value(column).unwrap_or(Value::Null))
            .collect()
    }

    #[must_use]
    fn has_column(column: &str) -> bool {
        Self::COLUMNS.contains(&column)
    }
}
