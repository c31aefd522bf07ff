use crate::{
    model::{
        comparator::{Comparator, Direction},
        predicate::{FieldOp, Inclusion, Predicate},
    },
    traits::Entity,
    value::Value,
};
use std::{fmt, marker::PhantomData};

///
/// Field
///
/// Typed handle for one column of entity `E`.
/// Everything built from a `Field` is structurally translatable, which is
/// what makes it eligible for push-down.
///

pub struct Field<E> {
    column: &'static str,
    _marker: PhantomData<fn() -> E>,
}

impl<E> Field<E> {
    #[must_use]
    pub const fn new(column: &'static str) -> Self {
        Self {
            column,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn column(&self) -> &'static str {
        self.column
    }

    const fn compare(&self, op: FieldOp) -> Predicate<E> {
        Predicate::field(self.column, op)
    }

    // ------------------------------------------------------------------
    // Comparison
    // ------------------------------------------------------------------

    pub fn eq(&self, value: impl Into<Value>) -> Predicate<E> {
        self.compare(FieldOp::Eq(value.into()))
    }

    pub fn ne(&self, value: impl Into<Value>) -> Predicate<E> {
        self.compare(FieldOp::Ne(value.into()))
    }

    pub fn lt(&self, value: impl Into<Value>) -> Predicate<E> {
        self.compare(FieldOp::Lt(value.into()))
    }

    pub fn lte(&self, value: impl Into<Value>) -> Predicate<E> {
        self.compare(FieldOp::Lte(value.into()))
    }

    pub fn gt(&self, value: impl Into<Value>) -> Predicate<E> {
        self.compare(FieldOp::Gt(value.into()))
    }

    pub fn gte(&self, value: impl Into<Value>) -> Predicate<E> {
        self.compare(FieldOp::Gte(value.into()))
    }

    pub fn in_list<I, V>(&self, values: I) -> Predicate<E>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.compare(FieldOp::In(values.into_iter().map(Into::into).collect()))
    }

    pub fn not_in<I, V>(&self, values: I) -> Predicate<E>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.compare(FieldOp::NotIn(values.into_iter().map(Into::into).collect()))
    }

    #[must_use]
    pub const fn is_null(&self) -> Predicate<E> {
        self.compare(FieldOp::IsNull)
    }

    #[must_use]
    pub const fn is_not_null(&self) -> Predicate<E> {
        self.compare(FieldOp::IsNotNull)
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    pub fn starts_with(&self, prefix: impl Into<String>) -> Predicate<E> {
        self.compare(FieldOp::StartsWith(prefix.into()))
    }

    pub fn ends_with(&self, suffix: impl Into<String>) -> Predicate<E> {
        self.compare(FieldOp::EndsWith(suffix.into()))
    }

    pub fn contains(&self, needle: impl Into<String>) -> Predicate<E> {
        self.compare(FieldOp::Contains(needle.into()))
    }

    // ------------------------------------------------------------------
    // Range
    // ------------------------------------------------------------------

    /// Range with the default start-inclusive, end-exclusive policy.
    pub fn between(&self, start: impl Into<Value>, end: impl Into<Value>) -> Predicate<E> {
        self.between_with(start, end, Inclusion::default())
    }

    pub fn between_with(
        &self,
        start: impl Into<Value>,
        end: impl Into<Value>,
        inclusion: Inclusion,
    ) -> Predicate<E> {
        self.compare(FieldOp::Between {
            start: start.into(),
            end: end.into(),
            inclusion,
        })
    }

    pub fn not_between(&self, start: impl Into<Value>, end: impl Into<Value>) -> Predicate<E> {
        self.not_between_with(start, end, Inclusion::default())
    }

    pub fn not_between_with(
        &self,
        start: impl Into<Value>,
        end: impl Into<Value>,
        inclusion: Inclusion,
    ) -> Predicate<E> {
        self.compare(FieldOp::NotBetween {
            start: start.into(),
            end: end.into(),
            inclusion,
        })
    }

    // ------------------------------------------------------------------
    // Ordering
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn ascending(&self) -> Comparator<E> {
        Comparator::Field {
            column: self.column,
            direction: Direction::Asc,
        }
    }

    #[must_use]
    pub const fn descending(&self) -> Comparator<E> {
        Comparator::Field {
            column: self.column,
            direction: Direction::Desc,
        }
    }
}

impl<E: Entity> Field<E> {
    /// Read this column from a row; undefined columns read as null.
    #[must_use]
    pub fn get(&self, row: &E) -> Value {
        row.value(self.column).unwrap_or(Value::Null)
    }
}

impl<E> Clone for Field<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Field<E> {}

impl<E> fmt::Debug for Field<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field({})", self.column)
    }
}

impl<E> PartialEq for Field<E> {
    fn eq(&self, other: &Self) -> bool {
        self.column == other.column
    }
}

impl<E> Eq for Field<E> {}
