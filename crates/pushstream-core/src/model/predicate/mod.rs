mod inclusion;


use crate::{
    model::Closure,
    traits::Entity,
    value::{Value, strict_order_cmp},
};
use serde::Serialize;
use std::{
    cmp::Ordering,
    fmt,
    ops::{BitAnd, BitOr, Not},
    rc::Rc,
};

// re-exports
pub use inclusion::Inclusion;

///
/// Predicate AST
///
/// Filter arguments are a tagged union so push-down can decide translatability
/// structurally: anything built through a typed `Field` is a `Field` leaf,
/// anything built from a closure is `Opaque` and never leaves replay.
///

///
/// FieldOp
/// operator + operand of one column comparison
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum FieldOp {
    Eq(Value),
    Ne(Value),
    Lt(Value),
    Lte(Value),
    Gt(Value),
    Gte(Value),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    IsNull,
    IsNotNull,
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    Between {
        start: Value,
        end: Value,
        inclusion: Inclusion,
    },
    NotBetween {
        start: Value,
        end: Value,
        inclusion: Inclusion,
    },
}

impl FieldOp {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Eq(_) => "eq",
            Self::Ne(_) => "ne",
            Self::Lt(_) => "lt",
            Self::Lte(_) => "lte",
            Self::Gt(_) => "gt",
            Self::Gte(_) => "gte",
            Self::In(_) => "in",
            Self::NotIn(_) => "not_in",
            Self::IsNull => "is_null",
            Self::IsNotNull => "is_not_null",
            Self::StartsWith(_) => "starts_with",
            Self::EndsWith(_) => "ends_with",
            Self::Contains(_) => "contains",
            Self::Between { .. } => "between",
            Self::NotBetween { .. } => "not_between",
        }
    }

    /// Evaluate against one column value.
    #[must_use]
    pub fn test(&self, value: &Value) -> bool {
        let ord = |rhs: &Value| strict_order_cmp(value, rhs);

        match self {
            Self::Eq(rhs) => ord(rhs) == Some(Ordering::Equal),
            Self::Ne(rhs) => matches!(ord(rhs), Some(Ordering::Less | Ordering::Greater)),
            Self::Lt(rhs) => ord(rhs) == Some(Ordering::Less),
            Self::Lte(rhs) => matches!(ord(rhs), Some(Ordering::Less | Ordering::Equal)),
            Self::Gt(rhs) => ord(rhs) == Some(Ordering::Greater),
            Self::Gte(rhs) => matches!(ord(rhs), Some(Ordering::Greater | Ordering::Equal)),
            Self::In(list) => list.iter().any(|rhs| ord(rhs) == Some(Ordering::Equal)),
            Self::NotIn(list) => {
                !value.is_null()
                    && list
                        .iter()
                        .all(|rhs| ord(rhs).is_some_and(|o| o != Ordering::Equal))
            }
            Self::IsNull => value.is_null(),
            Self::IsNotNull => !value.is_null(),
            Self::StartsWith(s) => value.as_text().is_some_and(|t| t.starts_with(s.as_str())),
            Self::EndsWith(s) => value.as_text().is_some_and(|t| t.ends_with(s.as_str())),
            Self::Contains(s) => value.as_text().is_some_and(|t| t.contains(s.as_str())),
            Self::Between {
                start,
                end,
                inclusion,
            } => inclusion.in_range(value, start, end),
            Self::NotBetween {
                start,
                end,
                inclusion,
            } => inclusion.not_in_range(value, start, end),
        }
    }

    /// Complementary operator over the same operands, when one exists.
    ///
    /// The result is the exact complement for non-null, comparable operands;
    /// null cells follow each operator's own table. Text matches have no
    /// complementary operator and come back unchanged in `Err`.
    pub fn negate(self) -> Result<Self, Self> {
        Ok(match self {
            Self::Eq(v) => Self::Ne(v),
            Self::Ne(v) => Self::Eq(v),
            Self::Lt(v) => Self::Gte(v),
            Self::Lte(v) => Self::Gt(v),
            Self::Gt(v) => Self::Lte(v),
            Self::Gte(v) => Self::Lt(v),
            Self::In(list) => Self::NotIn(list),
            Self::NotIn(list) => Self::In(list),
            Self::IsNull => Self::IsNotNull,
            Self::IsNotNull => Self::IsNull,
            Self::Between {
                start,
                end,
                inclusion,
            } => Self::NotBetween {
                start,
                end,
                inclusion,
            },
            Self::NotBetween {
                start,
                end,
                inclusion,
            } => Self::Between {
                start,
                end,
                inclusion,
            },
            other @ (Self::StartsWith(_) | Self::EndsWith(_) | Self::Contains(_)) => {
                return Err(other);
            }
        })
    }
}

///
/// FieldPredicate
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldPredicate {
    pub column: &'static str,
    pub op: FieldOp,
}

impl FieldPredicate {
    #[must_use]
    pub const fn new(column: &'static str, op: FieldOp) -> Self {
        Self { column, op }
    }

    #[must_use]
    pub fn test_value(&self, value: &Value) -> bool {
        self.op.test(value)
    }

    #[must_use]
    pub fn test_row<E: Entity>(&self, row: &E) -> bool {
        let value = row.value(self.column).unwrap_or(Value::Null);

        self.op.test(&value)
    }
}

impl fmt::Display for FieldPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let column = self.column;
        match &self.op {
            FieldOp::Eq(v) => write!(f, "{column} = {v}"),
            FieldOp::Ne(v) => write!(f, "{column} <> {v}"),
            FieldOp::Lt(v) => write!(f, "{column} < {v}"),
            FieldOp::Lte(v) => write!(f, "{column} <= {v}"),
            FieldOp::Gt(v) => write!(f, "{column} > {v}"),
            FieldOp::Gte(v) => write!(f, "{column} >= {v}"),
            FieldOp::In(list) => write!(f, "{column} IN ({})", join_values(list)),
            FieldOp::NotIn(list) => write!(f, "{column} NOT IN ({})", join_values(list)),
            FieldOp::IsNull => write!(f, "{column} IS NULL"),
            FieldOp::IsNotNull => write!(f, "{column} IS NOT NULL"),
            FieldOp::StartsWith(s) => write!(f, "{column} LIKE '{s}%'"),
            FieldOp::EndsWith(s) => write!(f, "{column} LIKE '%{s}'"),
            FieldOp::Contains(s) => write!(f, "{column} LIKE '%{s}%'"),
            FieldOp::Between {
                start,
                end,
                inclusion,
            } => write!(f, "{column} BETWEEN {start} AND {end} {inclusion}"),
            FieldOp::NotBetween {
                start,
                end,
                inclusion,
            } => write!(f, "{column} NOT BETWEEN {start} AND {end} {inclusion}"),
        }
    }
}

fn join_values(list: &[Value]) -> String {
    list.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

///
/// OpaquePredicate
/// closure-backed predicate; never translatable
///

pub type OpaquePredicate<E> = Closure<dyn Fn(&E) -> bool>;

///
/// Predicate
///

#[derive(Debug)]
pub enum Predicate<E> {
    True,
    False,
    Field(FieldPredicate),
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
    Opaque(OpaquePredicate<E>),
}

impl<E> Predicate<E> {
    pub fn from_fn(f: impl Fn(&E) -> bool + 'static) -> Self {
        Self::Opaque(Closure(Rc::new(f)))
    }

    #[must_use]
    pub const fn field(column: &'static str, op: FieldOp) -> Self {
        Self::Field(FieldPredicate::new(column, op))
    }

    /// Logical AND that keeps conjunct lists flat; `self` evaluates first.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        let mut conjuncts = self.into_conjuncts();
        conjuncts.extend(other.into_conjuncts());

        Self::And(conjuncts)
    }

    /// Split a (possibly nested) conjunction into its flat conjunct list.
    #[must_use]
    pub fn into_conjuncts(self) -> Vec<Self> {
        match self {
            Self::And(children) => children
                .into_iter()
                .flat_map(Self::into_conjuncts)
                .collect(),
            other => vec![other],
        }
    }

    /// Rebuild a predicate from conjuncts; a single conjunct stays bare.
    #[must_use]
    pub fn from_conjuncts(mut conjuncts: Vec<Self>) -> Self {
        match conjuncts.len() {
            0 => Self::True,
            1 => conjuncts.remove(0),
            _ => Self::And(conjuncts),
        }
    }

    /// True when no closure appears anywhere in the tree.
    #[must_use]
    pub fn is_pushable(&self) -> bool {
        match self {
            Self::True | Self::False | Self::Field(_) => true,
            Self::And(children) | Self::Or(children) => children.iter().all(Self::is_pushable),
            Self::Not(inner) => inner.is_pushable(),
            Self::Opaque(_) => false,
        }
    }

    /// Structural negation.
    ///
    /// Field leaves switch to their complementary operator (NOT BETWEEN ⇄
    /// BETWEEN with identical bounds and inclusion), a double negation
    /// collapses, and everything else is wrapped in `Not`.
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Not(inner) => *inner,
            Self::Field(FieldPredicate { column, op }) => match op.negate() {
                Ok(op) => Self::field(column, op),
                Err(op) => Self::Not(Box::new(Self::field(column, op))),
            },
            other => Self::Not(Box::new(other)),
        }
    }
}

impl<E: Entity> Predicate<E> {
    #[must_use]
    pub fn test(&self, row: &E) -> bool {
        match self {
            Self::True => true,
            Self::False => false,
            Self::Field(pred) => pred.test_row(row),
            Self::And(children) => children.iter().all(|p| p.test(row)),
            Self::Or(children) => children.iter().any(|p| p.test(row)),
            Self::Not(inner) => !inner.test(row),
            Self::Opaque(pred) => (pred.get())(row),
        }
    }
}

// Hand-written so `E` needs neither `Clone` nor `PartialEq`.
impl<E> Clone for Predicate<E> {
    fn clone(&self) -> Self {
        match self {
            Self::True => Self::True,
            Self::False => Self::False,
            Self::Field(field) => Self::Field(field.clone()),
            Self::And(children) => Self::And(children.clone()),
            Self::Or(children) => Self::Or(children.clone()),
            Self::Not(inner) => Self::Not(inner.clone()),
            Self::Opaque(f) => Self::Opaque(f.clone()),
        }
    }
}

impl<E> PartialEq for Predicate<E> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::True, Self::True) | (Self::False, Self::False) => true,
            (Self::Field(a), Self::Field(b)) => a == b,
            (Self::And(a), Self::And(b)) | (Self::Or(a), Self::Or(b)) => a == b,
            (Self::Not(a), Self::Not(b)) => a == b,
            (Self::Opaque(a), Self::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl<E> fmt::Display for Predicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, children: &[Self], sep: &str| {
            write!(f, "(")?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    write!(f, " {sep} ")?;
                }
                write!(f, "{child}")?;
            }
            write!(f, ")")
        };

        match self {
            Self::True => write!(f, "TRUE"),
            Self::False => write!(f, "FALSE"),
            Self::Field(pred) => write!(f, "{pred}"),
            Self::And(children) => join(f, children, "AND"),
            Self::Or(children) => join(f, children, "OR"),
            Self::Not(inner) => write!(f, "NOT {inner}"),
            Self::Opaque(_) => write!(f, "<opaque>"),
        }
    }
}

impl<E> BitAnd for Predicate<E> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl<E> BitOr for Predicate<E> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::Or(vec![self, rhs])
    }
}

impl<E> Not for Predicate<E> {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::Not(Box::new(self))
    }
}
