use crate::{
    model::{FieldOp, FieldPredicate},
    traits::Entity,
    value::Value,
};
use serde::Serialize;
use std::fmt;

///
/// BoundPredicate
///
/// A translated field comparison. `predicate` keeps the literal operands so
/// stores that evaluate in process agree with replay; `parameters` names the
/// bindings a textual query refers to, in operand order.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BoundPredicate {
    pub predicate: FieldPredicate,
    pub parameters: Vec<String>,
}

///
/// Expr
/// restriction tree of a criteria query
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Expr {
    True,
    False,
    Compare(BoundPredicate),
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
}

impl Expr {
    /// Conjunction that keeps the conjunct list flat.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        let mut children = self.into_conjuncts();
        children.extend(other.into_conjuncts());

        Self::And(children)
    }

    #[must_use]
    pub fn from_conjuncts(mut children: Vec<Self>) -> Self {
        match children.len() {
            0 => Self::True,
            1 => children.remove(0),
            _ => Self::And(children),
        }
    }

    fn into_conjuncts(self) -> Vec<Self> {
        match self {
            Self::And(children) => children,
            other => vec![other],
        }
    }

    /// Two-valued evaluation over one row, sharing `FieldOp::test` with
    /// in-memory replay.
    #[must_use]
    pub fn eval<E: Entity>(&self, row: &E) -> bool {
        match self {
            Self::True => true,
            Self::False => false,
            Self::Compare(bound) => bound.predicate.test_row(row),
            Self::And(children) => children.iter().all(|c| c.eval(row)),
            Self::Or(children) => children.iter().any(|c| c.eval(row)),
            Self::Not(inner) => !inner.eval(row),
        }
    }

    /// Render with columns qualified by `alias`.
    #[must_use]
    pub const fn qualified<'a>(&'a self, alias: &'a str) -> Qualified<'a> {
        Qualified { expr: self, alias }
    }
}

///
/// Qualified
///

pub struct Qualified<'a> {
    expr: &'a Expr,
    alias: &'a str,
}

impl fmt::Display for Qualified<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alias = self.alias;
        let join = |f: &mut fmt::Formatter<'_>, children: &[Expr], sep: &str| {
            write!(f, "(")?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    write!(f, " {sep} ")?;
                }
                write!(f, "{}", child.qualified(alias))?;
            }
            write!(f, ")")
        };

        match self.expr {
            Expr::True => write!(f, "1 = 1"),
            Expr::False => write!(f, "1 = 0"),
            Expr::Compare(bound) => write_compare(f, alias, bound),
            Expr::And(children) => join(f, children, "AND"),
            Expr::Or(children) => join(f, children, "OR"),
            Expr::Not(inner) => write!(f, "NOT {}", inner.qualified(alias)),
        }
    }
}

fn write_compare(f: &mut fmt::Formatter<'_>, alias: &str, bound: &BoundPredicate) -> fmt::Result {
    let column = bound.predicate.column;
    let p = |i: usize| bound.parameters.get(i).map_or("?", String::as_str);

    match &bound.predicate.op {
        FieldOp::Eq(_) => write!(f, "{alias}.{column} = {}", p(0)),
        FieldOp::Ne(_) => write!(f, "{alias}.{column} <> {}", p(0)),
        FieldOp::Lt(_) => write!(f, "{alias}.{column} < {}", p(0)),
        FieldOp::Lte(_) => write!(f, "{alias}.{column} <= {}", p(0)),
        FieldOp::Gt(_) => write!(f, "{alias}.{column} > {}", p(0)),
        FieldOp::Gte(_) => write!(f, "{alias}.{column} >= {}", p(0)),
        FieldOp::In(_) => write!(f, "{alias}.{column} IN ({})", bound.parameters.join(", ")),
        FieldOp::NotIn(_) => {
            write!(f, "{alias}.{column} NOT IN ({})", bound.parameters.join(", "))
        }
        FieldOp::IsNull => write!(f, "{alias}.{column} IS NULL"),
        FieldOp::IsNotNull => write!(f, "{alias}.{column} IS NOT NULL"),
        FieldOp::StartsWith(_) | FieldOp::EndsWith(_) | FieldOp::Contains(_) => {
            write!(f, "{alias}.{column} LIKE {} ESCAPE '\\'", p(0))
        }
        FieldOp::Between { inclusion, .. } => {
            let lower = if inclusion.is_start_inclusive() { ">=" } else { ">" };
            let upper = if inclusion.is_end_inclusive() { "<=" } else { "<" };
            write!(
                f,
                "({alias}.{column} {lower} {} AND {alias}.{column} {upper} {})",
                p(0),
                p(1)
            )
        }
        FieldOp::NotBetween { inclusion, .. } => {
            let lower = if inclusion.is_start_inclusive() { "<" } else { "<=" };
            let upper = if inclusion.is_end_inclusive() { ">" } else { ">=" };
            write!(
                f,
                "({alias}.{column} {lower} {} OR {alias}.{column} {upper} {})",
                p(0),
                p(1)
            )
        }
    }
}

///
/// QueryParameter
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryParameter {
    pub name: String,
    pub value: Value,
}
