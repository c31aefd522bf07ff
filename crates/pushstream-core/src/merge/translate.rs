//! Predicate and comparator translation into the query representation.
//!
//! Translation stages its parameter bindings in a `ParameterBinder`; callers
//! commit them to the criteria only after the whole argument translated, so
//! a failure leaves the query untouched.

use crate::{
    error::TranslationError,
    model::{Comparator, Direction, FieldOp, FieldPredicate, Predicate},
    query::{BoundPredicate, Expr, OrderTerm, QueryParameter},
    traits::Entity,
    value::Value,
};

///
/// ParameterBinder
///

pub(crate) struct ParameterBinder {
    next: usize,
    staged: Vec<QueryParameter>,
}

impl ParameterBinder {
    /// Start numbering after the `existing` parameters already committed.
    pub(crate) const fn after(existing: usize) -> Self {
        Self {
            next: existing,
            staged: Vec::new(),
        }
    }

    fn bind(&mut self, value: Value) -> String {
        self.next += 1;
        let name = format!(":p{}", self.next);
        self.staged.push(QueryParameter {
            name: name.clone(),
            value,
        });

        name
    }

    pub(crate) fn into_parameters(self) -> Vec<QueryParameter> {
        self.staged
    }
}

pub(crate) fn translate_predicate<E: Entity>(
    predicate: &Predicate<E>,
    binder: &mut ParameterBinder,
) -> Result<Expr, TranslationError> {
    Ok(match predicate {
        Predicate::True => Expr::True,
        Predicate::False => Expr::False,
        Predicate::Field(field) => Expr::Compare(translate_field::<E>(field, binder)?),
        Predicate::And(children) => Expr::And(translate_all(children, binder)?),
        Predicate::Or(children) => Expr::Or(translate_all(children, binder)?),
        Predicate::Not(inner) => Expr::Not(Box::new(translate_predicate(inner, binder)?)),
        Predicate::Opaque(_) => return Err(TranslationError::Opaque),
    })
}

fn translate_all<E: Entity>(
    children: &[Predicate<E>],
    binder: &mut ParameterBinder,
) -> Result<Vec<Expr>, TranslationError> {
    children
        .iter()
        .map(|child| translate_predicate(child, binder))
        .collect()
}

fn translate_field<E: Entity>(
    field: &FieldPredicate,
    binder: &mut ParameterBinder,
) -> Result<BoundPredicate, TranslationError> {
    let column = check_column::<E>(field.column)?;
    let op_name = field.op.name();

    let scalar = |value: &Value| {
        if value.is_null() {
            Err(TranslationError::NullLiteral {
                column,
                op: op_name,
            })
        } else {
            Ok(value.clone())
        }
    };
    let list = |values: &[Value]| {
        if values.is_empty() {
            return Err(TranslationError::EmptyList {
                column,
                op: op_name,
            });
        }
        values.iter().map(&scalar).collect::<Result<Vec<_>, _>>()
    };
    let range = |start: &Value, end: &Value| {
        if start.is_null() || end.is_null() {
            Err(TranslationError::NullBound { column })
        } else {
            Ok((start.clone(), end.clone()))
        }
    };

    let values = match &field.op {
        FieldOp::Eq(v)
        | FieldOp::Ne(v)
        | FieldOp::Lt(v)
        | FieldOp::Lte(v)
        | FieldOp::Gt(v)
        | FieldOp::Gte(v) => vec![scalar(v)?],
        FieldOp::In(values) | FieldOp::NotIn(values) => list(values)?,
        FieldOp::IsNull | FieldOp::IsNotNull => Vec::new(),
        FieldOp::StartsWith(s) => vec![Value::Text(format!("{}%", like_escape(s)))],
        FieldOp::EndsWith(s) => vec![Value::Text(format!("%{}", like_escape(s)))],
        FieldOp::Contains(s) => vec![Value::Text(format!("%{}%", like_escape(s)))],
        FieldOp::Between { start, end, .. } | FieldOp::NotBetween { start, end, .. } => {
            let (start, end) = range(start, end)?;
            vec![start, end]
        }
    };

    let parameters = values.into_iter().map(|v| binder.bind(v)).collect();

    Ok(BoundPredicate {
        predicate: field.clone(),
        parameters,
    })
}

/// Escape LIKE metacharacters so the pattern matches `text` literally.
/// Pairs with the `ESCAPE '\'` clause the query renders.
pub(crate) fn like_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }

    out
}

pub(crate) fn translate_comparator<E: Entity>(
    comparator: &Comparator<E>,
) -> Result<Vec<OrderTerm>, TranslationError> {
    match comparator {
        Comparator::Field { column, direction } => Ok(vec![OrderTerm {
            column: check_column::<E>(*column)?,
            direction: *direction,
        }]),
        Comparator::Natural => Ok(vec![OrderTerm {
            column: E::PRIMARY_KEY,
            direction: Direction::Asc,
        }]),
        Comparator::Then(keys) => {
            let mut terms = Vec::new();
            for key in keys {
                terms.extend(translate_comparator(key)?);
            }
            Ok(terms)
        }
        Comparator::Opaque(_) => Err(TranslationError::Opaque),
    }
}

fn check_column<E: Entity>(column: &'static str) -> Result<&'static str, TranslationError> {
    if E::has_column(column) {
        Ok(column)
    } else {
        Err(TranslationError::UnknownColumn {
            entity: E::ENTITY_NAME,
            column,
        })
    }
}
