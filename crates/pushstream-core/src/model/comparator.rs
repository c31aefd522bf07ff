use crate::{
    model::Closure,
    traits::Entity,
    value::{Value, canonical_cmp},
};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt, rc::Rc};

///
/// Direction
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    #[must_use]
    pub const fn apply(self, ord: Ordering) -> Ordering {
        match self {
            Self::Asc => ord,
            Self::Desc => ord.reverse(),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "ASC"),
            Self::Desc => write!(f, "DESC"),
        }
    }
}

///
/// Comparator
///
/// Sort key for SORTED and MIN/MAX. Column keys use the canonical value
/// order (NULL first when ascending) on both sides of the push-down
/// boundary; `Natural` is primary-key ascending.
///

#[derive(Debug)]
pub enum Comparator<E> {
    Field {
        column: &'static str,
        direction: Direction,
    },
    Natural,
    Then(Vec<Self>),
    Opaque(Closure<dyn Fn(&E, &E) -> Ordering>),
}

impl<E> Comparator<E> {
    pub fn from_fn(f: impl Fn(&E, &E) -> Ordering + 'static) -> Self {
        Self::Opaque(Closure(Rc::new(f)))
    }

    /// Lexicographic composition: `self` first, `other` breaks ties.
    #[must_use]
    pub fn then(self, other: Self) -> Self {
        let mut keys = self.into_keys();
        keys.extend(other.into_keys());

        Self::Then(keys)
    }

    /// Flatten nested `Then` chains into the ordered key list.
    #[must_use]
    pub fn into_keys(self) -> Vec<Self> {
        match self {
            Self::Then(keys) => keys.into_iter().flat_map(Self::into_keys).collect(),
            other => vec![other],
        }
    }

    #[must_use]
    pub fn is_pushable(&self) -> bool {
        match self {
            Self::Field { .. } | Self::Natural => true,
            Self::Then(keys) => keys.iter().all(Self::is_pushable),
            Self::Opaque(_) => false,
        }
    }
}

impl<E: Entity> Comparator<E> {
    #[must_use]
    pub fn compare(&self, left: &E, right: &E) -> Ordering {
        match self {
            Self::Field { column, direction } => {
                direction.apply(canonical_cmp(&read(left, column), &read(right, column)))
            }
            Self::Natural => canonical_cmp(
                &read(left, E::PRIMARY_KEY),
                &read(right, E::PRIMARY_KEY),
            ),
            Self::Then(keys) => keys
                .iter()
                .map(|key| key.compare(left, right))
                .find(|ord| ord.is_ne())
                .unwrap_or(Ordering::Equal),
            Self::Opaque(f) => (f.get())(left, right),
        }
    }
}

fn read<E: Entity>(row: &E, column: &str) -> Value {
    row.value(column).unwrap_or(Value::Null)
}

impl<E> Clone for Comparator<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Field { column, direction } => Self::Field {
                column: *column,
                direction: *direction,
            },
            Self::Natural => Self::Natural,
            Self::Then(keys) => Self::Then(keys.clone()),
            Self::Opaque(f) => Self::Opaque(f.clone()),
        }
    }
}

impl<E> PartialEq for Comparator<E> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Field { column, direction },
                Self::Field {
                    column: other_column,
                    direction: other_direction,
                },
            ) => column == other_column && direction == other_direction,
            (Self::Natural, Self::Natural) => true,
            (Self::Then(a), Self::Then(b)) => a == b,
            (Self::Opaque(a), Self::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl<E> fmt::Display for Comparator<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field { column, direction } => write!(f, "{column} {direction}"),
            Self::Natural => write!(f, "<natural>"),
            Self::Then(keys) => {
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}")?;
                }
                Ok(())
            }
            Self::Opaque(_) => write!(f, "<opaque>"),
        }
    }
}
