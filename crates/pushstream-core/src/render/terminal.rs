use crate::{
    error::RenderError,
    model::{RowIter, TerminalKind, TerminalOperation},
    traits::Entity,
};
use std::{cmp::Ordering, fmt};

///
/// TerminalValue
/// outcome of applying a terminal operation to the result sequence
///

pub enum TerminalValue<E> {
    Count(u64),
    Element(Option<E>),
    Match(bool),
    Elements(Vec<E>),
    Iterator(RowIter<E>),
    Done,
}

impl<E> TerminalValue<E> {
    #[must_use]
    pub const fn as_count(&self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_match(&self) -> Option<bool> {
        match self {
            Self::Match(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_element(self) -> Option<Option<E>> {
        match self {
            Self::Element(e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_elements(self) -> Option<Vec<E>> {
        match self {
            Self::Elements(rows) => Some(rows),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_rows(self) -> Option<RowIter<E>> {
        match self {
            Self::Iterator(rows) => Some(rows),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl<E: fmt::Debug> fmt::Debug for TerminalValue<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => f.debug_tuple("Count").field(n).finish(),
            Self::Element(e) => f.debug_tuple("Element").field(e).finish(),
            Self::Match(b) => f.debug_tuple("Match").field(b).finish(),
            Self::Elements(rows) => f.debug_tuple("Elements").field(rows).finish(),
            Self::Iterator(_) => f.write_str("Iterator(..)"),
            Self::Done => f.write_str("Done"),
        }
    }
}

/// Consume `rows` with `terminal`.
///
/// MIN and MAX keep the earliest row among equals.
pub(crate) fn evaluate<E: Entity>(
    terminal: &TerminalOperation<E>,
    mut rows: RowIter<E>,
) -> Result<TerminalValue<E>, RenderError> {
    let missing = |what: &str| {
        RenderError::unsupported(format!("{} terminal without a {what}", terminal.kind()))
    };

    Ok(match terminal.kind() {
        TerminalKind::Count => TerminalValue::Count(rows.count() as u64),
        TerminalKind::FindFirst | TerminalKind::FindAny => TerminalValue::Element(rows.next()),
        TerminalKind::AnyMatch => {
            let predicate = terminal.predicate().ok_or_else(|| missing("predicate"))?;
            TerminalValue::Match(rows.any(|row| predicate.test(&row)))
        }
        TerminalKind::AllMatch => {
            let predicate = terminal.predicate().ok_or_else(|| missing("predicate"))?;
            TerminalValue::Match(rows.all(|row| predicate.test(&row)))
        }
        TerminalKind::NoneMatch => {
            let predicate = terminal.predicate().ok_or_else(|| missing("predicate"))?;
            TerminalValue::Match(!rows.any(|row| predicate.test(&row)))
        }
        TerminalKind::Collect => TerminalValue::Elements(rows.collect()),
        TerminalKind::ForEach => {
            let action = terminal.action().ok_or_else(|| missing("action"))?;
            rows.for_each(|row| (action.get())(&row));
            TerminalValue::Done
        }
        TerminalKind::Min => {
            let comparator = terminal.comparator().ok_or_else(|| missing("comparator"))?;
            TerminalValue::Element(rows.reduce(|best, row| {
                if comparator.compare(&row, &best) == Ordering::Less {
                    row
                } else {
                    best
                }
            }))
        }
        TerminalKind::Max => {
            let comparator = terminal.comparator().ok_or_else(|| missing("comparator"))?;
            TerminalValue::Element(rows.reduce(|best, row| {
                if comparator.compare(&row, &best) == Ordering::Greater {
                    row
                } else {
                    best
                }
            }))
        }
        TerminalKind::Iterator => TerminalValue::Iterator(rows),
    })
}
