use crate::{
    model::{Closure, Comparator, Predicate},
    traits::Entity,
};
use serde::Serialize;
use std::{collections::HashSet, fmt, rc::Rc};

///
/// RowIter
/// lazy, single-pass row sequence flowing through replay
///

pub type RowIter<E> = Box<dyn Iterator<Item = E>>;

///
/// Transform
/// in-memory replay of one intermediate operation
///

pub type Transform<E> = Rc<dyn Fn(RowIter<E>) -> RowIter<E>>;

pub type Mapper<E> = Closure<dyn Fn(E) -> E>;
pub type FlatMapper<E> = Closure<dyn Fn(E) -> Vec<E>>;
pub type Action<E> = Closure<dyn Fn(&E)>;

///
/// IntermediateKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum IntermediateKind {
    Filter,
    Map,
    FlatMap,
    Peek,
    Distinct,
    Sorted,
    Limit,
    Skip,
    TakeWhile,
    DropWhile,
    Custom(&'static str),
}

impl fmt::Display for IntermediateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Filter => "FILTER",
            Self::Map => "MAP",
            Self::FlatMap => "FLAT_MAP",
            Self::Peek => "PEEK",
            Self::Distinct => "DISTINCT",
            Self::Sorted => "SORTED",
            Self::Limit => "LIMIT",
            Self::Skip => "SKIP",
            Self::TakeWhile => "TAKE_WHILE",
            Self::DropWhile => "DROP_WHILE",
            Self::Custom(name) => *name,
        };
        f.write_str(label)
    }
}

///
/// Argument
///

#[derive(Debug)]
pub enum Argument<E> {
    Predicate(Predicate<E>),
    Comparator(Comparator<E>),
    Count(u64),
    Mapper(Mapper<E>),
    FlatMapper(FlatMapper<E>),
    Action(Action<E>),
}

impl<E> Clone for Argument<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Predicate(p) => Self::Predicate(p.clone()),
            Self::Comparator(c) => Self::Comparator(c.clone()),
            Self::Count(n) => Self::Count(*n),
            Self::Mapper(f) => Self::Mapper(f.clone()),
            Self::FlatMapper(f) => Self::FlatMapper(f.clone()),
            Self::Action(f) => Self::Action(f.clone()),
        }
    }
}

impl<E> PartialEq for Argument<E> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Predicate(a), Self::Predicate(b)) => a == b,
            (Self::Comparator(a), Self::Comparator(b)) => a == b,
            (Self::Count(a), Self::Count(b)) => a == b,
            (Self::Mapper(a), Self::Mapper(b)) => a == b,
            (Self::FlatMapper(a), Self::FlatMapper(b)) => a == b,
            (Self::Action(a), Self::Action(b)) => a == b,
            _ => false,
        }
    }
}

///
/// IntermediateOperation
///
/// Kind tag, arguments, and an optional replay transform. Equality ignores
/// the transform; it is derived from the arguments for every standard kind.
///

pub struct IntermediateOperation<E> {
    kind: IntermediateKind,
    arguments: Vec<Argument<E>>,
    transform: Option<Transform<E>>,
}

impl<E> IntermediateOperation<E> {
    #[must_use]
    pub const fn kind(&self) -> IntermediateKind {
        self.kind
    }

    #[must_use]
    pub fn arguments(&self) -> &[Argument<E>] {
        &self.arguments
    }

    #[must_use]
    pub fn has_transform(&self) -> bool {
        self.transform.is_some()
    }

    /// First predicate argument, if any.
    #[must_use]
    pub fn predicate(&self) -> Option<&Predicate<E>> {
        self.arguments.iter().find_map(|arg| match arg {
            Argument::Predicate(p) => Some(p),
            _ => None,
        })
    }

    /// First comparator argument, if any.
    #[must_use]
    pub fn comparator(&self) -> Option<&Comparator<E>> {
        self.arguments.iter().find_map(|arg| match arg {
            Argument::Comparator(c) => Some(c),
            _ => None,
        })
    }

    /// First count argument, if any.
    #[must_use]
    pub fn count(&self) -> Option<u64> {
        self.arguments.iter().find_map(|arg| match arg {
            Argument::Count(n) => Some(*n),
            _ => None,
        })
    }

    /// Replay this operation over `rows`; `None` when it has no transform.
    pub fn apply(&self, rows: RowIter<E>) -> Option<RowIter<E>> {
        self.transform.as_ref().map(|transform| transform(rows))
    }

    /// Push-down-only operation; replay must never reach it.
    #[must_use]
    pub const fn custom(name: &'static str) -> Self {
        Self {
            kind: IntermediateKind::Custom(name),
            arguments: Vec::new(),
            transform: None,
        }
    }

    #[must_use]
    pub fn with_argument(mut self, argument: Argument<E>) -> Self {
        self.arguments.push(argument);
        self
    }

    #[must_use]
    pub fn with_transform(
        mut self,
        transform: impl Fn(RowIter<E>) -> RowIter<E> + 'static,
    ) -> Self {
        self.transform = Some(Rc::new(transform));
        self
    }
}

impl<E: Entity> IntermediateOperation<E> {
    fn new(kind: IntermediateKind, arguments: Vec<Argument<E>>, transform: Transform<E>) -> Self {
        Self {
            kind,
            arguments,
            transform: Some(transform),
        }
    }

    #[must_use]
    pub fn filter(predicate: Predicate<E>) -> Self {
        let keep = predicate.clone();

        Self::new(
            IntermediateKind::Filter,
            vec![Argument::Predicate(predicate)],
            replay(move |rows| {
                let keep = keep.clone();
                Box::new(rows.filter(move |row| keep.test(row)))
            }),
        )
    }

    pub fn map(f: impl Fn(E) -> E + 'static) -> Self {
        let mapper: Mapper<E> = Closure(Rc::new(f));
        let apply = mapper.clone();

        Self::new(
            IntermediateKind::Map,
            vec![Argument::Mapper(mapper)],
            replay(move |rows| {
                let apply = apply.clone();
                Box::new(rows.map(move |row| (apply.get())(row)))
            }),
        )
    }

    pub fn flat_map(f: impl Fn(E) -> Vec<E> + 'static) -> Self {
        let mapper: FlatMapper<E> = Closure(Rc::new(f));
        let apply = mapper.clone();

        Self::new(
            IntermediateKind::FlatMap,
            vec![Argument::FlatMapper(mapper)],
            replay(move |rows| {
                let apply = apply.clone();
                Box::new(rows.flat_map(move |row| (apply.get())(row)))
            }),
        )
    }

    pub fn peek(f: impl Fn(&E) + 'static) -> Self {
        let action: Action<E> = Closure(Rc::new(f));
        let apply = action.clone();

        Self::new(
            IntermediateKind::Peek,
            vec![Argument::Action(action)],
            replay(move |rows| {
                let apply = apply.clone();
                Box::new(rows.inspect(move |row| (apply.get())(row)))
            }),
        )
    }

    /// Full-row DISTINCT, keeping the first occurrence.
    #[must_use]
    pub fn distinct() -> Self {
        Self::new(
            IntermediateKind::Distinct,
            Vec::new(),
            replay(|rows| {
                let mut seen = HashSet::new();
                Box::new(rows.filter(move |row: &E| seen.insert(row.row_key())))
            }),
        )
    }

    /// Natural order (primary key ascending). Carries no argument.
    #[must_use]
    pub fn sorted() -> Self {
        Self::new(
            IntermediateKind::Sorted,
            Vec::new(),
            sort_transform(Comparator::Natural),
        )
    }

    #[must_use]
    pub fn sorted_by(comparator: Comparator<E>) -> Self {
        Self::new(
            IntermediateKind::Sorted,
            vec![Argument::Comparator(comparator.clone())],
            sort_transform(comparator),
        )
    }

    #[must_use]
    pub fn limit(n: u64) -> Self {
        let take = usize::try_from(n).unwrap_or(usize::MAX);

        Self::new(
            IntermediateKind::Limit,
            vec![Argument::Count(n)],
            replay(move |rows| Box::new(rows.take(take))),
        )
    }

    #[must_use]
    pub fn skip(n: u64) -> Self {
        let skip = usize::try_from(n).unwrap_or(usize::MAX);

        Self::new(
            IntermediateKind::Skip,
            vec![Argument::Count(n)],
            replay(move |rows| Box::new(rows.skip(skip))),
        )
    }

    #[must_use]
    pub fn take_while(predicate: Predicate<E>) -> Self {
        let keep = predicate.clone();

        Self::new(
            IntermediateKind::TakeWhile,
            vec![Argument::Predicate(predicate)],
            replay(move |rows| {
                let keep = keep.clone();
                Box::new(rows.take_while(move |row| keep.test(row)))
            }),
        )
    }

    #[must_use]
    pub fn drop_while(predicate: Predicate<E>) -> Self {
        let drop = predicate.clone();

        Self::new(
            IntermediateKind::DropWhile,
            vec![Argument::Predicate(predicate)],
            replay(move |rows| {
                let drop = drop.clone();
                Box::new(rows.skip_while(move |row| drop.test(row)))
            }),
        )
    }
}

fn replay<E>(f: impl Fn(RowIter<E>) -> RowIter<E> + 'static) -> Transform<E> {
    Rc::new(f)
}

fn sort_transform<E: Entity>(comparator: Comparator<E>) -> Transform<E> {
    replay(move |rows| {
        Box::new(SortedRows {
            source: Some(rows),
            sorted: Vec::new().into_iter(),
            comparator: comparator.clone(),
        })
    })
}

///
/// SortedRows
/// defers the (stable) sort until the first row is pulled
///

struct SortedRows<E> {
    source: Option<RowIter<E>>,
    sorted: std::vec::IntoIter<E>,
    comparator: Comparator<E>,
}

impl<E: Entity> Iterator for SortedRows<E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        if let Some(source) = self.source.take() {
            let mut rows: Vec<E> = source.collect();
            rows.sort_by(|a, b| self.comparator.compare(a, b));
            self.sorted = rows.into_iter();
        }

        self.sorted.next()
    }
}

impl<E> Clone for IntermediateOperation<E> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            arguments: self.arguments.clone(),
            transform: self.transform.clone(),
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for IntermediateOperation<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntermediateOperation")
            .field("kind", &self.kind)
            .field("arguments", &self.arguments)
            .field("replayable", &self.transform.is_some())
            .finish()
    }
}

impl<E> PartialEq for IntermediateOperation<E> {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.arguments == other.arguments
    }
}

impl<E> fmt::Display for IntermediateOperation<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind)?;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match arg {
                Argument::Predicate(p) => write!(f, "{p}")?,
                Argument::Comparator(c) => write!(f, "{c}")?,
                Argument::Count(n) => write!(f, "{n}")?,
                Argument::Mapper(_) | Argument::FlatMapper(_) | Argument::Action(_) => {
                    write!(f, "<fn>")?;
                }
            }
        }
        write!(f, ")")
    }
}

///
/// TerminalKind
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum TerminalKind {
    Count,
    FindFirst,
    FindAny,
    AnyMatch,
    AllMatch,
    NoneMatch,
    Collect,
    ForEach,
    Min,
    Max,
    Iterator,
}

impl fmt::Display for TerminalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Count => "COUNT",
            Self::FindFirst => "FIND_FIRST",
            Self::FindAny => "FIND_ANY",
            Self::AnyMatch => "ANY_MATCH",
            Self::AllMatch => "ALL_MATCH",
            Self::NoneMatch => "NONE_MATCH",
            Self::Collect => "COLLECT",
            Self::ForEach => "FOR_EACH",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Iterator => "ITERATOR",
        };
        f.write_str(label)
    }
}

///
/// TerminalOperation
///

#[derive(Debug)]
pub struct TerminalOperation<E> {
    kind: TerminalKind,
    arguments: Vec<Argument<E>>,
}

impl<E> TerminalOperation<E> {
    const fn bare(kind: TerminalKind) -> Self {
        Self {
            kind,
            arguments: Vec::new(),
        }
    }

    fn with(kind: TerminalKind, argument: Argument<E>) -> Self {
        Self {
            kind,
            arguments: vec![argument],
        }
    }

    #[must_use]
    pub const fn kind(&self) -> TerminalKind {
        self.kind
    }

    #[must_use]
    pub fn arguments(&self) -> &[Argument<E>] {
        &self.arguments
    }

    #[must_use]
    pub fn predicate(&self) -> Option<&Predicate<E>> {
        self.arguments.iter().find_map(|arg| match arg {
            Argument::Predicate(p) => Some(p),
            _ => None,
        })
    }

    #[must_use]
    pub fn comparator(&self) -> Option<&Comparator<E>> {
        self.arguments.iter().find_map(|arg| match arg {
            Argument::Comparator(c) => Some(c),
            _ => None,
        })
    }

    #[must_use]
    pub fn action(&self) -> Option<&Action<E>> {
        self.arguments.iter().find_map(|arg| match arg {
            Argument::Action(a) => Some(a),
            _ => None,
        })
    }

    #[must_use]
    pub const fn count() -> Self {
        Self::bare(TerminalKind::Count)
    }

    #[must_use]
    pub const fn find_first() -> Self {
        Self::bare(TerminalKind::FindFirst)
    }

    #[must_use]
    pub const fn find_any() -> Self {
        Self::bare(TerminalKind::FindAny)
    }

    #[must_use]
    pub const fn collect() -> Self {
        Self::bare(TerminalKind::Collect)
    }

    #[must_use]
    pub const fn iterator() -> Self {
        Self::bare(TerminalKind::Iterator)
    }

    #[must_use]
    pub fn any_match(predicate: Predicate<E>) -> Self {
        Self::with(TerminalKind::AnyMatch, Argument::Predicate(predicate))
    }

    #[must_use]
    pub fn all_match(predicate: Predicate<E>) -> Self {
        Self::with(TerminalKind::AllMatch, Argument::Predicate(predicate))
    }

    #[must_use]
    pub fn none_match(predicate: Predicate<E>) -> Self {
        Self::with(TerminalKind::NoneMatch, Argument::Predicate(predicate))
    }

    pub fn for_each(f: impl Fn(&E) + 'static) -> Self {
        Self::with(TerminalKind::ForEach, Argument::Action(Closure(Rc::new(f))))
    }

    #[must_use]
    pub fn min(comparator: Comparator<E>) -> Self {
        Self::with(TerminalKind::Min, Argument::Comparator(comparator))
    }

    #[must_use]
    pub fn max(comparator: Comparator<E>) -> Self {
        Self::with(TerminalKind::Max, Argument::Comparator(comparator))
    }
}

impl<E> Clone for TerminalOperation<E> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            arguments: self.arguments.clone(),
        }
    }
}

impl<E> PartialEq for TerminalOperation<E> {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.arguments == other.arguments
    }
}

impl<E> fmt::Display for TerminalOperation<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}
