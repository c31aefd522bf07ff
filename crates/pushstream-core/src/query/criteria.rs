use crate::{
    model::Direction,
    query::{Expr, QueryParameter},
};
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// JoinType
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum JoinType {
    Inner,
    #[default]
    Left,
    Right,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inner => write!(f, "INNER"),
            Self::Left => write!(f, "LEFT"),
            Self::Right => write!(f, "RIGHT"),
        }
    }
}

///
/// Fetch
/// eager join requested by the stream configuration
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Fetch {
    pub column: &'static str,
    pub join: JoinType,
}

///
/// Selection
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub enum Selection {
    #[default]
    Root,
    Columns(Vec<&'static str>),
    Count,
}

///
/// OrderTerm
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct OrderTerm {
    pub column: &'static str,
    pub direction: Direction,
}

///
/// CriteriaQuery
///
/// Store-facing query representation: selection, fetch joins, restriction,
/// order, distinct flag, and parameter bindings. Mergers mutate it only
/// through the methods below.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CriteriaQuery {
    root: &'static str,
    alias: String,
    selection: Selection,
    fetches: Vec<Fetch>,
    restriction: Option<Expr>,
    order: Vec<OrderTerm>,
    distinct: bool,
    parameters: Vec<QueryParameter>,
    windowed: bool,
}

impl CriteriaQuery {
    #[must_use]
    pub fn new(root: &'static str) -> Self {
        let alias = root
            .chars()
            .next()
            .map_or_else(|| "e".to_string(), |c| c.to_ascii_lowercase().to_string());

        Self {
            root,
            alias,
            selection: Selection::Root,
            fetches: Vec::new(),
            restriction: None,
            order: Vec::new(),
            distinct: false,
            parameters: Vec::new(),
            windowed: false,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn root(&self) -> &'static str {
        self.root
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    #[must_use]
    pub const fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub fn fetches(&self) -> &[Fetch] {
        &self.fetches
    }

    #[must_use]
    pub const fn restriction(&self) -> Option<&Expr> {
        self.restriction.as_ref()
    }

    #[must_use]
    pub fn order(&self) -> &[OrderTerm] {
        &self.order
    }

    #[must_use]
    pub const fn is_distinct(&self) -> bool {
        self.distinct
    }

    #[must_use]
    pub fn parameters(&self) -> &[QueryParameter] {
        &self.parameters
    }

    /// True once a result window (offset or cap) applies on top of this
    /// criteria; nothing may be pushed beneath it afterwards.
    #[must_use]
    pub const fn is_windowed(&self) -> bool {
        self.windowed
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    pub fn select(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub fn fetch(&mut self, column: &'static str, join: JoinType) {
        self.fetches.push(Fetch { column, join });
    }

    /// AND `expr` into the restriction and commit its parameter bindings.
    pub fn restrict(&mut self, expr: Expr, parameters: Vec<QueryParameter>) {
        self.restriction = Some(match self.restriction.take() {
            Some(existing) => existing.and(expr),
            None => expr,
        });
        self.parameters.extend(parameters);
    }

    /// Put `terms` ahead of the existing order; a later sort dominates.
    pub fn prepend_order(&mut self, terms: Vec<OrderTerm>) {
        let existing = std::mem::replace(&mut self.order, terms);
        self.order.extend(existing);
    }

    pub const fn set_distinct(&mut self, distinct: bool) {
        self.distinct = distinct;
    }

    pub(crate) const fn mark_windowed(&mut self) {
        self.windowed = true;
    }

    /// Count-only copy: same restriction, distinct flag, and bindings.
    #[must_use]
    pub fn to_count(&self) -> Self {
        Self {
            selection: Selection::Count,
            ..self.clone()
        }
    }
}

impl fmt::Display for CriteriaQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alias = &self.alias;
        let distinct = if self.distinct { "DISTINCT " } else { "" };

        match &self.selection {
            Selection::Root => write!(f, "SELECT {distinct}{alias}")?,
            Selection::Count => write!(f, "SELECT COUNT({distinct}{alias})")?,
            Selection::Columns(columns) => {
                let list = columns
                    .iter()
                    .map(|c| format!("{alias}.{c}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "SELECT {distinct}{list}")?;
            }
        }
        write!(f, " FROM {} {alias}", self.root)?;

        for fetch in &self.fetches {
            write!(f, " {} JOIN FETCH {alias}.{}", fetch.join, fetch.column)?;
        }
        if let Some(restriction) = &self.restriction {
            write!(f, " WHERE {}", restriction.qualified(alias))?;
        }
        if !self.order.is_empty() && self.selection != Selection::Count {
            let terms = self
                .order
                .iter()
                .map(|t| format!("{alias}.{} {}", t.column, t.direction))
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, " ORDER BY {terms}")?;
        }

        Ok(())
    }
}
