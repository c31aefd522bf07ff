use crate::{
    model::Field,
    query::{JoinType, QueryHints},
    value::Value,
};
use std::fmt;

///
/// Projection
/// column subset requested for the result rows
///

pub struct Projection<E> {
    fields: Vec<Field<E>>,
}

impl<E> Projection<E> {
    pub fn of(fields: impl IntoIterator<Item = Field<E>>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn fields(&self) -> &[Field<E>] {
        &self.fields
    }

    #[must_use]
    pub fn columns(&self) -> Vec<&'static str> {
        self.fields.iter().map(Field::column).collect()
    }
}

impl<E> Clone for Projection<E> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
        }
    }
}

impl<E> fmt::Debug for Projection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.fields).finish()
    }
}

///
/// StreamConfiguration
///
/// Join, projection, and hint settings for one stream. The renderer does not
/// interpret them: joins and projection go to the criteria factory, hints go
/// to the executable query.
///

pub struct StreamConfiguration<E> {
    joins: Vec<(Field<E>, JoinType)>,
    projection: Option<Projection<E>>,
    hints: QueryHints,
}

impl<E> StreamConfiguration<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            joins: Vec::new(),
            projection: None,
            hints: QueryHints::new(),
        }
    }

    /// Fetch-join `field` with the default LEFT join.
    #[must_use]
    pub fn joining(self, field: Field<E>) -> Self {
        self.joining_with(field, JoinType::default())
    }

    #[must_use]
    pub fn joining_with(mut self, field: Field<E>, join: JoinType) -> Self {
        self.joins.push((field, join));
        self
    }

    #[must_use]
    pub fn selecting(mut self, projection: Projection<E>) -> Self {
        self.projection = Some(projection);
        self
    }

    #[must_use]
    pub fn with_hint(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.hints.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn joins(&self) -> &[(Field<E>, JoinType)] {
        &self.joins
    }

    #[must_use]
    pub const fn projection(&self) -> Option<&Projection<E>> {
        self.projection.as_ref()
    }

    #[must_use]
    pub const fn hints(&self) -> &QueryHints {
        &self.hints
    }
}

impl<E> Default for StreamConfiguration<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for StreamConfiguration<E> {
    fn clone(&self) -> Self {
        Self {
            joins: self.joins.clone(),
            projection: self.projection.clone(),
            hints: self.hints.clone(),
        }
    }
}

impl<E> fmt::Debug for StreamConfiguration<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamConfiguration")
            .field("joins", &self.joins)
            .field("projection", &self.projection)
            .field("hints", &self.hints)
            .finish()
    }
}
