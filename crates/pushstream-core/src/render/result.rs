use crate::{
    error::{RenderError, TranslationError},
    model::{IntermediateKind, RowIter, TerminalKind, TerminalOperation},
    query::ExecutableQuery,
    render::terminal::{TerminalValue, evaluate},
    traits::Entity,
};
use std::fmt;

///
/// ResultSequence
///
/// Single-use output of a render call: either the lazy replayed rows or,
/// on the count fast path, just the count.
///

pub struct ResultSequence<E> {
    source: Option<Source<E>>,
}

enum Source<E> {
    Rows(RowIter<E>),
    Count(u64),
}

impl<E> ResultSequence<E> {
    pub(crate) fn rows(rows: RowIter<E>) -> Self {
        Self {
            source: Some(Source::Rows(rows)),
        }
    }

    pub(crate) const fn counted(count: u64) -> Self {
        Self {
            source: Some(Source::Count(count)),
        }
    }

    #[must_use]
    pub const fn is_consumed(&self) -> bool {
        self.source.is_none()
    }

    #[must_use]
    pub const fn is_count_only(&self) -> bool {
        matches!(self.source, Some(Source::Count(_)))
    }

    /// Take the rows; a second take is IllegalState.
    pub fn take(&mut self) -> Result<RowIter<E>, RenderError> {
        match self.source.take() {
            Some(Source::Rows(rows)) => Ok(rows),
            Some(Source::Count(count)) => {
                self.source = Some(Source::Count(count));
                Err(RenderError::unsupported(
                    "count-only result carries no rows",
                ))
            }
            None => Err(RenderError::illegal_state(
                "result sequence was already consumed",
            )),
        }
    }

    fn take_source(&mut self) -> Result<Source<E>, RenderError> {
        self.source
            .take()
            .ok_or_else(|| RenderError::illegal_state("result sequence was already consumed"))
    }
}

impl<E> fmt::Debug for ResultSequence<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.source {
            Some(Source::Rows(_)) => "rows",
            Some(Source::Count(_)) => "count",
            None => "consumed",
        };
        f.debug_struct("ResultSequence").field("state", &state).finish()
    }
}

///
/// RenderSummary
/// what one render call pushed down, replayed, and failed to translate
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderSummary {
    pub pushed: usize,
    pub replayed: usize,
    pub merged: Vec<IntermediateKind>,
    pub failures: Vec<TranslationError>,
    pub count_fast_path: bool,
    pub query: Option<ExecutableQuery>,
}

///
/// RenderResult
///
/// The result sequence paired with the terminal operation that consumes it.
///

pub struct RenderResult<E> {
    sequence: ResultSequence<E>,
    terminal: TerminalOperation<E>,
    summary: RenderSummary,
}

impl<E: Entity> RenderResult<E> {
    pub(crate) const fn new(
        sequence: ResultSequence<E>,
        terminal: TerminalOperation<E>,
        summary: RenderSummary,
    ) -> Self {
        Self {
            sequence,
            terminal,
            summary,
        }
    }

    #[must_use]
    pub const fn terminal(&self) -> &TerminalOperation<E> {
        &self.terminal
    }

    #[must_use]
    pub const fn summary(&self) -> &RenderSummary {
        &self.summary
    }

    #[must_use]
    pub const fn sequence(&self) -> &ResultSequence<E> {
        &self.sequence
    }

    /// Apply the terminal operation. Works once; the second call is
    /// IllegalState.
    pub fn execute(&mut self) -> Result<TerminalValue<E>, RenderError> {
        match self.sequence.take_source()? {
            Source::Rows(rows) => evaluate(&self.terminal, rows),
            Source::Count(count) if self.terminal.kind() == TerminalKind::Count => {
                Ok(TerminalValue::Count(count))
            }
            Source::Count(_) => Err(RenderError::illegal_state(format!(
                "count-only result cannot answer {}",
                self.terminal.kind()
            ))),
        }
    }

    /// Take the replayed rows without applying the terminal operation.
    pub fn rows(&mut self) -> Result<RowIter<E>, RenderError> {
        self.sequence.take()
    }
}

impl<E> fmt::Debug for RenderResult<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderResult")
            .field("sequence", &self.sequence)
            .field("terminal", &self.terminal.kind())
            .field("summary", &self.summary)
            .finish()
    }
}
