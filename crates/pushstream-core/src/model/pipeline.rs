use crate::{
    error::RenderError,
    model::{IntermediateKind, IntermediateOperation, TerminalOperation},
    traits::Entity,
};
use std::fmt;

///
/// PipelineState
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PipelineState {
    #[default]
    Open,
    Rendered,
    Failed,
}

///
/// Pipeline
///
/// Ordered intermediate operations plus one terminal operation, rooted on
/// entity `E`. Index-based editing performs no argument validation; the
/// sequence order is the application order.
///
/// A pipeline renders once. The renderer rewrites it in place, so callers
/// must not rely on the operation sequence surviving a render call.
///

#[derive(Clone)]
pub struct Pipeline<E> {
    root: &'static str,
    operations: Vec<IntermediateOperation<E>>,
    terminal: Option<TerminalOperation<E>>,
    state: PipelineState,
}

impl<E: Entity> Pipeline<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            root: E::ENTITY_NAME,
            operations: Vec::new(),
            terminal: None,
            state: PipelineState::Open,
        }
    }

    #[must_use]
    pub fn from_operations(operations: Vec<IntermediateOperation<E>>) -> Self {
        Self {
            operations,
            ..Self::new()
        }
    }
}

impl<E: Entity> Default for Pipeline<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Pipeline<E> {
    #[must_use]
    pub const fn root(&self) -> &'static str {
        self.root
    }

    #[must_use]
    pub fn operations(&self) -> &[IntermediateOperation<E>] {
        &self.operations
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<IntermediateKind> {
        self.operations.iter().map(IntermediateOperation::kind).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&IntermediateOperation<E>> {
        self.operations.get(index)
    }

    // ------------------------------------------------------------------
    // Sequence editing (Vec semantics; out-of-range indices panic)
    // ------------------------------------------------------------------

    pub fn append(&mut self, operation: IntermediateOperation<E>) {
        self.operations.push(operation);
    }

    pub fn prepend(&mut self, operation: IntermediateOperation<E>) {
        self.operations.insert(0, operation);
    }

    pub fn insert(&mut self, index: usize, operation: IntermediateOperation<E>) {
        self.operations.insert(index, operation);
    }

    pub fn remove(&mut self, index: usize) -> IntermediateOperation<E> {
        self.operations.remove(index)
    }

    pub fn replace(
        &mut self,
        index: usize,
        operation: IntermediateOperation<E>,
    ) -> IntermediateOperation<E> {
        std::mem::replace(&mut self.operations[index], operation)
    }

    // ------------------------------------------------------------------
    // Terminal
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn terminal(&self) -> Option<&TerminalOperation<E>> {
        self.terminal.as_ref()
    }

    /// Set the terminal operation; it can be set only once.
    pub fn set_terminal(&mut self, terminal: TerminalOperation<E>) -> Result<(), RenderError> {
        if let Some(existing) = &self.terminal {
            return Err(RenderError::illegal_state(format!(
                "terminal operation already set to {existing}"
            )));
        }
        self.terminal = Some(terminal);

        Ok(())
    }

    /// Swap the terminal operation, returning the previous one.
    pub fn replace_terminal(
        &mut self,
        terminal: TerminalOperation<E>,
    ) -> Option<TerminalOperation<E>> {
        self.terminal.replace(terminal)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn state(&self) -> PipelineState {
        self.state
    }

    pub(crate) fn begin_render(&self) -> Result<&TerminalOperation<E>, RenderError> {
        match self.state {
            PipelineState::Open => {}
            PipelineState::Rendered => {
                return Err(RenderError::illegal_state("pipeline was already rendered"));
            }
            PipelineState::Failed => {
                return Err(RenderError::illegal_state(
                    "pipeline is in a failed state after an earlier render",
                ));
            }
        }

        self.terminal
            .as_ref()
            .ok_or_else(|| RenderError::illegal_state("pipeline has no terminal operation"))
    }

    pub(crate) const fn mark(&mut self, state: PipelineState) {
        self.state = state;
    }
}

impl<E: fmt::Debug> fmt::Debug for Pipeline<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("root", &self.root)
            .field("operations", &self.operations)
            .field("terminal", &self.terminal)
            .field("state", &self.state)
            .finish()
    }
}

impl<E> fmt::Display for Pipeline<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for op in &self.operations {
            write!(f, ".{op}")?;
        }
        if let Some(terminal) = &self.terminal {
            write!(f, ".{terminal}")?;
        }
        Ok(())
    }
}
