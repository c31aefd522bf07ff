//! Pipeline data model: typed field handles, the predicate and comparator
//! argument shapes, intermediate/terminal operations, and the pipeline.

mod closure;
mod comparator;
mod field;
mod operation;
mod pipeline;
mod predicate;


// re-exports
pub use closure::Closure;
pub use comparator::{Comparator, Direction};
pub use field::Field;
pub use operation::{
    Action, Argument, FlatMapper, IntermediateKind, IntermediateOperation, Mapper, RowIter,
    TerminalKind, TerminalOperation, Transform,
};
pub use pipeline::{Pipeline, PipelineState};
pub use predicate::{FieldOp, FieldPredicate, Inclusion, OpaquePredicate, Predicate};
