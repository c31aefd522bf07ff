use crate::{
    model::{IntermediateOperation, Pipeline, Predicate, TerminalKind},
    traits::Entity,
};

/// Expose short-circuiting terminals to push-down.
///
/// FIND_FIRST / FIND_ANY need one row; ANY_MATCH and NONE_MATCH need the first
/// row satisfying the predicate; ALL_MATCH needs the first counterexample.
/// Terminal evaluation over the reduced sequence gives the same answer.
pub fn optimize_terminal<E: Entity>(pipeline: &mut Pipeline<E>) {
    let Some(terminal) = pipeline.terminal() else {
        return;
    };

    let filter = match terminal.kind() {
        TerminalKind::FindFirst | TerminalKind::FindAny => None,
        TerminalKind::AnyMatch | TerminalKind::NoneMatch => match terminal.predicate() {
            Some(predicate) => Some(predicate.clone()),
            None => return,
        },
        // `Not` is the exact complement; operator negation differs on nulls.
        TerminalKind::AllMatch => match terminal.predicate() {
            Some(predicate) => Some(Predicate::Not(Box::new(predicate.clone()))),
            None => return,
        },
        _ => return,
    };

    if let Some(predicate) = filter {
        pipeline.append(IntermediateOperation::filter(predicate));
    }
    pipeline.append(IntermediateOperation::limit(1));
}
