use super::{
    FilterSquash, LimitSquash, PipelineOptimizer, SkipSquash, SortedSquash, optimize_terminal,
    squash, squash_distinct,
};
use crate::{
    config::OptimizerConfig,
    model::{
        IntermediateKind, IntermediateOperation as Op, Pipeline, Predicate, TerminalOperation,
    },
    test_fixtures::{
        Person, arb_operations, ids, people, people_with_duplicates, reference,
    },
};
use proptest::prelude::*;

fn pipeline(ops: Vec<Op<Person>>) -> Pipeline<Person> {
    Pipeline::from_operations(ops)
}

fn squashed(ops: Vec<Op<Person>>) -> Vec<Op<Person>> {
    let mut p = pipeline(ops);
    PipelineOptimizer::squash_to_fixpoint(&mut p);
    p.operations().to_vec()
}

#[test]
fn skip_runs_sum() {
    assert_eq!(squashed(vec![Op::skip(2), Op::skip(3)]), vec![Op::skip(5)]);
}

#[test]
fn skip_sum_saturates() {
    assert_eq!(
        squashed(vec![Op::skip(u64::MAX), Op::skip(3)]),
        vec![Op::skip(u64::MAX)]
    );
}

#[test]
fn limit_runs_take_the_minimum() {
    assert_eq!(
        squashed(vec![Op::limit(9), Op::limit(4), Op::limit(7)]),
        vec![Op::limit(4)]
    );
}

#[test]
fn filter_runs_and_their_predicates_in_order() {
    let a = Person::AGE.gt(20);
    let b = Person::CITY.eq("london");

    let out = squashed(vec![Op::filter(a.clone()), Op::filter(b.clone())]);

    assert_eq!(out, vec![Op::filter(Predicate::And(vec![a.clone(), b.clone()]))]);

    let fused = out[0].predicate().expect("fused filter").clone();
    for row in people() {
        assert_eq!(fused.test(&row), a.test(&row) && b.test(&row));
    }
}

#[test]
fn literal_filter_skip_regression() {
    let out = squashed(vec![
        Op::filter(Predicate::True),
        Op::filter(Predicate::True),
        Op::skip(1),
        Op::filter(Predicate::True),
        Op::filter(Predicate::False),
    ]);

    assert_eq!(
        out,
        vec![
            Op::filter(Predicate::True),
            Op::skip(1),
            Op::filter(Predicate::False),
        ]
    );
}

#[test]
fn lone_skip_is_unchanged() {
    assert_eq!(squashed(vec![Op::skip(1)]), vec![Op::skip(1)]);
}

#[test]
fn neutral_runs_disappear() {
    assert_eq!(squashed(vec![Op::skip(0), Op::limit(u64::MAX)]), Vec::new());
}

#[test]
fn removed_neutral_run_lets_neighbours_fuse() {
    let out = squashed(vec![Op::skip(1), Op::limit(u64::MAX), Op::skip(2)]);

    assert_eq!(out, vec![Op::skip(3)]);
}

#[test]
fn order_sensitive_kinds_are_not_reordered() {
    let ops = vec![Op::skip(2), Op::limit(3), Op::skip(1), Op::distinct(), Op::limit(1)];

    assert_eq!(squashed(ops.clone()), ops);
}

#[test]
fn fusion_happens_within_runs_only() {
    let out = squashed(vec![
        Op::limit(5),
        Op::skip(1),
        Op::skip(2),
        Op::filter(Person::AGE.gt(1)),
        Op::limit(9),
        Op::limit(2),
    ]);

    assert_eq!(
        out,
        vec![
            Op::limit(5),
            Op::skip(3),
            Op::filter(Person::AGE.gt(1)),
            Op::limit(2),
        ]
    );
}

#[test]
fn sorted_runs_compose_later_key_first() {
    let earlier = Person::NAME.descending();
    let later = Person::AGE.ascending();

    let out = squashed(vec![Op::sorted_by(earlier.clone()), Op::sorted_by(later.clone())]);

    assert_eq!(out, vec![Op::sorted_by(later.then(earlier))]);
}

// The natural `sorted()` marker flushes whatever is pending after it and
// restarts the run, so comparators on either side are never fused across it.
#[test]
fn natural_sorted_marker_splits_runs() {
    let c1 = Person::AGE.ascending();
    let c2 = Person::NAME.ascending();
    let ops = vec![Op::sorted_by(c1), Op::sorted(), Op::sorted_by(c2)];

    assert_eq!(squashed(ops.clone()), ops);
}

#[test]
fn marker_flushes_pending_after_itself() {
    let mut p = pipeline(vec![
        Op::sorted(),
        Op::sorted_by(Person::AGE.ascending()),
        Op::sorted_by(Person::NAME.ascending()),
    ]);
    squash(&SortedSquash::new(), &mut p);

    assert_eq!(
        p.operations(),
        &[
            Op::sorted(),
            Op::sorted_by(Person::NAME.ascending().then(Person::AGE.ascending())),
        ]
    );
}

#[test]
fn adjacent_distinct_collapses() {
    let mut p = pipeline(vec![
        Op::distinct(),
        Op::distinct(),
        Op::skip(1),
        Op::distinct(),
        Op::distinct(),
        Op::distinct(),
    ]);
    squash_distinct(&mut p);

    assert_eq!(
        p.kinds(),
        vec![
            IntermediateKind::Distinct,
            IntermediateKind::Skip,
            IntermediateKind::Distinct
        ]
    );
}

#[test]
fn single_passes_touch_only_their_kind() {
    let ops = vec![Op::skip(1), Op::skip(1), Op::limit(3), Op::limit(2)];

    let mut p = pipeline(ops.clone());
    squash(&FilterSquash::new(), &mut p);
    assert_eq!(p.operations(), ops.as_slice());

    squash(&SkipSquash::new(), &mut p);
    assert_eq!(p.operations(), &[Op::skip(2), Op::limit(3), Op::limit(2)]);

    squash(&LimitSquash::new(), &mut p);
    assert_eq!(p.operations(), &[Op::skip(2), Op::limit(2)]);
}

#[test]
fn find_first_appends_limit_one() {
    let mut p = pipeline(vec![Op::skip(2)]);
    p.set_terminal(TerminalOperation::find_first())
        .expect("terminal");
    optimize_terminal(&mut p);

    assert_eq!(p.operations(), &[Op::skip(2), Op::limit(1)]);
}

#[test]
fn match_terminals_append_filter_and_limit() {
    let pred = Person::CITY.eq("oslo");

    let mut any = pipeline(Vec::new());
    any.set_terminal(TerminalOperation::any_match(pred.clone()))
        .expect("terminal");
    optimize_terminal(&mut any);
    assert_eq!(
        any.operations(),
        &[Op::filter(pred.clone()), Op::limit(1)]
    );

    let mut all = pipeline(Vec::new());
    all.set_terminal(TerminalOperation::all_match(pred.clone()))
        .expect("terminal");
    optimize_terminal(&mut all);
    assert_eq!(
        all.operations(),
        &[Op::filter(Predicate::Not(Box::new(pred))), Op::limit(1)]
    );
}

#[test]
fn count_and_collect_are_left_alone() {
    for terminal in [TerminalOperation::count(), TerminalOperation::collect()] {
        let mut p = pipeline(vec![Op::distinct()]);
        p.set_terminal(terminal).expect("terminal");
        optimize_terminal(&mut p);

        assert_eq!(p.len(), 1);
    }
}

#[test]
fn disabled_optimizer_leaves_pipeline_untouched() {
    let mut p = pipeline(vec![Op::skip(1), Op::skip(1)]);
    p.set_terminal(TerminalOperation::find_first())
        .expect("terminal");

    PipelineOptimizer::new(OptimizerConfig::disabled()).optimize(&mut p);

    assert_eq!(p.operations(), &[Op::skip(1), Op::skip(1)]);
}

#[test]
fn default_optimizer_runs_terminal_then_squash() {
    let mut p = pipeline(vec![Op::limit(3)]);
    p.set_terminal(TerminalOperation::find_any())
        .expect("terminal");

    PipelineOptimizer::default().optimize(&mut p);

    assert_eq!(p.operations(), &[Op::limit(1)]);
    assert_eq!(ids(&reference(p.operations(), people())), vec![1]);
}

proptest! {
    #[test]
    fn squash_preserves_replay_result(ops in arb_operations()) {
        let expected = reference(&ops, people_with_duplicates());
        let out = squashed(ops);

        prop_assert_eq!(ids(&reference(&out, people_with_duplicates())), ids(&expected));
    }

    #[test]
    fn squash_is_idempotent(ops in arb_operations()) {
        let once = squashed(ops);
        let twice = squashed(once.clone());

        prop_assert_eq!(twice, once);
    }

    #[test]
    fn squash_never_grows_the_pipeline(ops in arb_operations()) {
        let len = ops.len();

        prop_assert!(squashed(ops).len() <= len);
    }
}
