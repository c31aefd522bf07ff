use super::{
    CriteriaMerger, MergeRegistry, Merger, MergingTracker, QueryMerger, QueryStrategy,
};
use crate::{
    error::TranslationError,
    model::{Field, IntermediateKind, IntermediateOperation as Op, Pipeline, Predicate},
    query::{CriteriaQuery, ExecutableQuery},
    test_fixtures::Person,
    value::Value,
};
use serde_json::json;

fn pipeline(ops: Vec<Op<Person>>) -> Pipeline<Person> {
    Pipeline::from_operations(ops)
}

fn fresh_query() -> ExecutableQuery {
    ExecutableQuery::new(CriteriaQuery::new("Person"))
}

fn merge_all(ops: Vec<Op<Person>>) -> (Pipeline<Person>, ExecutableQuery) {
    let registry = MergeRegistry::standard();
    let mut p = pipeline(ops);
    let mut query = fresh_query();
    Merger::new(&registry).merge(&mut p, &mut query);

    (p, query)
}

#[test]
fn full_prefix_is_pushed_down() {
    let (p, query) = merge_all(vec![
        Op::filter(Person::AGE.gt(20)),
        Op::sorted_by(Person::AGE.descending()),
        Op::distinct(),
        Op::skip(1),
        Op::limit(2),
    ]);

    assert!(p.is_empty());
    assert_eq!(
        query.to_string(),
        "SELECT DISTINCT p FROM Person p WHERE p.age > :p1 ORDER BY p.age DESC LIMIT 2 OFFSET 1"
    );
}

#[test]
fn criteria_pass_stops_at_skip() {
    let registry = MergeRegistry::standard();
    let mut p = pipeline(vec![
        Op::filter(Person::AGE.gt(20)),
        Op::skip(1),
        Op::filter(Person::CITY.eq("london")),
    ]);
    let mut criteria = CriteriaQuery::new("Person");

    let outcome = CriteriaMerger::new(&registry).merge(&mut p, &mut criteria);

    assert_eq!(outcome.removed, 1);
    assert_eq!(outcome.merged, vec![IntermediateKind::Filter]);
    assert_eq!(p.kinds(), vec![IntermediateKind::Skip, IntermediateKind::Filter]);
    assert_eq!(criteria.parameters().len(), 1);
}

#[test]
fn filters_after_a_window_stay_for_replay() {
    let (p, query) = merge_all(vec![Op::skip(1), Op::filter(Person::AGE.gt(20))]);

    assert_eq!(p.kinds(), vec![IntermediateKind::Filter]);
    assert!(query.criteria().restriction().is_none());
    assert_eq!(query.first_result(), 1);
    assert!(query.criteria().is_windowed());
}

#[test]
fn second_pass_is_a_noop() {
    let registry = MergeRegistry::standard();
    let merger = Merger::new(&registry);
    let mut p = pipeline(vec![
        Op::filter(Person::AGE.gt(20)),
        Op::limit(4),
        Op::filter(Person::CITY.eq("london")),
        Op::sorted(),
    ]);
    let mut query = fresh_query();

    let first = merger.merge(&mut p, &mut query);
    assert_eq!(first.removed, 2);

    let snapshot = query.clone();
    let kinds = p.kinds();
    let second = merger.merge(&mut p, &mut query);

    assert!(second.is_noop());
    assert_eq!(query, snapshot);
    assert_eq!(p.kinds(), kinds);
}

#[test]
fn skip_after_limit_shrinks_the_cap() {
    let (p, query) = merge_all(vec![Op::limit(5), Op::skip(2)]);

    assert!(p.is_empty());
    assert_eq!(query.first_result(), 2);
    assert_eq!(query.max_results(), Some(3));
    assert_eq!(query.to_string(), "SELECT p FROM Person p LIMIT 3 OFFSET 2");
}

#[test]
fn window_arithmetic_follows_operation_order() {
    let (_, query) = merge_all(vec![Op::skip(2), Op::limit(3), Op::skip(1)]);

    assert_eq!(query.first_result(), 3);
    assert_eq!(query.max_results(), Some(2));
}

#[test]
fn successive_sorts_put_the_later_key_first() {
    let (p, query) = merge_all(vec![
        Op::sorted_by(Person::CITY.ascending()),
        Op::sorted_by(Person::AGE.descending()),
    ]);

    assert!(p.is_empty());
    assert_eq!(
        query.to_string(),
        "SELECT p FROM Person p ORDER BY p.age DESC, p.city ASC"
    );
}

#[test]
fn natural_sort_orders_by_primary_key() {
    let (_, query) = merge_all(vec![Op::sorted()]);

    assert_eq!(query.to_string(), "SELECT p FROM Person p ORDER BY p.id ASC");
}

#[test]
fn opaque_conjuncts_stay_as_a_residual_filter() {
    let registry = MergeRegistry::standard();
    let opaque = Predicate::from_fn(|p: &Person| p.id % 2 == 0);
    let mut p = pipeline(vec![
        Op::filter(Person::AGE.gt(20) & opaque.clone()),
        Op::limit(1),
    ]);
    let mut query = fresh_query();

    let outcome = Merger::new(&registry).merge(&mut p, &mut query);

    assert_eq!(outcome.removed, 0);
    assert_eq!(outcome.replaced, 1);
    assert_eq!(p.operations(), &[Op::filter(opaque), Op::limit(1)]);
    assert_eq!(
        query.to_string(),
        "SELECT p FROM Person p WHERE p.age > :p1"
    );
    assert_eq!(query.max_results(), None);
}

#[test]
fn fully_opaque_filter_is_declined() {
    let registry = MergeRegistry::standard();
    let mut p = pipeline(vec![
        Op::filter(Predicate::from_fn(|p: &Person| p.id > 1)),
        Op::distinct(),
    ]);
    let mut query = fresh_query();

    let outcome = Merger::new(&registry).merge(&mut p, &mut query);

    assert!(outcome.is_noop());
    assert!(outcome.failures.is_empty());
    assert_eq!(p.len(), 2);
    assert!(!query.criteria().is_distinct());
}

#[test]
fn opaque_comparator_is_declined() {
    let registry = MergeRegistry::standard();
    let mut p = pipeline(vec![Op::sorted_by(crate::model::Comparator::from_fn(
        |a: &Person, b: &Person| a.name.cmp(&b.name),
    ))]);
    let mut criteria = CriteriaQuery::new("Person");

    let outcome = CriteriaMerger::new(&registry).merge(&mut p, &mut criteria);

    assert!(outcome.is_noop());
    assert!(criteria.order().is_empty());
}

#[test]
fn list_operands_bind_one_parameter_per_element() {
    let (_, query) = merge_all(vec![Op::filter(Person::ID.in_list([1, 2, 3]))]);
    let criteria = query.criteria();

    assert_eq!(
        criteria.to_string(),
        "SELECT p FROM Person p WHERE p.id IN (:p1, :p2, :p3)"
    );
    let values: Vec<_> = criteria.parameters().iter().map(|p| p.value.clone()).collect();
    assert_eq!(values, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn parameter_numbering_continues_across_filters() {
    let (_, query) = merge_all(vec![
        Op::filter(Person::AGE.between(18, 40)),
        Op::distinct(),
        Op::filter(Person::NAME.starts_with("a")),
    ]);
    let criteria = query.criteria();

    assert_eq!(
        criteria.to_string(),
        "SELECT DISTINCT p FROM Person p WHERE ((p.age >= :p1 AND p.age < :p2) AND p.name LIKE :p3 ESCAPE '\\')"
    );
    assert_eq!(criteria.parameters()[2].value, Value::from("a%"));
}

//
// translation failures
//

// Minimal LIKE matcher honouring `ESCAPE '\'`, standing in for a store.
fn like(pattern: &str, text: &str) -> bool {
    fn go(p: &[char], t: &[char]) -> bool {
        match p {
            [] => t.is_empty(),
            ['%', rest @ ..] => (0..=t.len()).any(|i| go(rest, &t[i..])),
            ['_', rest @ ..] => !t.is_empty() && go(rest, &t[1..]),
            ['\\', c, rest @ ..] | [c, rest @ ..] => t.first() == Some(c) && go(rest, &t[1..]),
        }
    }
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    go(&p, &t)
}

#[test]
fn text_match_patterns_escape_wildcards() {
    let (p, query) = merge_all(vec![
        Op::filter(Person::NAME.contains("a_")),
        Op::filter(Person::NAME.starts_with("50%")),
        Op::filter(Person::NAME.ends_with("\\x")),
    ]);

    assert!(p.is_empty());
    let patterns: Vec<_> = query.criteria().parameters().iter().map(|p| p.value.clone()).collect();
    assert_eq!(
        patterns,
        vec![
            Value::from("%a\\_%"),
            Value::from("50\\%%"),
            Value::from("%\\\\x"),
        ]
    );

    // The pushed pattern and in-memory replay agree on which names match.
    let Value::Text(contains) = &patterns[0] else {
        panic!("text pattern");
    };
    let replayed = Person::NAME.contains("a_");
    for name in ["ab", "xa_y", "a_", "a"] {
        let row = Person::new(1, name, None, None);
        assert_eq!(like(contains, name), replayed.test(&row), "name {name:?}");
    }
}

fn failure_of(predicate: Predicate<Person>) -> (Pipeline<Person>, CriteriaQuery, TranslationError) {
    let registry = MergeRegistry::standard();
    let mut p = pipeline(vec![
        Op::filter(Person::AGE.gt(20)),
        Op::filter(predicate),
        Op::distinct(),
    ]);
    let mut criteria = CriteriaQuery::new("Person");

    let mut outcome = CriteriaMerger::new(&registry).merge(&mut p, &mut criteria);
    assert_eq!(outcome.failures.len(), 1);
    let err = outcome.failures.remove(0);

    (p, criteria, err)
}

#[test]
fn failed_translation_is_isolated_to_its_operation() {
    let (p, criteria, err) = failure_of(Person::AGE.eq(Value::Null));

    assert_eq!(err, TranslationError::NullLiteral { column: "age", op: "eq" });
    assert_eq!(p.kinds(), vec![IntermediateKind::Filter, IntermediateKind::Distinct]);
    assert_eq!(criteria.parameters().len(), 1);
    assert!(!criteria.is_distinct());
    assert_eq!(
        criteria.to_string(),
        "SELECT p FROM Person p WHERE p.age > :p1"
    );
}

#[test]
fn unknown_column_fails_translation() {
    let salary = Field::<Person>::new("salary");
    let (_, _, err) = failure_of(salary.gt(1));

    assert_eq!(
        err,
        TranslationError::UnknownColumn {
            entity: "Person",
            column: "salary",
        }
    );
}

#[test]
fn empty_list_fails_translation() {
    let (_, _, err) = failure_of(Person::ID.in_list(Vec::<i64>::new()));

    assert_eq!(err, TranslationError::EmptyList { column: "id", op: "in" });
}

#[test]
fn null_between_bound_fails_translation() {
    let (_, _, err) = failure_of(Person::AGE.between(Value::Null, 30));

    assert_eq!(err, TranslationError::NullBound { column: "age" });
}

#[test]
fn null_inside_a_list_fails_translation() {
    let (_, _, err) = failure_of(Person::CITY.not_in([Value::from("oslo"), Value::Null]));

    assert_eq!(err, TranslationError::NullLiteral { column: "city", op: "not_in" });
}

#[test]
fn partial_conjunction_failure_commits_nothing() {
    let registry = MergeRegistry::standard();
    let mut p = pipeline(vec![Op::filter(
        Person::AGE.gt(20) & Person::ID.in_list(Vec::<i64>::new()),
    )]);
    let mut criteria = CriteriaQuery::new("Person");

    let outcome = CriteriaMerger::new(&registry).merge(&mut p, &mut criteria);

    assert_eq!(outcome.failures.len(), 1);
    assert!(criteria.restriction().is_none());
    assert!(criteria.parameters().is_empty());
    assert_eq!(p.len(), 1);
}

#[test]
fn unknown_sort_column_fails_translation() {
    let registry = MergeRegistry::standard();
    let mut p = pipeline(vec![
        Op::sorted_by(Field::<Person>::new("salary").ascending()),
        Op::distinct(),
    ]);
    let mut criteria = CriteriaQuery::new("Person");

    let outcome = CriteriaMerger::new(&registry).merge(&mut p, &mut criteria);

    assert!(matches!(
        outcome.failures.as_slice(),
        [TranslationError::UnknownColumn { column: "salary", .. }]
    ));
    assert!(criteria.order().is_empty());
    assert_eq!(p.len(), 2);
}

//
// registry
//

struct CacheableHint;

impl QueryStrategy<Person> for CacheableHint {
    fn matches(&self, kind: IntermediateKind) -> bool {
        kind == IntermediateKind::Custom("cacheable")
    }

    fn apply(
        &self,
        index: usize,
        _operation: &Op<Person>,
        query: &mut ExecutableQuery,
        tracker: &mut MergingTracker<Person>,
    ) -> Result<(), TranslationError> {
        query.set_hint("cacheable", Value::Bool(true));
        tracker.mark_for_removal(index);
        tracker.mark_merged(IntermediateKind::Custom("cacheable"));

        Ok(())
    }
}

#[test]
fn custom_kinds_register_their_own_strategy() {
    let kind = IntermediateKind::Custom("cacheable");
    let registry = MergeRegistry::standard().with_query(kind, CacheableHint);
    let mut p = pipeline(vec![Op::custom("cacheable"), Op::limit(3)]);
    let mut query = fresh_query();

    let outcome = QueryMerger::new(&registry).merge(&mut p, &mut query);

    assert!(p.is_empty());
    assert_eq!(outcome.merged, vec![IntermediateKind::Limit, kind]);
    assert_eq!(query.hints().get("cacheable"), Some(&Value::Bool(true)));
    assert_eq!(query.max_results(), Some(3));
}

#[test]
fn strategy_registered_under_a_foreign_kind_never_fires() {
    let registry = MergeRegistry::empty().with_query(IntermediateKind::Limit, CacheableHint);
    let mut p = pipeline(vec![Op::limit(3)]);
    let mut query = fresh_query();

    let outcome = QueryMerger::new(&registry).merge(&mut p, &mut query);

    assert!(outcome.is_noop());
    assert!(query.hints().is_empty());
}

#[test]
fn empty_registry_pushes_nothing() {
    let registry = MergeRegistry::empty();
    let mut p = pipeline(vec![Op::filter(Person::AGE.gt(1)), Op::limit(1)]);
    let mut query = fresh_query();

    let outcome = Merger::new(&registry).merge(&mut p, &mut query);

    assert!(outcome.is_noop());
    assert!(!registry.has_strategy(IntermediateKind::Filter));
    assert_eq!(query, fresh_query());
}

#[test]
fn tracker_replacement_and_removal_are_exclusive() {
    let mut tracker = MergingTracker::<Person>::new();
    tracker.replace_with(0, Op::limit(1));
    tracker.mark_for_removal(0);

    assert!(tracker.is_marked_for_removal(0));
    assert!(!tracker.is_replaced(0));

    let mut p = pipeline(vec![Op::skip(1), Op::skip(2), Op::skip(3)]);
    tracker.mark_for_removal(2);
    tracker.replace_with(1, Op::limit(9));
    let outcome = tracker.apply(&mut p);

    assert_eq!(outcome.removed, 2);
    assert_eq!(outcome.replaced, 1);
    assert_eq!(p.operations(), &[Op::limit(9)]);
}

//
// snapshot
//

#[test]
fn criteria_serializes_to_a_stable_shape() {
    let (_, query) = merge_all(vec![
        Op::filter(Person::AGE.gt(20)),
        Op::sorted_by(Person::AGE.descending()),
        Op::distinct(),
        Op::limit(2),
    ]);

    let snapshot = serde_json::to_value(&query).expect("serialize query");

    assert_eq!(snapshot["criteria"]["root"], json!("Person"));
    assert_eq!(snapshot["criteria"]["distinct"], json!(true));
    assert_eq!(
        snapshot["criteria"]["order"],
        json!([{ "column": "age", "direction": "Desc" }])
    );
    assert_eq!(
        snapshot["criteria"]["parameters"],
        json!([{ "name": ":p1", "value": { "Int": 20 } }])
    );
    assert_eq!(snapshot["max_results"], json!(2));
    assert_eq!(snapshot["first_result"], json!(0));
}

#[test]
fn repeated_distinct_is_absorbed_once() {
    let (p, query) = merge_all(vec![
        Op::distinct(),
        Op::filter(Person::AGE.gt(20)),
        Op::distinct(),
    ]);

    assert!(p.is_empty());
    assert_eq!(
        query.to_string(),
        "SELECT DISTINCT p FROM Person p WHERE p.age > :p1"
    );

    let mut tracker = MergingTracker::<Person>::new();
    assert!(!tracker.was_merged(IntermediateKind::Distinct));
    tracker.mark_merged(IntermediateKind::Distinct);
    assert!(tracker.was_merged(IntermediateKind::Distinct));
    assert!(!tracker.was_merged(IntermediateKind::Sorted));
}
