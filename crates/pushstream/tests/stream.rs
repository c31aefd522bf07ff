use pushstream::{
    Error,
    core::{
        merge::MergeRegistry,
        model::RowIter,
        obs::{metrics_report, metrics_reset},
        query::{ExecutableQuery, StandardCriteriaFactory},
    },
    prelude::*,
};
use proptest::prelude::*;
use serde::Serialize;

///
/// Order
///

#[derive(Clone, Debug, PartialEq, Serialize)]
struct Order {
    id: i64,
    customer: String,
    total: i64,
    coupon: Option<String>,
}

impl Order {
    const ID: Field<Self> = Field::new("id");
    const CUSTOMER: Field<Self> = Field::new("customer");
    const TOTAL: Field<Self> = Field::new("total");
    const COUPON: Field<Self> = Field::new("coupon");

    fn new(id: i64, customer: &str, total: i64, coupon: Option<&str>) -> Self {
        Self {
            id,
            customer: customer.to_string(),
            total,
            coupon: coupon.map(str::to_string),
        }
    }
}

impl Entity for Order {
    const ENTITY_NAME: &'static str = "Order";
    const PRIMARY_KEY: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &["id", "customer", "total", "coupon"];

    fn value(&self, column: &str) -> Option<Value> {
        match column {
            "id" => Some(Value::Int(self.id)),
            "customer" => Some(Value::from(self.customer.as_str())),
            "total" => Some(Value::Int(self.total)),
            "coupon" => Some(Value::from(self.coupon.clone())),
            _ => None,
        }
    }
}

fn orders() -> Vec<Order> {
    vec![
        Order::new(1, "acme", 120, None),
        Order::new(2, "bolt", 40, Some("SPRING")),
        Order::new(3, "acme", 75, Some("SPRING")),
        Order::new(4, "core", 310, None),
        Order::new(5, "bolt", 75, None),
        Order::new(6, "acme", 15, Some("VIP")),
    ]
}

fn order_ids(rows: &[Order]) -> Vec<i64> {
    rows.iter().map(|o| o.id).collect()
}

#[test]
fn version_matches_the_workspace() {
    assert!(!pushstream::VERSION.is_empty());
}

#[test]
fn fluent_stream_pushes_down_and_replays() {
    let store = MemoryStore::new(orders());
    let renderer = Renderer::new(&store);

    let rows = renderer
        .stream()
        .filter(Order::TOTAL.between_with(40, 120, Inclusion::StartInclusiveEndInclusive))
        .sorted_by(Order::TOTAL.descending().then(Order::ID.ascending()))
        .filter(Predicate::from_fn(|o: &Order| o.customer != "core"))
        .skip(1)
        .collect()
        .expect("collect");

    assert_eq!(order_ids(&rows), vec![3, 5, 2]);
    assert_eq!(
        store.last_query().map(|q: ExecutableQuery| q.to_string()),
        Some(
            "SELECT o FROM Order o WHERE (o.total >= :p1 AND o.total <= :p2) \
             ORDER BY o.total DESC, o.id ASC"
                .to_string()
        )
    );
}

#[test]
fn count_takes_the_store_fast_path() {
    let store = MemoryStore::new(orders());
    let renderer = Renderer::new(&store);

    let count = renderer
        .stream()
        .filter(Order::COUPON.eq("SPRING"))
        .count()
        .expect("count");

    assert_eq!(count, 2);
    assert_eq!(store.stats().counts, 1);
    assert_eq!(store.stats().executions, 0);
}

#[test]
fn not_between_is_the_complement_of_between() {
    let store = MemoryStore::new(orders());
    let renderer = Renderer::new(&store);

    let inside = renderer
        .stream()
        .filter(Order::TOTAL.between(40, 120))
        .collect()
        .expect("between");
    let outside = renderer
        .stream()
        .filter(Order::TOTAL.not_between(40, 120))
        .collect()
        .expect("not between");

    assert_eq!(order_ids(&inside), vec![2, 3, 5]);
    assert_eq!(order_ids(&outside), vec![1, 4, 6]);
}

#[test]
fn configuration_loads_from_toml() {
    let config = RendererConfig::from_toml_str(
        "count_fast_path = false\n[optimizer]\nsquash = false\n",
    )
    .expect("config");
    let store = MemoryStore::new(orders());
    let renderer = Renderer::new(&store).with_config(config);

    let count = renderer
        .stream()
        .filter(Order::CUSTOMER.eq("acme"))
        .count()
        .expect("count");

    assert_eq!(count, 3);
    assert_eq!(store.stats().counts, 0);
}

#[test]
fn store_errors_pass_through_unchanged() {
    let failure = pushstream::StoreError::unavailable("replica lag");
    let store = MemoryStore::new(orders()).failing(failure.clone());
    let renderer = Renderer::new(&store);

    let err = renderer.stream().collect().expect_err("unavailable");

    assert!(matches!(err, Error::Store(ref e) if *e == failure));
    assert_eq!(err.class(), pushstream::ErrorClass::Unavailable);
}

#[test]
fn custom_registry_and_factory_plug_in() {
    let store = MemoryStore::new(orders());
    let renderer = Renderer::with_collaborators(
        StandardCriteriaFactory,
        MergeRegistry::empty(),
        &store,
    );

    let rows = renderer
        .stream()
        .filter(Order::CUSTOMER.starts_with("b"))
        .limit(1)
        .collect()
        .expect("collect");

    assert_eq!(order_ids(&rows), vec![2]);
    assert_eq!(
        store.last_query().expect("query").to_string(),
        "SELECT o FROM Order o"
    );
}

#[test]
fn metrics_count_renders_per_entity() {
    metrics_reset();
    let store = MemoryStore::new(orders());
    let renderer = Renderer::new(&store);

    renderer.stream().sorted().collect().expect("collect");
    renderer
        .stream()
        .filter(Order::ID.in_list([1, 2]))
        .count()
        .expect("count");

    let report = metrics_report();
    let order = &report.entities["Order"];
    assert_eq!(order.renders, 2);
    assert_eq!(order.count_fast_path, 1);
    assert_eq!(order.operations_pushed, 2);
    assert_eq!(order.store_executions, 2);
}

#[test]
fn rendered_rows_serialize() {
    let store = MemoryStore::new(orders());
    let renderer = Renderer::new(&store);

    let first = renderer
        .stream()
        .filter(Order::COUPON.is_null())
        .sorted_by(Order::TOTAL.descending())
        .find_first()
        .expect("find");

    let json = serde_json::to_value(first).expect("serialize");
    assert_eq!(json["id"], 4);
    assert_eq!(json["coupon"], serde_json::Value::Null);
}

///
/// Render equivalence
///

fn arb_order_operation() -> impl Strategy<Value = IntermediateOperation<Order>> {
    prop_oneof![
        (0i64..320).prop_map(|n| IntermediateOperation::filter(Order::TOTAL.gt(n))),
        prop_oneof![Just("acme"), Just("bolt"), Just("core")]
            .prop_map(|c| IntermediateOperation::filter(Order::CUSTOMER.eq(c))),
        Just(IntermediateOperation::filter(Order::COUPON.is_not_null())),
        Just(IntermediateOperation::filter(Predicate::from_fn(|o: &Order| o.id % 2 == 1))),
        Just(IntermediateOperation::sorted_by(Order::TOTAL.descending())),
        Just(IntermediateOperation::sorted()),
        Just(IntermediateOperation::distinct()),
        (0u64..4).prop_map(IntermediateOperation::skip),
        (0u64..5).prop_map(IntermediateOperation::limit),
    ]
}

fn replay_in_memory(operations: &[IntermediateOperation<Order>]) -> Vec<i64> {
    let mut rows: RowIter<Order> = Box::new(orders().into_iter());
    for op in operations {
        rows = op.apply(rows).expect("standard operations replay");
    }
    rows.map(|o| o.id).collect()
}

proptest! {
    #[test]
    fn rendered_streams_match_in_memory_replay(
        operations in prop::collection::vec(arb_order_operation(), 0..6),
    ) {
        let expected = replay_in_memory(&operations);

        let store = MemoryStore::new(orders());
        let renderer = Renderer::new(&store);
        let stream = operations
            .iter()
            .cloned()
            .fold(renderer.stream(), |stream, op| stream.operation(op));
        let counted = operations
            .iter()
            .cloned()
            .fold(renderer.stream(), |stream, op| stream.operation(op))
            .count()
            .expect("count");

        prop_assert_eq!(order_ids(&stream.collect().expect("collect")), expected.clone());
        prop_assert_eq!(counted, u64::try_from(expected.len()).expect("fits"));
    }
}
