use crate::{
    model::{Comparator, Field, Inclusion, IntermediateOperation, Predicate, RowIter},
    traits::Entity,
    value::Value,
};
use proptest::prelude::*;

///
/// Person
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) struct Person {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) age: Option<i64>,
    pub(crate) city: Option<String>,
}

impl Person {
    pub(crate) const ID: Field<Self> = Field::new("id");
    pub(crate) const NAME: Field<Self> = Field::new("name");
    pub(crate) const AGE: Field<Self> = Field::new("age");
    pub(crate) const CITY: Field<Self> = Field::new("city");

    pub(crate) fn new(id: i64, name: &str, age: Option<i64>, city: Option<&str>) -> Self {
        Self {
            id,
            name: name.to_string(),
            age,
            city: city.map(str::to_string),
        }
    }
}

impl Entity for Person {
    const ENTITY_NAME: &'static str = "Person";
    const PRIMARY_KEY: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &["id", "name", "age", "city"];

    fn value(&self, column: &str) -> Option<Value> {
        match column {
            "id" => Some(Value::Int(self.id)),
            "name" => Some(Value::from(self.name.as_str())),
            "age" => Some(Value::from(self.age)),
            "city" => Some(Value::from(self.city.clone())),
            _ => None,
        }
    }
}

pub(crate) fn people() -> Vec<Person> {
    vec![
        Person::new(1, "ada", Some(36), Some("london")),
        Person::new(2, "bob", Some(17), Some("paris")),
        Person::new(3, "cyd", None, Some("london")),
        Person::new(4, "dee", Some(52), None),
        Person::new(5, "eve", Some(29), Some("oslo")),
        Person::new(6, "fay", Some(17), Some("paris")),
        Person::new(7, "gus", Some(64), Some("london")),
    ]
}

pub(crate) fn ids(rows: &[Person]) -> Vec<i64> {
    rows.iter().map(|p| p.id).collect()
}

/// Fixture rows plus full-row duplicates of ids 2 and 5.
pub(crate) fn people_with_duplicates() -> Vec<Person> {
    let mut rows = people();
    rows.insert(3, rows[1].clone());
    rows.push(rows[5].clone());
    rows
}

/// Reference interpreter: replay every operation, in order, in memory.
pub(crate) fn reference(operations: &[IntermediateOperation<Person>], rows: Vec<Person>) -> Vec<Person> {
    let mut iter: RowIter<Person> = Box::new(rows.into_iter());
    for op in operations {
        iter = op.apply(iter).expect("fixture operations replay");
    }
    iter.collect()
}

///
/// Strategies
///

fn arb_inclusion() -> impl Strategy<Value = Inclusion> {
    prop::sample::select(Inclusion::ALL.to_vec())
}

fn arb_city() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("london"), Just("paris"), Just("oslo"), Just("rome")]
}

pub(crate) fn arb_predicate() -> impl Strategy<Value = Predicate<Person>> {
    let leaf = prop_oneof![
        Just(Predicate::True),
        Just(Predicate::False),
        (0i64..70).prop_map(|n| Person::AGE.gt(n)),
        (0i64..70).prop_map(|n| Person::AGE.lte(n)),
        prop_oneof![Just(17i64), Just(29), Just(64)].prop_map(|n| Person::AGE.eq(n)),
        Just(Person::AGE.is_null()),
        Just(Person::CITY.is_not_null()),
        arb_city().prop_map(|c| Person::CITY.eq(c)),
        arb_city().prop_map(|c| Person::CITY.ne(c)),
        prop::collection::vec(0i64..8, 1..4).prop_map(|ids| Person::ID.in_list(ids)),
        prop::collection::vec(0i64..8, 1..4).prop_map(|ids| Person::ID.not_in(ids)),
        prop_oneof![Just("a"), Just("e"), Just("y")].prop_map(|s| Person::NAME.contains(s)),
        (0i64..40, 20i64..70, arb_inclusion())
            .prop_map(|(s, e, i)| Person::AGE.between_with(s, e, i)),
        (0i64..40, 20i64..70, arb_inclusion())
            .prop_map(|(s, e, i)| Person::AGE.not_between_with(s, e, i)),
        Just(Predicate::from_fn(|p: &Person| p.id % 2 == 0)),
        Just(Predicate::from_fn(|p: &Person| p.name.contains('e'))),
    ];

    leaf.prop_recursive(2, 12, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..3).prop_map(Predicate::And),
            prop::collection::vec(inner.clone(), 1..3).prop_map(Predicate::Or),
            inner.prop_map(|p| Predicate::Not(Box::new(p))),
        ]
    })
}

pub(crate) fn arb_comparator() -> impl Strategy<Value = Comparator<Person>> {
    let key = prop_oneof![
        Just(Person::AGE.ascending()),
        Just(Person::AGE.descending()),
        Just(Person::CITY.ascending()),
        Just(Person::CITY.descending()),
        Just(Person::NAME.descending()),
        Just(Comparator::Natural),
        Just(Comparator::from_fn(|a: &Person, b: &Person| {
            a.name.len().cmp(&b.name.len())
        })),
    ];

    prop::collection::vec(key, 1..3).prop_map(Comparator::Then)
}

pub(crate) fn arb_operation() -> impl Strategy<Value = IntermediateOperation<Person>> {
    prop_oneof![
        3 => arb_predicate().prop_map(IntermediateOperation::<Person>::filter),
        2 => (0u64..4).prop_map(IntermediateOperation::<Person>::skip),
        2 => (0u64..6).prop_map(IntermediateOperation::<Person>::limit),
        1 => Just(IntermediateOperation::limit(u64::MAX)),
        1 => Just(IntermediateOperation::distinct()),
        1 => Just(IntermediateOperation::sorted()),
        2 => arb_comparator().prop_map(IntermediateOperation::<Person>::sorted_by),
        1 => (0i64..8).prop_map(|n| IntermediateOperation::take_while(Person::ID.lt(n))),
        1 => (0i64..8).prop_map(|n| IntermediateOperation::drop_while(Person::ID.lt(n))),
        1 => Just(IntermediateOperation::map(|mut p: Person| {
            p.age = p.age.map(|a| a + 1);
            p
        })),
    ]
}

pub(crate) fn arb_operations() -> impl Strategy<Value = Vec<IntermediateOperation<Person>>> {
    prop::collection::vec(arb_operation(), 0..8)
}
