mod common;

use common::*;
use contingency::{Error, ErrorKind, IntoKey, Key, Table, Value};

#[test]
fn missing_keys_read_as_zero() {
    let table = sample_1_named(["X1", "X2", "X3", "X4"]);
    assert_eq!(table.get(("b", "y", 2, 33)), 0.0);
    assert_eq!(table.probability(("b", "y", 2, 33)), 0.0);
    assert_eq!(table.get(("c", "y", 2, 33)), 0.0);
    assert!(!table.contains(("b", "y", 2, 33)));
    assert_eq!(table.len(), 15);
}

#[test]
fn synthesized_names() {
    let table = sample_1();
    assert_eq!(table.names(), ["X1", "X2", "X3", "X4"]);
    assert_eq!(table.arity(), 4);
    assert_eq!(table.columns().index_of("X3"), Some(2));
    assert_eq!(table.columns().index_of("X5"), None);
}

#[test]
fn single_column_keys_are_scalars() {
    let table = Table::new(vec![("A", 3.0), ("B", 4.0), ("C", 7.0)]).unwrap();
    assert_eq!(table.names(), ["X1"]);
    assert_eq!(table.get("B"), 4.0);
    assert_eq!(table.get(("B",)), 4.0);
    assert_eq!(table.get(vec!["B"]), 4.0);
    assert_eq!(table.get(Key::new(vec![Value::from("B")])), 4.0);
}

#[test]
fn rows_must_agree_on_arity() {
    let rows = vec![(vec!["a", "x"], 1.0), (vec!["a"], 2.0)];
    assert_eq!(
        Table::new(rows),
        Err(Error::Arity {
            expected: 2,
            got: 1
        })
    );
}

#[test]
fn names_must_be_unique() {
    assert_eq!(
        Table::with_names(vec![(("a", 1), 1.0)], vec!["A", "A"]),
        Err(Error::DuplicateColumn("A".to_string()))
    );
}

#[test]
fn keys_by_position_and_name() {
    let table = sample_1();
    let positional = [Value::from("a"), Value::from(1)];
    let named = [("X2", Value::from("y")), ("X4", Value::from(33))];
    assert_eq!(table.get_by(&positional, &named), Ok(5.0));

    let named = [("X4", Value::from(44)), ("X1", Value::from("b"))];
    let positional = [Value::from("x"), Value::from(2)];
    assert_eq!(table.get_by(&positional, &named), Ok(12.0));

    let all_named = [
        ("X3", Value::from(1)),
        ("X1", Value::from("b")),
        ("X4", Value::from(44)),
        ("X2", Value::from("y")),
    ];
    assert_eq!(table.get_by(&[], &all_named), Ok(15.0));
}

#[test]
fn keys_with_wrong_arity_are_rejected() {
    let table = sample_1();
    let err = table
        .get_by(&[Value::from("a")], &[("X2", Value::from("y"))])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Arity);

    let err = table
        .get_by(
            &[Value::from("a"), Value::from("x"), Value::from(1)],
            &[("X9", Value::from(33))],
        )
        .unwrap_err();
    assert_eq!(err, Error::UnknownColumn("X9".to_string()));
}

#[test]
fn named_keys() {
    let table = sample_1_named(["Sex", "Group", "Dose", "Age"]);
    let key = ("a", "y", 2, 44).into_key();
    let named = table.named_key(&key);
    assert_eq!(named[0], ("Sex", &Value::from("a")));
    assert_eq!(named[3], ("Age", &Value::from(44)));
}

#[test]
fn levels() {
    let table = sample_2_named(["X1", "X2", "X3", "X4"]);
    let levels: Vec<Value> = table.levels("X3").unwrap().into_iter().collect();
    assert_eq!(
        levels,
        [
            Value::from("normal"),
            Value::from("obese"),
            Value::from("over"),
            Value::from("under")
        ]
    );
    assert_eq!(table.levels("X1").unwrap().len(), 2);
    assert_eq!(
        table.levels("Y"),
        Err(Error::UnknownColumn("Y".to_string()))
    );
}

#[test]
fn samples_are_counted() {
    let table = Table::from_samples_with_names(
        vec![("a", true), ("b", false), ("a", true), ("a", false)],
        vec!["Name", "Flag"],
    )
    .unwrap();
    assert_eq!(table.get(("a", true)), 2.0);
    assert_eq!(table.total(), 4.0);
    assert_eq!(table.frequency(("a", true), true), 0.5);
}

#[test]
fn frequencies_are_sorted() {
    let table = Table::new(vec![("b", 1.0), ("c", 2.0), ("a", 1.0)]).unwrap();
    let frequencies = table.frequencies(true);
    assert_eq!(
        frequencies,
        [
            ("a".into_key(), 0.25),
            ("b".into_key(), 0.25),
            ("c".into_key(), 0.5)
        ]
    );
}

#[test]
fn consistent_types_pass() {
    sample_1().check_consistency().unwrap();
    sample_2_named(["X1", "X2", "X3", "X4"])
        .check_consistency()
        .unwrap();
}

#[test]
fn mixed_types_fail() {
    let table = Table::with_names(
        vec![
            (Key::new(vec![Value::from("a"), Value::from(1)]), 1.0),
            (Key::new(vec![Value::from("b"), Value::from(1.5)]), 1.0),
        ],
        vec!["Name", "Score"],
    )
    .unwrap();
    assert_eq!(
        table.check_consistency(),
        Err(Error::MixedTypes {
            column: "Score".to_string(),
            expected: "int",
            found: "float",
        })
    );
}

#[test]
fn normalised_tables_sum_to_one() {
    let mut table = sample_2_named(["X1", "X2", "X3", "X4"]);
    table.normalise();
    assert_close(table.total(), 1.0);

    let again = table.normalised();
    for (key, weight) in table.iter() {
        assert_close(again.get(key), weight);
    }
}

#[test]
fn add_sums_keywise() {
    let sparse = sample_1_named(["X1", "X2", "X3", "X4"]);
    let full = Table::with_names(sample_1_rows(), ["X1", "X2", "X3", "X4"]).unwrap();

    let sum = sparse.add(&full).unwrap();
    assert_eq!(sum.total(), sparse.total() + full.total());
    assert_eq!(sum.get(("b", "y", 2, 33)), 14.0);
    assert_eq!(sum.get(("a", "x", 1, 33)), 2.0);
    assert_eq!(sum.len(), 16);
}

#[test]
fn add_requires_identical_names() {
    let a = sample_1_named(["X1", "X2", "X3", "X4"]);
    let b = sample_1_named(["X2", "X1", "X3", "X4"]);
    let c = sample_1_named(["X1", "X2", "X3", "Y4"]);
    assert!(matches!(a.add(&b), Err(Error::NameMismatch { .. })));
    assert_eq!(a.add(&c).unwrap_err().kind(), ErrorKind::Schema);
}

#[test]
fn scaling_by_a_number() {
    let table = sample_1_named(["X1", "X2", "X3", "X4"]);
    let doubled = (2.0 * &table).unwrap();
    assert_eq!(doubled.get(("a", "x", 1, 33)), 2.0);
    assert_eq!(doubled.get(("b", "x", 1, 33)), 18.0);

    let scaled = (&table * 1.2).unwrap();
    assert_eq!(scaled.get(("b", "x", 2, 44)), 12.0 * 1.2);
    assert_eq!(scaled.names(), table.names());

    assert_eq!(&table * -1.0, Err(Error::InvalidWeight(-1.0)));
    assert!((f64::NAN * &table).is_err());
}

#[test]
fn entropy_of_a_joint_table() {
    let table = Table::new(vec![
        ((1, 2), 150.0),
        ((1, 3), 150.0),
        ((2, 2), 300.0),
        ((2, 3), 400.0),
    ])
    .unwrap();
    assert_close(table.summary().uncertainty, 1.8709505944546687);
    assert_close(table.entropy(std::f64::consts::E).unwrap(), 1.8709505944546687 * 2f64.ln());
    assert_eq!(table.summary().sample_size, 1000.0);
}
