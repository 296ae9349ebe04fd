#![allow(dead_code)]

use contingency::{Table, Value};

pub type Row4 = ((&'static str, &'static str, i64, i64), f64);

/// Four columns of two levels each, weighted 1 to 16.
pub fn sample_1_rows() -> Vec<Row4> {
    vec![
        (("a", "x", 1, 33), 1.0),
        (("a", "x", 2, 33), 2.0),
        (("a", "x", 1, 44), 3.0),
        (("a", "x", 2, 44), 4.0),
        (("a", "y", 1, 33), 5.0),
        (("a", "y", 2, 33), 6.0),
        (("a", "y", 1, 44), 7.0),
        (("a", "y", 2, 44), 8.0),
        (("b", "x", 1, 33), 9.0),
        (("b", "x", 2, 33), 10.0),
        (("b", "x", 1, 44), 11.0),
        (("b", "x", 2, 44), 12.0),
        (("b", "y", 1, 33), 13.0),
        (("b", "y", 2, 33), 14.0),
        (("b", "y", 1, 44), 15.0),
        (("b", "y", 2, 44), 16.0),
    ]
}

/// `sample_1` without the `("b", "y", 2, 33)` row.
pub fn sample_1_sparse_rows() -> Vec<Row4> {
    sample_1_rows()
        .into_iter()
        .filter(|(key, _)| *key != ("b", "y", 2, 33))
        .collect()
}

pub fn sample_1() -> Table {
    Table::new(sample_1_rows()).unwrap()
}

pub fn sample_1_named(names: [&str; 4]) -> Table {
    Table::with_names(sample_1_sparse_rows(), names).unwrap()
}

/// Four columns of 2, 2, 4 and 2 levels; six combinations are never observed.
pub fn sample_2_named(names: [&str; 4]) -> Table {
    let rows: Vec<((i64, &str, &str, &str), f64)> = vec![
        ((1, "high", "under", "x"), 1.0),
        ((1, "high", "normal", "x"), 2.0),
        ((1, "high", "over", "x"), 3.0),
        ((1, "high", "obese", "x"), 4.0),
        ((1, "low", "under", "x"), 5.0),
        ((1, "low", "normal", "x"), 6.0),
        ((1, "low", "over", "x"), 7.0),
        ((1, "low", "obese", "x"), 8.0),
        ((2, "high", "under", "x"), 9.0),
        ((2, "high", "normal", "x"), 10.0),
        ((2, "high", "over", "x"), 11.0),
        ((2, "high", "obese", "x"), 12.0),
        ((2, "low", "under", "x"), 13.0),
        ((2, "low", "normal", "x"), 14.0),
        ((2, "low", "over", "x"), 15.0),
        ((2, "low", "obese", "x"), 16.0),
        ((1, "high", "under", "y"), 17.0),
        ((1, "high", "normal", "y"), 18.0),
        ((1, "high", "over", "y"), 19.0),
        ((1, "high", "obese", "y"), 20.0),
        ((1, "low", "under", "y"), 21.0),
        ((1, "low", "normal", "y"), 22.0),
        ((1, "low", "over", "y"), 23.0),
        ((1, "low", "obese", "y"), 24.0),
        ((2, "high", "under", "y"), 25.0),
        ((2, "high", "normal", "y"), 26.0),
    ];
    Table::with_names(rows, names).unwrap()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "{} is not close to {}",
        actual,
        expected
    );
}

/// Checks that two tables hold the same weights, matching columns by name rather than position.
pub fn assert_same_distribution(actual: &Table, expected: &Table) {
    let mut names: Vec<&String> = actual.names().iter().collect();
    let mut expected_names: Vec<&String> = expected.names().iter().collect();
    names.sort();
    expected_names.sort();
    assert_eq!(names, expected_names);
    assert_eq!(actual.len(), expected.len());

    for (key, weight) in expected.iter() {
        let named: Vec<(&str, Value)> = expected
            .named_key(key)
            .into_iter()
            .map(|(name, value)| (name, value.clone()))
            .collect();
        let found = actual.get_by(&[], &named).unwrap();
        assert!(
            (found - weight).abs() < 1e-9,
            "{:?}: {} differs from {}",
            key,
            found,
            weight
        );
    }
}
