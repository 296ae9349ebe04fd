mod common;

use common::*;
use contingency::{Error, ErrorKind, Factor, Table};

#[test]
fn product_with_one_shared_column() {
    let left = sample_1_named(["X1", "X2", "X3", "X4"]);
    let right = sample_2_named(["X3", "X5", "X6", "X7"]);
    let joint = &left * &right;
    assert_eq!(joint.names(), ["X1", "X2", "X3", "X4", "X5", "X6", "X7"]);
    assert_eq!(joint.get(("a", "x", 1, 33, "high", "normal", "x")), 2.0);
    // Missing on the right.
    assert!(!joint.contains(("b", "y", 2, 44, "high", "over", "y")));
    // Missing on the left.
    assert!(!joint.contains(("b", "y", 2, 33, "high", "normal", "y")));
}

#[test]
fn product_with_two_shared_columns() {
    let left = sample_1_named(["X1", "X2", "X3", "X4"]);
    let right = sample_2_named(["X3", "X5", "X6", "X2"]);
    let joint = left.product(&right);
    assert_eq!(joint.names(), ["X1", "X2", "X3", "X4", "X5", "X6"]);
    assert_eq!(joint.get(("a", "y", 2, 33, "high", "under")), 150.0);
    assert!(!joint.contains(("a", "y", 2, 33, "low", "under")));
    assert!(!joint.contains(("b", "y", 2, 33, "high", "under")));
}

#[test]
fn product_without_shared_columns() {
    let left = sample_1_named(["X1", "X2", "X3", "X4"]);
    let right = sample_2_named(["Y1", "Y2", "Y3", "Y4"]);
    let joint = &left * &right;
    assert_eq!(
        joint.names(),
        ["X1", "X2", "X3", "X4", "Y1", "Y2", "Y3", "Y4"]
    );
    assert_eq!(joint.len(), left.len() * right.len());
    assert_eq!(joint.get(("a", "x", 1, 33, 2, "high", "normal", "x")), 10.0);
    assert_eq!(joint.get(("b", "x", 1, 44, 1, "low", "over", "y")), 253.0);
    assert_eq!(joint.total(), left.total() * right.total());
}

#[test]
fn product_with_single_column() {
    let single = Table::with_names(vec![("A", 3.0), ("B", 4.0), ("C", 7.0)], vec!["Y1"]).unwrap();
    let table = sample_1_named(["X1", "X2", "X3", "X4"]);

    let joint = &table * &single;
    assert_eq!(joint.names(), ["X1", "X2", "X3", "X4", "Y1"]);
    assert_eq!(joint.get(("a", "y", 2, 33, "B")), 24.0);

    let joint = &single * &table;
    assert_eq!(joint.names(), ["Y1", "X1", "X2", "X3", "X4"]);
    assert_eq!(joint.get(("B", "a", "y", 2, 33)), 24.0);
}

#[test]
fn product_with_single_shared_column() {
    let single = Table::with_names(vec![("x", 3.0), ("y", 4.0)], vec!["X2"]).unwrap();
    let table = sample_1_named(["X1", "X2", "X3", "X4"]);

    let joint = &table * &single;
    assert_eq!(joint.names(), ["X1", "X2", "X3", "X4"]);
    assert_eq!(joint.get(("a", "x", 2, 44)), 12.0);
    assert_eq!(joint.get(("a", "y", 2, 44)), 32.0);

    let joint = &single * &table;
    assert_eq!(joint.names(), ["X2", "X1", "X3", "X4"]);
    assert_eq!(joint.get(("y", "a", 2, 44)), 32.0);
}

#[test]
fn independent_marginals_multiply_back() {
    let a = Table::with_names(vec![("a1", 0.4), ("a2", 0.6)], vec!["A"]).unwrap();
    let b = Table::with_names(vec![("b1", 0.3), ("b2", 0.7)], vec!["B"]).unwrap();
    let joint = &a * &b;
    assert_close(joint.get(("a2", "b1")), 0.18);
    assert_close(joint.total(), 1.0);

    let p_a = joint.marginal(&["B"], false).unwrap();
    let p_b = joint.marginal(&["A"], false).unwrap();
    let rebuilt = &p_a * &p_b;
    assert_same_distribution(&rebuilt, &joint);
}

#[test]
fn three_independent_factors_are_recovered_from_their_joint() {
    let a = Table::with_names(vec![("a1", 0.4), ("a2", 0.6)], vec!["A"]).unwrap();
    let b = Table::with_names(vec![("b1", 0.3), ("b2", 0.7)], vec!["B"]).unwrap();
    let c = Table::with_names(vec![(1, 0.1), (2, 0.2), (3, 0.7)], vec!["C"]).unwrap();
    let joint = &(&a * &b) * &c;
    assert_eq!(joint.names(), ["A", "B", "C"]);
    assert_eq!(joint.len(), 12);
    assert_close(joint.total(), 1.0);

    let p_a = joint.marginal(&["B", "C"], false).unwrap();
    let p_b = joint.marginal(&["A", "C"], false).unwrap();
    let p_c = joint.marginal(&["A", "B"], false).unwrap();
    assert_same_distribution(&p_a, &a);
    assert_same_distribution(&p_b, &b);
    assert_same_distribution(&p_c, &c);

    let rebuilt = &(&p_c * &p_a) * &p_b;
    assert_eq!(rebuilt.names(), ["C", "A", "B"]);
    assert_same_distribution(&rebuilt, &joint);
}

#[test]
fn joint_factors_into_conditional_and_marginal() {
    let joint = sample_1_named(["X1", "X2", "X3", "X4"]).normalised();
    let given = Factor::from(joint.condition_on(&["X2", "X3", "X4"], true).unwrap());
    let marginal = Factor::from(joint.marginal(&["X1"], true).unwrap());

    let rebuilt = (&marginal * &given).unwrap();
    assert_eq!(rebuilt.names(), ["X2", "X3", "X4", "X1"]);
    assert_same_distribution(rebuilt.as_flat().unwrap(), &joint);

    let rebuilt = (&given * &marginal).unwrap().into_flat().unwrap();
    assert_eq!(rebuilt.names(), ["X1", "X2", "X3", "X4"]);
    assert_same_distribution(&rebuilt, &joint);
}

#[test]
fn flat_times_some_conditioning_columns_stays_conditional() {
    let joint = sample_1().normalised().marginal(&["X4"], false).unwrap();
    let p_x2 = Factor::from(joint.marginal(&["X1", "X3"], true).unwrap());
    let given = Factor::from(joint.condition_on(&["X2", "X3"], true).unwrap());

    let product = p_x2.product(&given).unwrap();
    assert_eq!(product.names(), ["X3"]);
    assert_eq!(product.children(), ["X2", "X1"]);

    let product = product.into_nested().unwrap();
    let p_x2_y = 84.0 / 136.0;
    // P(X1 = a | X2 = y, X3 = 1) = (5 + 7) / (5 + 7 + 13 + 15)
    assert_close(
        product.get(1).unwrap().get(("y", "a")),
        p_x2_y * 12.0 / 40.0,
    );
}

#[test]
fn conditionals_compose() {
    let joint = sample_1_named(["X1", "X2", "X3", "X4"])
        .marginal(&["X4"], false)
        .unwrap();
    let x1_given_x2_x3 = Factor::from(joint.condition_on(&["X2", "X3"], true).unwrap());
    let x2_given_x3 = Factor::from(
        joint
            .marginal(&["X1"], false)
            .unwrap()
            .condition_on(&["X3"], true)
            .unwrap(),
    );
    let expected = joint.condition_on(&["X3"], true).unwrap();

    let composed = (&x1_given_x2_x3 * &x2_given_x3).unwrap();
    assert_eq!(composed.names(), ["X3"]);
    assert_eq!(composed.children(), ["X1", "X2"]);
    let composed = composed.into_nested().unwrap();
    assert_eq!(composed.len(), expected.len());
    for (key, partition) in expected.iter() {
        assert_same_distribution(composed.get(key).unwrap(), partition);
    }

    let mirrored = (&x2_given_x3 * &x1_given_x2_x3).unwrap();
    assert_eq!(mirrored.children(), ["X2", "X1"]);
    for (key, partition) in expected.iter() {
        assert_same_distribution(mirrored.as_nested().unwrap().get(key).unwrap(), partition);
    }
}

#[test]
fn conditional_times_its_conditioning_distribution() {
    let joint = Table::with_names(
        vec![(("a", "x"), 1.0), (("a", "y"), 3.0), (("b", "x"), 2.0), (("b", "y"), 2.0)],
        vec!["A", "B"],
    )
    .unwrap();
    let given_b = Factor::from(joint.condition_on(&["B"], false).unwrap());
    let p_b = Factor::from(joint.marginal(&["A"], false).unwrap());

    let product = (&given_b * &p_b).unwrap().into_flat().unwrap();
    assert_eq!(product.names(), ["A", "B"]);
    // Unnormalised counts multiply: 3 for (a, y) times 5 for y.
    assert_eq!(product.get(("a", "y")), 15.0);
    assert_eq!(product.get(("b", "x")), 6.0);
}

#[test]
fn unrelated_conditionals_do_not_compose() {
    let joint = sample_1_named(["X", "Y", "U", "W"]);
    let x_given_u = Factor::from(
        joint
            .marginal(&["Y", "W"], false)
            .unwrap()
            .condition_on(&["U"], true)
            .unwrap(),
    );
    let y_given_u = Factor::from(
        joint
            .marginal(&["X", "W"], false)
            .unwrap()
            .condition_on(&["U"], true)
            .unwrap(),
    );
    let error = x_given_u.product(&y_given_u).unwrap_err();
    assert!(matches!(error, Error::Topology(_)));
    assert_eq!(error.kind(), ErrorKind::Schema);

    let x_given_y = Factor::from(joint.condition_on(&["Y", "U", "W"], true).unwrap());
    let y_given_x = Factor::from(joint.condition_on(&["X", "U", "W"], true).unwrap());
    assert!(x_given_y.product(&y_given_x).is_err());
}

#[test]
fn flat_columns_must_all_be_conditioning_columns() {
    let joint = sample_1_named(["X1", "X2", "X3", "X4"]);
    let given = Factor::from(joint.condition_on(&["X2"], true).unwrap());
    let p_x1_x2 = Factor::from(joint.marginal(&["X3", "X4"], true).unwrap());
    assert!(matches!(
        p_x1_x2.product(&given),
        Err(Error::Topology(_))
    ));
}

#[test]
fn scaling_conditionals() {
    let given = sample_1_named(["X1", "X2", "X3", "X4"])
        .condition_on(&["X1"], false)
        .unwrap();
    let doubled = (2.0 * &given).unwrap();
    for (key, table) in given.iter() {
        assert_eq!(doubled.get(key).unwrap(), &(table * 2.0).unwrap());
    }
    assert!(given.scale(f64::NAN).is_err());
    assert!((&given * -0.5).is_err());
}
