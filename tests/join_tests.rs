//! Sort-merge join: join kinds, column combination, key errors.

mod test_data_gen;

use compgraph_core::row;
use compgraph_exec::{Bindings, ExecError, Graph};
use compgraph_operators::mappers::Identity;
use compgraph_operators::{JoinSpec, OpError};
use test_data_gen::{engine, rows, table};

fn joined(spec: JoinSpec) -> Graph {
    let left = Graph::from_input("left").sort(["k"]);
    let right = Graph::from_input("right").sort(["k"]);
    left.join(spec, &right).unwrap()
}

fn run_join(spec: JoinSpec, left: &str, right: &str) -> Result<Vec<compgraph_core::Row>, ExecError> {
    let bindings = Bindings::new()
        .bind("left", table(left))
        .bind("right", table(right));
    engine().run(&joined(spec), &bindings)
}

#[test]
fn test_left_join_keeps_unmatched_left_rows() {
    let left = r#"[{"k":1,"v":"x"}]"#;
    let right = r#"[{"k":2,"v":"y"}]"#;

    let out = run_join(JoinSpec::left(["k"]), left, right).unwrap();
    assert_eq!(out, rows(r#"[{"k":1,"v":"x"}]"#));

    let out = run_join(JoinSpec::inner(["k"]), left, right).unwrap();
    assert!(out.is_empty());
}

#[test]
fn test_signed_zero_keys_match() {
    let out = run_join(
        JoinSpec::inner(["k"]),
        r#"[{"k":-0.0,"a":"neg"}]"#,
        r#"[{"k":0.0,"b":"pos"},{"k":0,"b":"int"}]"#,
    )
    .unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].get_str("b").unwrap(), "pos");
    assert_eq!(out[1].get_str("b").unwrap(), "int");
    assert!(out.iter().all(|r| r.get_str("a").unwrap() == "neg"));
}

#[test]
fn test_disjoint_keys_give_empty_inner_and_full_union() {
    let left = r#"[{"k":1,"a":"l1"},{"k":3,"a":"l3"}]"#;
    let right = r#"[{"k":2,"b":"r2"},{"k":4,"b":"r4"}]"#;

    assert!(run_join(JoinSpec::inner(["k"]), left, right).unwrap().is_empty());

    let full = run_join(JoinSpec::full(["k"]), left, right).unwrap();
    assert_eq!(
        full,
        rows(r#"[{"k":1,"a":"l1"},{"k":2,"b":"r2"},{"k":3,"a":"l3"},{"k":4,"b":"r4"}]"#)
    );

    let right_only = run_join(JoinSpec::right(["k"]), left, right).unwrap();
    assert_eq!(right_only, rows(r#"[{"k":2,"b":"r2"},{"k":4,"b":"r4"}]"#));
}

#[test]
fn test_unique_identical_keys_make_all_join_kinds_agree() {
    let left = r#"[{"k":2,"a":1},{"k":1,"a":2}]"#;
    let right = r#"[{"k":1,"b":3},{"k":2,"b":4}]"#;
    let inner = run_join(JoinSpec::inner(["k"]), left, right).unwrap();
    assert_eq!(inner, rows(r#"[{"k":1,"a":2,"b":3},{"k":2,"a":1,"b":4}]"#));
    for spec in [JoinSpec::left(["k"]), JoinSpec::right(["k"]), JoinSpec::full(["k"])] {
        assert_eq!(run_join(spec, left, right).unwrap(), inner);
    }
}

#[test]
fn test_full_join_is_at_least_as_large_as_either_side() {
    let left = r#"[{"k":1},{"k":1},{"k":2},{"k":5}]"#;
    let right = r#"[{"k":1},{"k":3}]"#;
    let full = run_join(JoinSpec::full(["k"]), left, right).unwrap();
    assert!(full.len() >= 4);
    assert_eq!(full.len(), 5);
}

#[test]
fn test_matching_groups_produce_cross_product_left_major() {
    let left = r#"[{"k":1,"l":"a"},{"k":1,"l":"b"}]"#;
    let right = r#"[{"k":1,"r":"x"},{"k":1,"r":"y"},{"k":1,"r":"z"}]"#;
    let out = run_join(JoinSpec::inner(["k"]), left, right).unwrap();
    let pairs: Vec<String> = out
        .iter()
        .map(|r| format!("{}{}", r.get_str("l").unwrap(), r.get_str("r").unwrap()))
        .collect();
    assert_eq!(pairs, vec!["ax", "ay", "az", "bx", "by", "bz"]);
}

#[test]
fn test_shared_columns_are_suffixed_and_keys_appear_once() {
    let left = r#"[{"k":1,"score":10,"name":"l"}]"#;
    let right = r#"[{"k":1,"score":20,"city":"c"}]"#;

    let out = run_join(JoinSpec::inner(["k"]), left, right).unwrap();
    assert_eq!(
        out,
        vec![row! { "k" => 1, "score_1" => 10, "score_2" => 20, "name" => "l", "city" => "c" }]
    );

    let out = run_join(JoinSpec::inner(["k"]).with_suffixes("_a", "_b"), left, right).unwrap();
    assert!(out[0].contains("score_a") && out[0].contains("score_b"));
}

#[test]
fn test_suffixed_name_taken_by_another_column_fails() {
    let err = run_join(
        JoinSpec::inner(["k"]),
        r#"[{"k":1,"v":"l","v_1":"already here"}]"#,
        r#"[{"k":1,"v":"r"}]"#,
    )
    .unwrap_err();
    match err {
        ExecError::Operator(OpError::ColumnConflict(col)) => assert_eq!(col, "v_1"),
        other => panic!("expected a column conflict, got {other:?}"),
    }

    // Unmatched rows are emitted unchanged and never conflict.
    let out = run_join(
        JoinSpec::left(["k"]),
        r#"[{"k":1,"v":"l","v_1":"x"}]"#,
        r#"[{"k":2,"v":"r"}]"#,
    )
    .unwrap();
    assert_eq!(out, rows(r#"[{"k":1,"v":"l","v_1":"x"}]"#));
}

#[test]
fn test_int_and_float_keys_match() {
    let out = run_join(
        JoinSpec::inner(["k"]),
        r#"[{"k":1,"a":true}]"#,
        r#"[{"k":1.0,"b":false}]"#,
    )
    .unwrap();
    assert_eq!(out.len(), 1);
}

#[test]
fn test_missing_join_key_is_a_join_key_error() {
    // Sorting would report the missing column first, so join unsorted inputs
    // that happen to be in order.
    let left = Graph::from_input("left").map(Identity);
    let right = Graph::from_input("right").map(Identity);
    let graph = left.join(JoinSpec::inner(["k"]), &right).unwrap();
    let bindings = Bindings::new()
        .bind("left", table(r#"[{"k":1}]"#))
        .bind("right", table(r#"[{"other":1}]"#));
    let err = engine().run(&graph, &bindings).unwrap_err();
    assert!(err.is_join_key_error(), "got {err:?}");
}

#[test]
fn test_incomparable_join_keys_are_a_join_key_error() {
    let err = run_join(
        JoinSpec::inner(["k"]),
        r#"[{"k":1}]"#,
        r#"[{"k":"1"}]"#,
    )
    .unwrap_err();
    assert!(err.is_join_key_error(), "got {err:?}");
}

#[test]
fn test_unsorted_side_is_a_group_order_violation() {
    let left = Graph::from_input("left").sort(["k"]);
    let right = Graph::from_input("right").map(Identity);
    let graph = left.join(JoinSpec::full(["k"]), &right).unwrap();
    let bindings = Bindings::new()
        .bind("left", table(r#"[{"k":1},{"k":2},{"k":3}]"#))
        .bind("right", table(r#"[{"k":3},{"k":1}]"#));
    let err = engine().run(&graph, &bindings).unwrap_err();
    assert!(
        matches!(err, ExecError::Operator(OpError::GroupOrderViolation(_))),
        "got {err:?}"
    );
}

#[test]
fn test_join_of_two_graphs_over_the_same_input() {
    // Per-key totals joined back onto the detail rows.
    let detail = Graph::from_input("sales").sort(["shop"]);
    let totals = detail.reduce(compgraph_operators::reducers::Sum::new("amount"), ["shop"]);
    let graph = detail
        .join(JoinSpec::inner(["shop"]).with_suffixes("", "_total"), &totals)
        .unwrap();
    let bindings = Bindings::new().bind(
        "sales",
        table(r#"[{"shop":"b","amount":5},{"shop":"a","amount":1},{"shop":"a","amount":2}]"#),
    );
    let out = engine().run(&graph, &bindings).unwrap();
    assert_eq!(
        out,
        rows(
            r#"[
            {"shop":"a","amount":1,"amount_total":3},
            {"shop":"a","amount":2,"amount_total":3},
            {"shop":"b","amount":5,"amount_total":5}
        ]"#
        )
    );
}
