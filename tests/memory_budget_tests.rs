//! Memory budget accounting, on its own and as seen through executions.

mod test_data_gen;

use std::sync::Arc;
use std::thread;

use compgraph_core::budget::{BudgetGuard, MemoryBudget};
use compgraph_core::config::EngineConfig;
use compgraph_core::source::MemoryTable;
use compgraph_exec::{Bindings, ExecError, Graph};
use compgraph_mem::{Error as MemError, MemoryBudgetImpl};
use compgraph_operators::reducers::{Count, FirstReducer};
use compgraph_operators::OpError;
use test_data_gen::{engine_with, generate_random_rows, rows};

#[test]
fn test_guards_release_on_drop_in_any_order() {
    let budget = MemoryBudgetImpl::new(1000);
    let a = budget.try_acquire(300, "a").expect("first");
    let b = budget.try_acquire(300, "b").expect("second");
    let c = budget.try_acquire(300, "c").expect("third");
    assert_eq!(budget.used_bytes(), 900);
    assert!(budget.try_acquire(200, "d").is_none());

    drop(b);
    let d = budget.try_acquire(300, "d").expect("room after release");
    assert_eq!(budget.used_bytes(), 900);

    drop(a);
    drop(c);
    drop(d);
    assert_eq!(budget.used_bytes(), 0);
}

#[test]
fn test_exact_capacity_and_zero_sized_guards() {
    let budget = MemoryBudgetImpl::new(1024);
    let empty = budget.try_acquire(0, "empty").expect("zero bytes always fit");
    assert_eq!(empty.bytes(), 0);

    let full = budget.try_acquire(1024, "full").expect("exact capacity fits");
    assert!(budget.try_acquire(1, "over").is_none());
    drop(full);
    drop(empty);
    assert_eq!(budget.used_bytes(), 0);
}

#[test]
fn test_guard_resize_and_grow() {
    let budget = MemoryBudgetImpl::new(10 * 1024);
    let mut guard = budget.empty_guard("buffer");

    guard.grow(4 * 1024).unwrap();
    assert!(guard.try_resize(8 * 1024));
    assert!(!guard.try_resize(12 * 1024));
    assert_eq!(guard.bytes(), 8 * 1024);

    match guard.grow(4 * 1024) {
        Err(MemError::BudgetExceeded { tag, requested, .. }) => {
            assert_eq!(tag, "buffer");
            assert_eq!(requested, 4 * 1024);
        }
        other => panic!("expected BudgetExceeded, got {other:?}"),
    }

    guard.reset();
    assert_eq!(guard.bytes(), 0);
    assert_eq!(budget.used_bytes(), 0);
    assert_eq!(budget.peak_bytes(), 8 * 1024);
}

#[test]
fn test_acquire_reports_the_refused_request() {
    let budget = MemoryBudgetImpl::new(100);
    let _held = budget.acquire(80, "held").unwrap();
    let err = budget.acquire(50, "extra").err().expect("over capacity");
    assert!(err.to_string().contains("'extra'"), "{err}");
}

#[test]
fn test_budget_under_contention_returns_to_zero() {
    let budget = Arc::new(MemoryBudgetImpl::new(100 * 1024));
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let budget = Arc::clone(&budget);
            thread::spawn(move || {
                for _ in 0..20 {
                    if let Some(guard) = budget.try_acquire(10 * 1024, "worker") {
                        assert!(budget.used_bytes() <= budget.capacity_bytes());
                        drop(guard);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker panicked");
    }
    assert_eq!(budget.used_bytes(), 0);
    assert!(budget.peak_bytes() <= 100 * 1024);
}

#[test]
fn test_oversized_reduce_group_exceeds_budget() {
    let cfg = EngineConfig {
        mem_cap_bytes: 2 * 1024,
        ..Default::default()
    };
    let (engine, _storage) = engine_with(cfg);
    let same_key: Vec<_> = generate_random_rows(40, 1, 0);
    let graph = Graph::from_input("t").reduce(Count::new("n"), ["key"]);

    let err = engine
        .run(&graph, &Bindings::new().bind("t", MemoryTable::new(same_key)))
        .unwrap_err();
    assert!(
        matches!(
            err,
            ExecError::Operator(OpError::Mem(MemError::BudgetExceeded { .. }))
        ),
        "got {err:?}"
    );
}

#[test]
fn test_small_groups_fit_a_small_budget() {
    let cfg = EngineConfig {
        mem_cap_bytes: 2 * 1024,
        ..Default::default()
    };
    let (engine, _storage) = engine_with(cfg);
    let input: Vec<_> = (0..200)
        .map(|i| compgraph_core::row! { "k" => i / 2 })
        .collect();
    let graph = Graph::from_input("t").reduce(FirstReducer, ["k"]);
    let out = engine
        .run(&graph, &Bindings::new().bind("t", MemoryTable::new(input)))
        .unwrap();
    assert_eq!(out.len(), 100);
}

#[test]
fn test_manifest_records_peak_buffered_bytes() {
    let (engine, _storage) = engine_with(EngineConfig::default());
    let graph = Graph::from_input("t").sort(["k"]);
    let bindings = Bindings::new().bind(
        "t",
        MemoryTable::new(rows(r#"[{"k":3},{"k":1},{"k":2}]"#)),
    );
    let (out, manifest) = engine.run_with_manifest(&graph, &bindings).unwrap();
    assert_eq!(out.len(), 3);
    assert!(manifest.peak_buffered_bytes > 0);
    assert_eq!(manifest.spilled_segments, 0);
    assert_eq!(manifest.inputs, vec!["t".to_string()]);
}
