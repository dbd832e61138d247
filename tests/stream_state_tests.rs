//! Output stream life cycle: laziness, exhaustion, close, reuse.

mod test_data_gen;

use compgraph_core::config::EngineConfig;
use compgraph_core::row::Row;
use compgraph_exec::{Bindings, ExecError, Graph, StreamState};
use compgraph_operators::mappers::Identity;
use compgraph_operators::OpError;
use test_data_gen::{bind, engine, engine_with, generate_random_rows, rows, CountingTable};

#[test]
fn test_stream_moves_through_states() {
    let graph = Graph::from_input("t").map(Identity);
    let mut stream = engine()
        .execute(&graph, &bind("t", r#"[{"a":1},{"a":2}]"#))
        .unwrap();
    assert_eq!(stream.state(), StreamState::NotStarted);

    assert!(stream.pull().unwrap().is_some());
    assert_eq!(stream.state(), StreamState::Yielding);
    assert!(stream.pull().unwrap().is_some());
    assert!(stream.pull().unwrap().is_none());
    assert_eq!(stream.state(), StreamState::Exhausted);
    assert_eq!(stream.rows_yielded(), 2);

    assert!(matches!(stream.pull(), Err(ExecError::StreamReused)));
    assert_eq!(stream.state(), StreamState::Closed);
    assert!(matches!(stream.pull(), Err(ExecError::StreamReused)));
}

#[test]
fn test_pull_after_close_is_stream_reused() {
    let graph = Graph::from_input("t").map(Identity);
    let mut stream = engine()
        .execute(&graph, &bind("t", r#"[{"a":1},{"a":2}]"#))
        .unwrap();
    assert!(stream.pull().unwrap().is_some());
    stream.close();
    assert_eq!(stream.state(), StreamState::Closed);
    assert!(matches!(stream.pull(), Err(ExecError::StreamReused)));
}

#[test]
fn test_iteration_stops_at_the_end() {
    let graph = Graph::from_input("t").map(Identity);
    let mut stream = engine()
        .execute(&graph, &bind("t", r#"[{"a":1}]"#))
        .unwrap();
    let collected: Vec<Row> = stream.by_ref().map(Result::unwrap).collect();
    assert_eq!(collected.len(), 1);
    assert!(stream.next().is_none());
    assert_eq!(stream.state(), StreamState::Exhausted);
}

#[test]
fn test_failed_stream_is_closed() {
    let graph = Graph::from_input("t").sort(["missing"]);
    let mut stream = engine()
        .execute(&graph, &bind("t", r#"[{"a":1}]"#))
        .unwrap();
    assert!(stream.pull().is_err());
    assert_eq!(stream.state(), StreamState::Closed);
    assert!(matches!(stream.pull(), Err(ExecError::StreamReused)));
}

#[test]
fn test_nothing_is_read_before_the_first_pull() {
    let table = CountingTable::new(rows(r#"[{"a":1},{"a":2},{"a":3}]"#));
    let bindings = Bindings::new().bind("t", table.clone());
    let graph = Graph::from_input("t").map(Identity);

    let mut stream = engine().execute(&graph, &bindings).unwrap();
    assert_eq!(table.opens(), 0);

    stream.pull().unwrap();
    assert_eq!(table.opens(), 1);
    assert_eq!(table.reads(), 1);

    stream.pull().unwrap();
    assert_eq!(table.reads(), 2);
}

#[test]
fn test_sort_reads_its_whole_input_on_first_pull() {
    let table = CountingTable::new(rows(r#"[{"a":3},{"a":1},{"a":2}]"#));
    let bindings = Bindings::new().bind("t", table.clone());
    let graph = Graph::from_input("t").sort(["a"]);

    let mut stream = engine().execute(&graph, &bindings).unwrap();
    let first = stream.pull().unwrap().unwrap();
    assert_eq!(first.get("a").unwrap().as_i64(), Some(1));
    assert_eq!(table.reads(), 3);
}

#[test]
fn test_inner_join_stops_reading_once_one_side_is_exhausted() {
    let left = CountingTable::new(rows(r#"[{"k":1}]"#));
    let right = CountingTable::new(rows(
        r#"[{"k":1},{"k":2},{"k":3},{"k":4},{"k":5},{"k":6}]"#,
    ));
    let bindings = Bindings::new()
        .bind("left", left.clone())
        .bind("right", right.clone());
    let graph = Graph::from_input("left")
        .map(Identity)
        .join(
            compgraph_operators::JoinSpec::inner(["k"]),
            &Graph::from_input("right").map(Identity),
        )
        .unwrap();

    let out = engine().run(&graph, &bindings).unwrap();
    assert_eq!(out.len(), 1);
    assert!(right.reads() < 6, "read {} right rows", right.reads());
}

#[test]
fn test_dropping_a_stream_early_releases_spill_segments() {
    let cfg = EngineConfig {
        sort_run_rows: 50,
        spill_chunk_rows: 10,
        ..Default::default()
    };
    let (engine, storage) = engine_with(cfg);
    let bindings =
        Bindings::new().bind("t", compgraph_core::source::MemoryTable::new(generate_random_rows(500, 40, 7)));
    let graph = Graph::from_input("t").sort(["key"]);

    let mut stream = engine.execute(&graph, &bindings).unwrap();
    assert!(stream.pull().unwrap().is_some());
    assert!(stream.spilled_segments() > 0);
    assert!(!storage.is_empty());

    drop(stream);
    assert!(storage.is_empty(), "{} segments left", storage.len());
}

#[test]
fn test_stream_reused_is_distinct_from_operator_errors() {
    let err: ExecError = OpError::StreamReused.into();
    assert!(!err.is_join_key_error());
    assert!(!err.is_group_order_violation());
    assert!(err.missing_column().is_none());
}

#[test]
fn test_for_each_row_hands_rows_over_as_they_are_produced() {
    let source = CountingTable::new(generate_random_rows(20, 5, 9));
    let bindings = Bindings::new().bind("t", source.clone());
    let graph = Graph::from_input("t").map(Identity);

    let mut seen = Vec::new();
    let manifest = engine()
        .for_each_row(&graph, &bindings, |_row| {
            seen.push(source.reads());
            Ok::<(), ExecError>(())
        })
        .unwrap();

    assert_eq!(seen, (1..=20).collect::<Vec<usize>>());
    assert_eq!(manifest.rows_out, 20);
}

#[test]
fn test_for_each_row_stops_at_the_first_sink_error() {
    #[derive(Debug)]
    enum SinkError {
        Full,
        Exec,
    }
    impl From<ExecError> for SinkError {
        fn from(_: ExecError) -> Self {
            SinkError::Exec
        }
    }

    let source = CountingTable::new(generate_random_rows(20, 5, 9));
    let bindings = Bindings::new().bind("t", source.clone());
    let graph = Graph::from_input("t").map(Identity);

    let mut taken = 0;
    let result = engine().for_each_row(&graph, &bindings, |_row| {
        taken += 1;
        if taken == 3 {
            Err(SinkError::Full)
        } else {
            Ok(())
        }
    });
    assert!(matches!(result, Err(SinkError::Full)));
    assert_eq!(source.reads(), 3);
}
