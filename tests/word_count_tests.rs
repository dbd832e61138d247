//! End-to-end pipelines over in-memory tables and files on disk.

mod test_data_gen;

use std::fs;

use compgraph_core::row::Row;
use compgraph_core::Error as CoreError;
use compgraph_exec::{Bindings, ExecError, Graph};
use compgraph_io::{CsvFile, JsonlWriter, LineFile};
use compgraph_operators::mappers::{FilterPunctuation, LowerCase, Split};
use compgraph_operators::reducers::{Count, TermFrequency};
use compgraph_operators::OpError;
use test_data_gen::{bind, engine, rows};

/// One row per whitespace-separated token of `text`, keeping only the token.
fn tokens(row: Row) -> Result<Vec<Row>, OpError> {
    Ok(row
        .get_str("text")?
        .split_whitespace()
        .map(|t| Row::new().with("token", t))
        .collect())
}

fn token_count_graph() -> Graph {
    Graph::from_input("docs")
        .map(tokens)
        .sort(["token"])
        .reduce(Count::new("count"), ["token"])
}

#[test]
fn test_word_count_scenario() {
    let out = engine()
        .run(&token_count_graph(), &bind("docs", r#"[{"doc_id":1,"text":"a b a"}]"#))
        .unwrap();
    assert_eq!(
        out,
        rows(r#"[{"token":"a","count":2},{"token":"b","count":1}]"#)
    );
}

#[test]
fn test_word_count_over_jsonl_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("docs.jsonl");
    let output = dir.path().join("counts.jsonl");
    fs::write(
        &input,
        "{\"doc_id\":1,\"text\":\"b a\"}\n\n{\"doc_id\":2,\"text\":\"a c a\"}\n",
    )
    .unwrap();

    let bindings = Bindings::new().bind("docs", LineFile::jsonl(&input));
    let out = engine().run(&token_count_graph(), &bindings).unwrap();

    let mut writer = JsonlWriter::to_path(&output).unwrap();
    for row in &out {
        writer.write_row(row).unwrap();
    }
    writer.flush().unwrap();
    assert_eq!(writer.rows_written(), 3);

    let written = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(
        lines,
        vec![
            r#"{"count":3,"token":"a"}"#,
            r#"{"count":1,"token":"b"}"#,
            r#"{"count":1,"token":"c"}"#,
        ]
    );

    // The written file is itself a valid input.
    let again = engine()
        .run(
            &Graph::from_input("counts").sort(["count"]),
            &Bindings::new().bind("counts", LineFile::jsonl(&output)),
        )
        .unwrap();
    assert_eq!(again.first().and_then(|r| r.get_str("token").ok()), Some("b"));
}

#[test]
fn test_word_count_over_csv() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("docs.csv");
    fs::write(&input, "doc_id,text\n1,Hello world\n2,\"hello, again\"\n").unwrap();

    let graph = Graph::from_input("docs")
        .map(FilterPunctuation::new("text"))
        .map(LowerCase::new("text"))
        .map(Split::new("text"))
        .sort(["text"])
        .reduce(Count::new("count"), ["text"]);
    let out = engine()
        .run(&graph, &Bindings::new().bind("docs", CsvFile::new(&input)))
        .unwrap();
    assert_eq!(
        out,
        rows(r#"[{"text":"again","count":1},{"text":"hello","count":2},{"text":"world","count":1}]"#)
    );
}

#[test]
fn test_csv_cells_spelling_nan_or_infinity_are_words() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("docs.csv");
    fs::write(&input, "doc_id,text\n1,NaN\n2,Infinity\n3,nan inf\n").unwrap();

    let graph = Graph::from_input("docs")
        .map(LowerCase::new("text"))
        .map(Split::new("text"))
        .sort(["text"])
        .reduce(Count::new("count"), ["text"]);
    let out = engine()
        .run(&graph, &Bindings::new().bind("docs", CsvFile::new(&input)))
        .unwrap();
    assert_eq!(
        out,
        rows(r#"[{"text":"inf","count":1},{"text":"infinity","count":1},{"text":"nan","count":2}]"#)
    );
}

#[test]
fn test_malformed_input_line_is_a_source_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.jsonl");
    fs::write(&input, "{\"text\":\"ok\"}\nnot json\n").unwrap();

    let err = engine()
        .run(
            &token_count_graph(),
            &Bindings::new().bind("docs", LineFile::jsonl(&input)),
        )
        .unwrap_err();
    match err {
        ExecError::Operator(OpError::Row(CoreError::Source(msg))) => {
            assert!(msg.contains(":2:"), "{msg}");
        }
        other => panic!("expected a source error, got {other:?}"),
    }
}

#[test]
fn test_missing_input_file_fails_on_first_pull() {
    let dir = tempfile::tempdir().unwrap();
    let bindings = Bindings::new().bind("docs", LineFile::jsonl(dir.path().join("absent.jsonl")));
    let mut stream = engine().execute(&token_count_graph(), &bindings).unwrap();
    assert!(matches!(
        stream.pull(),
        Err(ExecError::Operator(OpError::Row(CoreError::Source(_))))
    ));
}

#[test]
fn test_term_frequency_per_document() {
    let graph = Graph::from_input("docs")
        .map(Split::new("text"))
        .sort(["doc_id"])
        .reduce(TermFrequency::new("text", "tf"), ["doc_id"]);
    let out = engine()
        .run(
            &graph,
            &bind("docs", r#"[{"doc_id":2,"text":"x"},{"doc_id":1,"text":"a b a b"}]"#),
        )
        .unwrap();

    let summary: Vec<(i64, String, f64)> = out
        .iter()
        .map(|r| {
            (
                r.get("doc_id").unwrap().as_i64().unwrap(),
                r.get_str("text").unwrap().to_string(),
                r.get_f64("tf").unwrap(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            (1, "a".to_string(), 0.5),
            (1, "b".to_string(), 0.5),
            (2, "x".to_string(), 1.0),
        ]
    );
}
