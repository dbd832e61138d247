use criterion::{criterion_group, criterion_main, Criterion};
use compgraph_core::config::EngineConfig;
use compgraph_core::row::Row;
use compgraph_core::source::MemoryTable;
use compgraph_exec::{Bindings, Engine, Graph};
use compgraph_io::MemoryStorage;
use compgraph_operators::mappers::{FilterPunctuation, LowerCase, Split};
use compgraph_operators::reducers::Count;
use compgraph_operators::JoinSpec;

const WORDS: [&str; 8] = [
    "graph", "Stream", "sort,", "merge", "join!", "reduce", "fold", "map",
];

fn make_docs(docs: usize) -> Vec<Row> {
    (0..docs)
        .map(|i| {
            let text: Vec<&str> = (0..12).map(|j| WORDS[(i * 7 + j * 3) % WORDS.len()]).collect();
            Row::new().with("doc_id", i as i64).with("text", text.join(" "))
        })
        .collect()
}

fn make_keyed(rows: usize, modulo: i64) -> Vec<Row> {
    (0..rows)
        .map(|i| {
            let i = i as i64;
            Row::new()
                .with("k", (i * 7919) % modulo)
                .with("v", i)
                .with("pad", "xxxxxxxxxxxxxxxx")
        })
        .collect()
}

fn bench_word_count(c: &mut Criterion) {
    let bindings = Bindings::new().bind("docs", MemoryTable::new(make_docs(2_000)));
    let graph = Graph::from_input("docs")
        .map(FilterPunctuation::new("text"))
        .map(LowerCase::new("text"))
        .map(Split::new("text"))
        .sort(["text"])
        .reduce(Count::new("count"), ["text"])
        .sort(["count", "text"]);
    let engine = Engine::new(EngineConfig::default()).unwrap();
    c.bench_function("word_count_2k_docs", |b| {
        b.iter(|| engine.run(&graph, &bindings).unwrap())
    });
}

fn bench_spilling_sort(c: &mut Criterion) {
    let bindings = Bindings::new().bind("t", MemoryTable::new(make_keyed(20_000, 1_000)));
    let cfg = EngineConfig {
        sort_run_rows: 2_000,
        spill_chunk_rows: 256,
        ..Default::default()
    };
    let engine = Engine::with_memory_spill(cfg, MemoryStorage::new()).unwrap();
    let graph = Graph::from_input("t").sort(["k"]);
    c.bench_function("sort_20k_rows_10_runs", |b| {
        b.iter(|| engine.run(&graph, &bindings).unwrap())
    });
}

fn bench_merge_join(c: &mut Criterion) {
    let bindings = Bindings::new()
        .bind("left", MemoryTable::new(make_keyed(10_000, 2_000)))
        .bind("right", MemoryTable::new(make_keyed(2_000, 2_000)));
    let left = Graph::from_input("left").sort(["k"]);
    let right = Graph::from_input("right").sort(["k"]);
    let graph = left.join(JoinSpec::inner(["k"]), &right).unwrap();
    let engine = Engine::new(EngineConfig::default()).unwrap();
    c.bench_function("inner_join_10k_x_2k", |b| {
        b.iter(|| engine.run(&graph, &bindings).unwrap())
    });
}

criterion_group!(pipelines, bench_word_count, bench_spilling_sort, bench_merge_join);
criterion_main!(pipelines);
