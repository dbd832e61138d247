//! Ready-made graphs the CLI can run.

use compgraph_core::row::Row;
use compgraph_exec::Graph;
use compgraph_operators::mappers::{Filter, FilterPunctuation, LowerCase, Split};
use compgraph_operators::reducers::{Count, TopN};
use compgraph_operators::OpError;

/// Name the input table is bound under.
pub const INPUT: &str = "docs";

/// Occurrences of every word across all documents, sorted by
/// (count, word) ascending.
pub fn word_count_graph(text_column: &str, count_column: &str) -> Graph {
    Graph::from_input(INPUT)
        .map(FilterPunctuation::new(text_column))
        .map(LowerCase::new(text_column))
        .map(Split::new(text_column))
        .sort([text_column])
        .reduce(Count::new(count_column), [text_column])
        .sort([count_column, text_column])
}

/// The `top` most frequent words longer than `min_length` characters, most
/// frequent first.
pub fn top_words_graph(text_column: &str, count_column: &str, min_length: usize, top: usize) -> Graph {
    let column = text_column.to_string();
    let long_enough = Filter::new(move |row: &Row| -> Result<bool, OpError> {
        Ok(row.get_str(&column)?.chars().count() > min_length)
    });
    Graph::from_input(INPUT)
        .map(FilterPunctuation::new(text_column))
        .map(LowerCase::new(text_column))
        .map(Split::new(text_column))
        .map(long_enough)
        .sort([text_column])
        .reduce(Count::new(count_column), [text_column])
        .reduce(TopN::new(count_column, top), Vec::<String>::new())
}
