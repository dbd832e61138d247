//! File-backed `TableSource`s.
//!
//! Every `open` re-opens the file, so running a graph twice reads the file
//! twice. Parse failures surface as `compgraph_core::Error::Source` carrying
//! the path and line.

pub mod csv;
pub mod lines;

pub use self::csv::CsvFile;
pub use lines::LineFile;
