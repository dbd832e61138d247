//! Sort operator: stable multi-key sort with external runs.

pub mod external;
pub mod key;
pub mod run;

pub use external::{SortOptions, SortStream};
pub use key::{compare_keys, sort_key_of, SortKey, SortOrder};
