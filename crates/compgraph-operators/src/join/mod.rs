//! Sort-merge join of two streams sorted by the same key columns.

pub mod combine;
pub mod merge;

use serde::{Deserialize, Serialize};

pub use combine::combine_rows;
pub use merge::MergeJoinStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    /// Unmatched left rows are emitted unchanged.
    pub fn keeps_left(self) -> bool {
        matches!(self, JoinType::Left | JoinType::Full)
    }

    /// Unmatched right rows are emitted unchanged.
    pub fn keeps_right(self) -> bool {
        matches!(self, JoinType::Right | JoinType::Full)
    }
}

impl std::fmt::Display for JoinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JoinType::Inner => "inner",
            JoinType::Left => "left",
            JoinType::Right => "right",
            JoinType::Full => "full",
        };
        f.write_str(s)
    }
}

/// How to join: the kind, the shared key columns and the suffixes used for
/// non-key columns present on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinSpec {
    pub join_type: JoinType,
    pub keys: Vec<String>,
    pub left_suffix: String,
    pub right_suffix: String,
}

impl JoinSpec {
    pub fn new<I, S>(join_type: JoinType, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            join_type,
            keys: keys.into_iter().map(Into::into).collect(),
            left_suffix: "_1".to_string(),
            right_suffix: "_2".to_string(),
        }
    }

    pub fn inner<I: IntoIterator<Item = S>, S: Into<String>>(keys: I) -> Self {
        Self::new(JoinType::Inner, keys)
    }

    pub fn left<I: IntoIterator<Item = S>, S: Into<String>>(keys: I) -> Self {
        Self::new(JoinType::Left, keys)
    }

    pub fn right<I: IntoIterator<Item = S>, S: Into<String>>(keys: I) -> Self {
        Self::new(JoinType::Right, keys)
    }

    pub fn full<I: IntoIterator<Item = S>, S: Into<String>>(keys: I) -> Self {
        Self::new(JoinType::Full, keys)
    }

    pub fn with_suffixes(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.left_suffix = left.into();
        self.right_suffix = right.into();
        self
    }
}
