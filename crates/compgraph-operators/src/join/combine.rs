//! Building one output row from a matched left/right pair.
//!
//! Key columns are taken once, from the left row. A non-key column present
//! on only one side is copied as is. A non-key column present on both sides
//! appears twice, renamed `<col><left_suffix>` and `<col><right_suffix>`.
//!
//! A renamed column can collide with a column copied as is (a left-only
//! `v_1` next to a shared `v`), or two renames can meet. Such a row fails
//! with `ColumnConflict` instead of losing a value.

use compgraph_core::row::Row;
use compgraph_core::value::Value;

use super::JoinSpec;
use crate::traits::OpError;

pub fn combine_rows(left: &Row, right: &Row, spec: &JoinSpec) -> Result<Row, OpError> {
    let is_key = |col: &str| spec.keys.iter().any(|k| k == col);
    let mut out = Row::new();
    let mut put = |col: String, value: &Value| {
        if out.insert(col.clone(), value.clone()).is_some() {
            return Err(OpError::ColumnConflict(col));
        }
        Ok(())
    };

    for (col, value) in left.iter() {
        if !is_key(col) && right.contains(col) {
            put(format!("{col}{}", spec.left_suffix), value)?;
        } else {
            put(col.to_string(), value)?;
        }
    }
    for (col, value) in right.iter() {
        if is_key(col) {
            continue;
        }
        if left.contains(col) {
            put(format!("{col}{}", spec.right_suffix), value)?;
        } else {
            put(col.to_string(), value)?;
        }
    }
    Ok(out)
}
