//! Human-readable rendering of a graph, output node first.
//!
//! ```text
//! sort [count desc, text]
//!   reduce count by [text]
//!     sort [text]
//!       map split
//!         input "docs"
//! ```

use std::fmt::{self, Write as _};

use crate::graph::{Graph, OperationKind};

impl Graph {
    pub fn explain(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = render(self, 0, &mut out);
        out
    }
}

fn render(graph: &Graph, depth: usize, out: &mut String) -> fmt::Result {
    let pad = "  ".repeat(depth);
    match graph.kind() {
        OperationKind::Input { name } => writeln!(out, "{pad}input {name:?}"),
        OperationKind::Map { upstream, mapper } => {
            writeln!(out, "{pad}map {}", mapper.name())?;
            render(upstream, depth + 1, out)
        }
        OperationKind::Reduce {
            upstream,
            reducer,
            keys,
        } => {
            writeln!(out, "{pad}reduce {} by {keys:?}", reducer.name())?;
            render(upstream, depth + 1, out)
        }
        OperationKind::Sort { upstream, keys } => {
            let keys: Vec<String> = keys.iter().map(ToString::to_string).collect();
            writeln!(out, "{pad}sort [{}]", keys.join(", "))?;
            render(upstream, depth + 1, out)
        }
        OperationKind::Fold {
            upstream, folder, ..
        } => {
            writeln!(out, "{pad}fold {}", folder.name())?;
            render(upstream, depth + 1, out)
        }
        OperationKind::Join { left, right, spec } => {
            writeln!(
                out,
                "{pad}join {} on {:?} (suffixes {:?}, {:?})",
                spec.join_type, spec.keys, spec.left_suffix, spec.right_suffix
            )?;
            render(left, depth + 1, out)?;
            writeln!(out, "{pad}  right:")?;
            render(right, depth + 2, out)
        }
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.explain())
    }
}
