//! Persistent, immutable computational graphs.
//!
//! A [`Graph`] is a handle to its output node. Every builder method returns a
//! new handle whose node points at the existing ones, so a prefix can be
//! shared by many graphs and a graph can be executed any number of times
//! without being modified. A graph can only reference graphs that already
//! exist, which keeps the node relation acyclic.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use compgraph_core::hash::{hash_serde, Hash256};
use compgraph_core::id::NodeId;
use compgraph_core::row::Row;
use compgraph_operators::{Folder, JoinSpec, Mapper, Reducer, SortKey};

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("a graph cannot be joined with itself")]
    SelfJoin,

    #[error("join requires at least one key column")]
    EmptyJoinKeys,

    #[error("fingerprint: {0}")]
    Fingerprint(String),
}

/// What a node does, together with the upstream graph(s) it reads from.
pub enum OperationKind {
    Input {
        name: String,
    },
    Map {
        upstream: Graph,
        mapper: Arc<dyn Mapper>,
    },
    Reduce {
        upstream: Graph,
        reducer: Arc<dyn Reducer>,
        keys: Vec<String>,
    },
    Sort {
        upstream: Graph,
        keys: Vec<SortKey>,
    },
    Fold {
        upstream: Graph,
        folder: Arc<dyn Folder>,
        initial: Row,
    },
    Join {
        left: Graph,
        right: Graph,
        spec: JoinSpec,
    },
}

impl OperationKind {
    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::Input { .. } => "input",
            OperationKind::Map { .. } => "map",
            OperationKind::Reduce { .. } => "reduce",
            OperationKind::Sort { .. } => "sort",
            OperationKind::Fold { .. } => "fold",
            OperationKind::Join { .. } => "join",
        }
    }
}

pub struct Node {
    pub id: NodeId,
    pub kind: OperationKind,
}

#[derive(Clone)]
pub struct Graph {
    node: Arc<Node>,
}

impl Graph {
    fn with_kind(kind: OperationKind) -> Self {
        Self {
            node: Arc::new(Node {
                id: NodeId::fresh(),
                kind,
            }),
        }
    }

    /// A graph that reads the table bound to `name` at execution time.
    pub fn from_input(name: impl Into<String>) -> Self {
        Self::with_kind(OperationKind::Input { name: name.into() })
    }

    pub fn map<M: Mapper + 'static>(&self, mapper: M) -> Graph {
        self.map_shared(Arc::new(mapper))
    }

    pub fn map_shared(&self, mapper: Arc<dyn Mapper>) -> Graph {
        Self::with_kind(OperationKind::Map {
            upstream: self.clone(),
            mapper,
        })
    }

    /// Reduce contiguous groups of rows sharing `keys`. Empty `keys` make the
    /// whole stream one group.
    pub fn reduce<R, I, S>(&self, reducer: R, keys: I) -> Graph
    where
        R: Reducer + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_kind(OperationKind::Reduce {
            upstream: self.clone(),
            reducer: Arc::new(reducer),
            keys: keys.into_iter().map(Into::into).collect(),
        })
    }

    /// Stable ascending sort on `keys`.
    pub fn sort<I, S>(&self, keys: I) -> Graph
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort_by(keys.into_iter().map(SortKey::asc))
    }

    /// Stable sort with a direction per key column.
    pub fn sort_by<I: IntoIterator<Item = SortKey>>(&self, keys: I) -> Graph {
        Self::with_kind(OperationKind::Sort {
            upstream: self.clone(),
            keys: keys.into_iter().collect(),
        })
    }

    pub fn fold<F: Folder + 'static>(&self, folder: F, initial: Row) -> Graph {
        Self::with_kind(OperationKind::Fold {
            upstream: self.clone(),
            folder: Arc::new(folder),
            initial,
        })
    }

    /// Merge-join this graph (left) with `right`. Both must produce rows
    /// sorted ascending by `spec.keys`.
    pub fn join(&self, spec: JoinSpec, right: &Graph) -> Result<Graph, GraphError> {
        if Arc::ptr_eq(&self.node, &right.node) {
            return Err(GraphError::SelfJoin);
        }
        if spec.keys.is_empty() {
            return Err(GraphError::EmptyJoinKeys);
        }
        Ok(Self::with_kind(OperationKind::Join {
            left: self.clone(),
            right: right.clone(),
            spec,
        }))
    }

    pub fn id(&self) -> NodeId {
        self.node.id
    }

    pub fn kind(&self) -> &OperationKind {
        &self.node.kind
    }

    pub fn ptr_eq(&self, other: &Graph) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Distinct input names this graph reads, including those of joined
    /// graphs, sorted.
    pub fn inputs(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        self.collect_inputs(&mut names);
        names.into_iter().collect()
    }

    fn collect_inputs(&self, names: &mut BTreeSet<String>) {
        match &self.node.kind {
            OperationKind::Input { name } => {
                names.insert(name.clone());
            }
            OperationKind::Map { upstream, .. }
            | OperationKind::Reduce { upstream, .. }
            | OperationKind::Sort { upstream, .. }
            | OperationKind::Fold { upstream, .. } => upstream.collect_inputs(names),
            OperationKind::Join { left, right, .. } => {
                left.collect_inputs(names);
                right.collect_inputs(names);
            }
        }
    }

    /// Structural description used for fingerprints.
    pub fn describe(&self) -> NodeDesc {
        let (op, upstream) = match &self.node.kind {
            OperationKind::Input { name } => (OpDesc::Input { name: name.clone() }, Vec::new()),
            OperationKind::Map { upstream, mapper } => (
                OpDesc::Map {
                    mapper: mapper.name().to_string(),
                },
                vec![upstream.describe()],
            ),
            OperationKind::Reduce {
                upstream,
                reducer,
                keys,
            } => (
                OpDesc::Reduce {
                    reducer: reducer.name().to_string(),
                    keys: keys.clone(),
                },
                vec![upstream.describe()],
            ),
            OperationKind::Sort { upstream, keys } => {
                (OpDesc::Sort { keys: keys.clone() }, vec![upstream.describe()])
            }
            OperationKind::Fold {
                upstream,
                folder,
                initial,
            } => (
                OpDesc::Fold {
                    folder: folder.name().to_string(),
                    initial: initial.clone(),
                },
                vec![upstream.describe()],
            ),
            OperationKind::Join { left, right, spec } => (
                OpDesc::Join { spec: spec.clone() },
                vec![left.describe(), right.describe()],
            ),
        };
        NodeDesc { op, upstream }
    }

    /// Stable blake3 hash of the graph's structure. Two graphs built the same
    /// way share a fingerprint; node ids do not take part.
    ///
    /// Operations are identified by their `name()`. Every closure is called
    /// `"fn"`, so graphs that differ only in their closures collide unless
    /// the closures are wrapped with [`compgraph_operators::named`].
    pub fn fingerprint(&self) -> Result<Hash256, GraphError> {
        hash_serde(&self.describe()).map_err(|e| GraphError::Fingerprint(e.to_string()))
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("id", &self.node.id)
            .field("kind", &self.node.kind.label())
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OpDesc {
    Input { name: String },
    Map { mapper: String },
    Reduce { reducer: String, keys: Vec<String> },
    Sort { keys: Vec<SortKey> },
    Fold { folder: String, initial: Row },
    Join { spec: JoinSpec },
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeDesc {
    pub op: OpDesc,
    pub upstream: Vec<NodeDesc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use compgraph_operators::mappers::Identity;
    use compgraph_operators::{named, OpError};

    #[test]
    fn builders_share_the_prefix() {
        let base = Graph::from_input("docs");
        let a = base.map(Identity);
        let b = base.map(Identity);
        match (a.kind(), b.kind()) {
            (OperationKind::Map { upstream: ua, .. }, OperationKind::Map { upstream: ub, .. }) => {
                assert!(ua.ptr_eq(&base));
                assert!(ub.ptr_eq(&base));
            }
            _ => panic!("expected map nodes"),
        }
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn join_rejects_self_and_empty_keys() {
        let g = Graph::from_input("t").sort(["k"]);
        assert!(matches!(g.join(JoinSpec::inner(["k"]), &g), Err(GraphError::SelfJoin)));
        let other = Graph::from_input("u").sort(["k"]);
        let no_keys: [&str; 0] = [];
        assert!(matches!(
            g.join(JoinSpec::inner(no_keys), &other),
            Err(GraphError::EmptyJoinKeys)
        ));
    }

    #[test]
    fn inputs_cover_both_join_sides() {
        let left = Graph::from_input("orders").sort(["id"]);
        let right = Graph::from_input("users").sort(["id"]);
        let joined = left.join(JoinSpec::left(["id"]), &right).unwrap();
        assert_eq!(joined.inputs(), vec!["orders".to_string(), "users".to_string()]);
    }

    #[test]
    fn fingerprint_is_structural() {
        let build = || Graph::from_input("docs").map(Identity).sort(["text"]);
        assert_eq!(build().fingerprint().unwrap(), build().fingerprint().unwrap());
        let other = Graph::from_input("docs").map(Identity).sort(["count"]);
        assert_ne!(build().fingerprint().unwrap(), other.fingerprint().unwrap());
    }

    #[test]
    fn named_closures_get_distinct_fingerprints() {
        let double = |row: Row| -> Result<Vec<Row>, OpError> { Ok(vec![row.clone(), row]) };
        let drop_all = |_row: Row| -> Result<Vec<Row>, OpError> { Ok(Vec::new()) };
        let base = Graph::from_input("t");

        let a = base.map(double).fingerprint().unwrap();
        let b = base.map(drop_all).fingerprint().unwrap();
        assert_eq!(a, b);

        let a = base.map(named("double", double)).fingerprint().unwrap();
        let b = base.map(named("drop_all", drop_all)).fingerprint().unwrap();
        assert_ne!(a, b);
        assert!(base.map(named("double", double)).explain().contains("double"));
    }
}
