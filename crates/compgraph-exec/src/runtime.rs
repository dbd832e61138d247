//! Runtime: turn a graph plus bindings into a lazy row stream.
//!
//! - Every input name must be bound before any row is pulled.
//! - Each execution gets its own memory budget, peak tracker and spill
//!   manager; spill segments live under `<spill_dir>/exec-<uuid>`.
//! - Operators are instantiated per execution, so a graph is never mutated
//!   and can be executed again with other bindings.
//! - `for_each_row` streams the output into a sink and records a
//!   `RunManifest`; `run_with_manifest` is the collecting variant.

use std::sync::{Arc, Mutex};

use compgraph_core::config::EngineConfig;
use compgraph_core::id::SpillId;
use compgraph_core::manifest::{now_ms, RunManifest};
use compgraph_core::row::Row;

use compgraph_mem::{Codec, MemoryBudgetImpl, SpillManager, Storage};

use compgraph_io::{FsStorage, MemoryStorage};

use compgraph_operators::{
    FoldStream, MapStream, MergeJoinStream, ReduceOptions, ReduceStream, RowStream, SortOptions,
    SortStream,
};

use crate::bindings::Bindings;
use crate::error::ExecError;
use crate::graph::{Graph, OperationKind};
use crate::metrics;
use crate::stream::{ExecResources, NodeStream, SourceStream, TableStream};

/// Where spill segments go.
#[derive(Clone)]
enum SpillTarget {
    Fs,
    Memory(MemoryStorage),
}

/// Engine owns the configuration; every execution builds its own budget and
/// spill manager from it.
#[derive(Clone)]
pub struct Engine {
    cfg: EngineConfig,
    codec: Codec,
    spill: SpillTarget,
}

impl Engine {
    pub fn new(cfg: EngineConfig) -> Result<Self, ExecError> {
        cfg.validate().map_err(ExecError::Config)?;
        let codec = Codec::parse(&cfg.spill_codec)?;
        Ok(Self {
            cfg,
            codec,
            spill: SpillTarget::Fs,
        })
    }

    /// Engine whose spill segments are kept in `storage` instead of on disk.
    pub fn with_memory_spill(cfg: EngineConfig, storage: MemoryStorage) -> Result<Self, ExecError> {
        let mut engine = Self::new(cfg)?;
        engine.spill = SpillTarget::Memory(storage);
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Start a lazy execution of `graph` against `bindings`.
    ///
    /// Fails with [`ExecError::UnboundInput`] before touching any source if
    /// an input of the graph (or of a joined graph) has no binding. Sources
    /// are opened on the first pull that reaches them.
    pub fn execute(&self, graph: &Graph, bindings: &Bindings) -> Result<TableStream, ExecError> {
        let inputs = graph.inputs();
        if let Some(name) = inputs.iter().find(|name| !bindings.contains(name)) {
            return Err(ExecError::UnboundInput(name.clone()));
        }
        let fingerprint = graph.fingerprint()?;

        let exec = uuid::Uuid::new_v4().to_string();
        let storage: Box<dyn Storage> = match &self.spill {
            SpillTarget::Fs => Box::new(FsStorage::new()),
            SpillTarget::Memory(mem) => Box::new(mem.clone()),
        };
        let spill_root = format!("{}/exec-{}", self.cfg.spill_dir.trim_end_matches('/'), exec);
        let ctx = ExecContext {
            cfg: &self.cfg,
            bindings,
            budget: MemoryBudgetImpl::new(self.cfg.mem_cap_bytes),
            spill: Arc::new(Mutex::new(SpillManager::new(storage, self.codec, spill_root))),
        };

        let root = ctx.build(graph)?;
        metrics::execution_started(&exec, &fingerprint, &inputs);
        Ok(TableStream::new(
            root,
            ExecResources {
                exec,
                budget: ctx.budget,
                spill: ctx.spill,
            },
        ))
    }

    /// Execute and collect every output row.
    pub fn run(&self, graph: &Graph, bindings: &Bindings) -> Result<Vec<Row>, ExecError> {
        self.execute(graph, bindings)?.collect_rows()
    }

    /// Execute, collect every output row and describe the run.
    pub fn run_with_manifest(
        &self,
        graph: &Graph,
        bindings: &Bindings,
    ) -> Result<(Vec<Row>, RunManifest), ExecError> {
        let mut rows = Vec::new();
        let manifest = self.for_each_row(graph, bindings, |row| {
            rows.push(row);
            Ok::<(), ExecError>(())
        })?;
        Ok((rows, manifest))
    }

    /// Execute and hand each output row to `sink` as soon as it is produced,
    /// then describe the run. Nothing beyond the operators' own buffers is
    /// held in memory.
    pub fn for_each_row<F, E>(
        &self,
        graph: &Graph,
        bindings: &Bindings,
        mut sink: F,
    ) -> Result<RunManifest, E>
    where
        F: FnMut(Row) -> Result<(), E>,
        E: From<ExecError>,
    {
        let started = now_ms();
        let manifest = RunManifest::new(
            graph.fingerprint().map_err(ExecError::from)?,
            graph.inputs(),
            started,
        );

        let mut stream = self.execute(graph, bindings)?;
        while let Some(row) = stream.pull()? {
            sink(row)?;
        }

        Ok(manifest.finish(
            now_ms(),
            stream.rows_yielded(),
            stream.peak_buffered_bytes() as u64,
            stream.spilled_segments(),
        ))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("cfg", &self.cfg)
            .field("codec", &self.codec)
            .finish()
    }
}

struct ExecContext<'a> {
    cfg: &'a EngineConfig,
    bindings: &'a Bindings,
    budget: MemoryBudgetImpl,
    spill: Arc<Mutex<SpillManager>>,
}

impl ExecContext<'_> {
    /// Instantiate the operator chain for `graph`. Nothing is pulled here.
    fn build(&self, graph: &Graph) -> Result<RowStream, ExecError> {
        let stream: RowStream = match graph.kind() {
            OperationKind::Input { name } => {
                let table = self
                    .bindings
                    .get(name)
                    .ok_or_else(|| ExecError::UnboundInput(name.clone()))?;
                Box::new(SourceStream::new(name.clone(), Arc::clone(table)))
            }
            OperationKind::Map { upstream, mapper } => {
                Box::new(MapStream::new(self.build(upstream)?, Arc::clone(mapper)))
            }
            OperationKind::Reduce {
                upstream,
                reducer,
                keys,
            } => Box::new(ReduceStream::new(
                self.build(upstream)?,
                Arc::clone(reducer),
                keys.clone(),
                self.budget.clone(),
                ReduceOptions {
                    check_group_order: self.cfg.check_group_order,
                },
            )),
            OperationKind::Sort { upstream, keys } => Box::new(SortStream::new(
                self.build(upstream)?,
                keys.clone(),
                self.budget.clone(),
                Some(Arc::clone(&self.spill)),
                SpillId::new(graph.id().get()),
                SortOptions {
                    run_rows: self.cfg.sort_run_rows,
                    chunk_rows: self.cfg.spill_chunk_rows,
                },
            )),
            OperationKind::Fold {
                upstream,
                folder,
                initial,
            } => Box::new(FoldStream::new(
                self.build(upstream)?,
                Arc::clone(folder),
                initial.clone(),
            )),
            OperationKind::Join { left, right, spec } => Box::new(MergeJoinStream::new(
                self.build(left)?,
                self.build(right)?,
                spec.clone(),
                self.budget.clone(),
            )),
        };
        Ok(NodeStream::wrap(graph.id(), graph.kind().label(), stream))
    }
}
