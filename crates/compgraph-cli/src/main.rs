//! compgraph CLI: run the bundled pipelines over JSON-lines or CSV files.

mod pipelines;

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use compgraph_core::config::EngineConfig;
use compgraph_exec::{Bindings, Engine, Graph};
use compgraph_io::{CsvFile, JsonlWriter, LineFile};

#[derive(Parser)]
#[command(name = "compgraph")]
#[command(about = "Run computational-graph pipelines over row files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count every word across all documents
    WordCount {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Most frequent long words
    TopWords {
        #[command(flatten)]
        run: RunArgs,

        /// Only words longer than this many characters are counted
        #[arg(long, default_value_t = 7)]
        min_length: usize,

        /// Number of words to report
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Input file, one document per row
    #[arg(short, long)]
    input: PathBuf,

    /// Read the input as CSV with a header row instead of JSON lines
    #[arg(long)]
    csv: bool,

    /// Output file for result rows (JSON lines); stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Column holding the document text
    #[arg(long, default_value = "text")]
    text_column: String,

    /// Column to write counts into
    #[arg(long, default_value = "count")]
    count_column: String,

    /// Print the graph instead of running it
    #[arg(long)]
    explain: bool,

    /// Print the run manifest (JSON) to stderr after the run
    #[arg(long)]
    manifest: bool,

    /// Memory cap in bytes (overrides COMPGRAPH_MEM_CAP_BYTES)
    #[arg(long)]
    memory_cap: Option<usize>,

    /// Spill directory (overrides COMPGRAPH_SPILL_DIR)
    #[arg(long)]
    spill_dir: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::WordCount { run } => {
            let graph = pipelines::word_count_graph(&run.text_column, &run.count_column);
            run_graph(&graph, &run)
        }
        Commands::TopWords {
            run,
            min_length,
            top,
        } => {
            let graph =
                pipelines::top_words_graph(&run.text_column, &run.count_column, min_length, top);
            run_graph(&graph, &run)
        }
    }
}

fn run_graph(graph: &Graph, args: &RunArgs) -> anyhow::Result<()> {
    if args.explain {
        print!("{}", graph.explain());
        return Ok(());
    }

    let mut config = EngineConfig::from_env();
    if let Some(cap) = args.memory_cap {
        config.mem_cap_bytes = cap;
    }
    if let Some(dir) = &args.spill_dir {
        config.spill_dir = dir.clone();
    }
    let engine = Engine::new(config).context("invalid engine configuration")?;

    let bindings = if args.csv {
        Bindings::new().bind(pipelines::INPUT, CsvFile::new(&args.input))
    } else {
        Bindings::new().bind(pipelines::INPUT, LineFile::jsonl(&args.input))
    };

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = JsonlWriter::to_writer(out);

    let manifest = engine
        .for_each_row(graph, &bindings, |row| -> anyhow::Result<()> {
            writer.write_row(&row)?;
            Ok(())
        })
        .with_context(|| format!("running pipeline over {}", args.input.display()))?;
    writer.flush()?;
    tracing::info!(rows = writer.rows_written(), "results written");

    if args.manifest {
        eprintln!("{}", serde_json::to_string_pretty(&manifest)?);
    }
    Ok(())
}
