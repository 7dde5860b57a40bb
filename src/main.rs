use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use unitig_caller::graph::colours::ColourVector;
use unitig_caller::io::lists;
use unitig_caller::output::{self, ColourOutputs, MatchWriter};
use unitig_caller::pool::RayonPool;
use unitig_caller::{
    call_unitigs, query_unitigs, BuildOpt, ColouredDbg, ColouredGraph, GraphInput, IndexBackend, SearchEngine,
    SearchOpt,
};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(
    name = "unitig-caller",
    author,
    version,
    about = "Call presence/absence of sequences across a population",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Worker threads
    #[arg(short = 't', long, default_value_t = 1, global = true)]
    threads: usize,
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Exact substring search of queries in every strain (FM-index)
    Simple {
        /// Strain list: 'name<TAB>path' per line
        #[arg(long)]
        refs: PathBuf,
        /// Queries, FASTA or one per line
        #[arg(long)]
        unitigs: PathBuf,
        /// Output prefix; writes <prefix>.pyseer
        #[arg(short, long)]
        output: String,
        /// Do not persist built indexes next to the strain files
        #[arg(long)]
        no_save_idx: bool,
        #[arg(long, value_enum, default_value_t = IndexBackend::Fm)]
        backend: IndexBackend,
    },
    /// Colour every unitig of a coloured de Bruijn graph
    Call(GraphArgs),
    /// Colour the given sequences against a coloured de Bruijn graph
    Query {
        #[command(flatten)]
        graph: GraphArgs,
        /// Queries, FASTA or one per line
        #[arg(long)]
        unitigs: PathBuf,
    },
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).multiple(true).args(["refs", "reads", "graph"])))]
struct GraphArgs {
    /// File listing reference sequence files, one per line
    #[arg(long)]
    refs: Option<PathBuf>,
    /// File listing read files, one per line
    #[arg(long)]
    reads: Option<PathBuf>,
    /// Prefix of an existing graph (<prefix>.gfa + <prefix>.bfg_colors)
    #[arg(long, conflicts_with_all = ["refs", "reads"])]
    graph: Option<String>,
    /// Output prefix; writes <prefix>.tsv
    #[arg(short, long)]
    output: String,
    #[arg(short = 'k', long, default_value_t = 31)]
    kmer_size: usize,
    /// Also write the built graph to <output>.gfa / <output>.bfg_colors
    #[arg(long)]
    write_graph: bool,
    /// Clip tips and remove short isolated unitigs
    #[arg(long)]
    clean: bool,
    /// Also write <prefix>.rtab
    #[arg(long)]
    rtab: bool,
    /// Also write <prefix>.pyseer
    #[arg(long)]
    pyseer: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("unitig_caller=debug,info")
        } else {
            EnvFilter::new("unitig_caller=info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let pool = RayonPool::new(cli.threads)?;
    match cli.command {
        Commands::Simple { refs, unitigs, output, no_save_idx, backend } => {
            let opt = SearchOpt { backend, write_index: !no_save_idx };
            run_simple(&refs, &unitigs, &output, &opt, &pool)
        }
        Commands::Call(args) => {
            let graph = load_or_build(&args, &pool)?;
            let mut rows: Vec<(String, Option<ColourVector>)> =
                call_unitigs(&graph).into_iter().map(|(seq, c)| (seq, Some(c))).collect();
            rows.sort_unstable_by(|a, b| a.0.cmp(&b.0));
            write_colours(&args, &graph, &rows)
        }
        Commands::Query { graph: args, unitigs } => {
            let graph = load_or_build(&args, &pool)?;
            let queries = lists::read_queries(&unitigs)
                .with_context(|| format!("cannot read queries from '{}'", unitigs.display()))?;
            let rows = query_unitigs(&graph, &queries, &pool);
            write_colours(&args, &graph, &rows)
        }
    }
}

fn run_simple(refs: &Path, unitigs: &Path, output: &str, opt: &SearchOpt, pool: &RayonPool) -> Result<()> {
    let strains = lists::read_strain_list(refs)
        .with_context(|| format!("cannot read strain list '{}'", refs.display()))?;
    if strains.is_empty() {
        bail!("strain list '{}' is empty", refs.display());
    }
    let queries = lists::read_queries(unitigs)
        .with_context(|| format!("cannot read queries from '{}'", unitigs.display()))?;

    let engine = SearchEngine::build(&strains, opt, pool)?;
    info!(indexes = engine.len(), "indexes ready");
    let out_path = PathBuf::from(format!("{output}.pyseer"));
    let out = MatchWriter::create(&out_path)?;
    let written = engine.call_strings(&queries, &out)?;
    info!(written, output = %out_path.display(), "search results saved");
    Ok(())
}

fn load_or_build(args: &GraphArgs, pool: &RayonPool) -> Result<ColouredDbg> {
    if let Some(prefix) = &args.graph {
        let gfa = PathBuf::from(format!("{prefix}.gfa"));
        let colours = PathBuf::from(format!("{prefix}.bfg_colors"));
        info!(graph = %gfa.display(), "Loading graph...");
        return ColouredDbg::load(&gfa, &colours)
            .with_context(|| format!("cannot load graph '{}'", gfa.display()));
    }

    let mut input = GraphInput::default();
    if let Some(list) = &args.refs {
        input.refs = lists::read_file_list(list)
            .with_context(|| format!("cannot read reference list '{}'", list.display()))?;
    }
    if let Some(list) = &args.reads {
        input.reads = lists::read_file_list(list)
            .with_context(|| format!("cannot read read list '{}'", list.display()))?;
    }
    let opt = BuildOpt { kmer_size: args.kmer_size, clean: args.clean };
    let graph = ColouredDbg::build(&input, &opt, pool)?;
    if args.write_graph {
        graph.write(&args.output)?;
        info!(prefix = %args.output, "graph written");
    }
    Ok(graph)
}

fn write_colours(args: &GraphArgs, graph: &ColouredDbg, rows: &[(String, Option<ColourVector>)]) -> Result<()> {
    let names: Vec<String> = graph
        .colour_names()
        .iter()
        .map(|p| lists::file_stem_name(Path::new(p)))
        .collect();
    let outputs = ColourOutputs { rtab: args.rtab, pyseer: args.pyseer };
    output::write_colour_results(&args.output, &names, rows, outputs)?;
    info!(rows = rows.len(), output = %args.output, "colour results saved");
    Ok(())
}
