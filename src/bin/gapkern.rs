//! gapkern CLI - run one graph kernel on a loaded or generated graph.
//!
//! # Usage
//!
//! ```bash
//! # BFS on a Kronecker graph with 2^20 vertices, 16 trials
//! gapkern bfs -g 20 -n 16
//!
//! # SSSP on a weighted file, fixed source, verified
//! gapkern sssp -f road.wel -r 0 -d 50 -v
//!
//! # Triangle counting on a symmetrized uniform graph, with statistics
//! gapkern tc -u 18 -s -a
//!
//! # Convert an edge list into the serialized format
//! gapkern convert -f web.el -s -o web.sg
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use gapkern::algo::bfs::tree_stats;
use gapkern::algo::cc::component_stats;
use gapkern::algo::sssp::reached_count;
use gapkern::algo::{
    afforest, brandes, delta_step, direction_optimizing_bfs, pagerank_pull, shiloach_vishkin, triangle_count,
    KernelConfig,
};
use gapkern::benchmark::{run_trials, top_k, SourcePicker, TrialConfig, TrialReport};
use gapkern::graph::io::write_graph;
use gapkern::graph::{make_graph, CompactGraph, Destination, GraphSource, WeightedNode};
use gapkern::verify::{verify_bc, verify_bfs, verify_cc, verify_pagerank, verify_sssp, verify_tc};
use gapkern::error::{EXIT_FAILURE, EXIT_VERIFY_FAILED};
use gapkern::GraphError;

type Node = i32;
type WNode = WeightedNode<Node, i32>;

/// Number of entries printed by `--analysis` rankings.
const TOP_K: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Kernel {
    /// Direction-optimizing breadth-first search
    Bfs,
    /// Delta-stepping shortest paths (weighted)
    Sssp,
    /// Connected components via Afforest
    Cc,
    /// Connected components via Shiloach-Vishkin
    CcSv,
    /// Approximate betweenness centrality
    Bc,
    /// Pull PageRank
    Pr,
    /// Triangle counting (needs -s)
    Tc,
    /// Build the graph and write it to --output
    Convert,
}

#[derive(Parser, Debug)]
#[command(name = "gapkern")]
#[command(about = "Parallel graph kernel benchmarks", long_about = None)]
#[command(group(ArgGroup::new("input").required(true).args(["file", "scale", "uniform"])))]
struct Cli {
    /// Kernel to run
    #[arg(value_enum)]
    kernel: Kernel,

    /// Load graph from file (.el .wel .gr .graph .sg .wsg)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Generate a Kronecker graph with 2^SCALE vertices
    #[arg(short = 'g', long = "gen")]
    scale: Option<u32>,

    /// Generate a uniform-random graph with 2^SCALE vertices
    #[arg(short, long, value_name = "SCALE")]
    uniform: Option<u32>,

    /// Symmetrize the input edge list
    #[arg(short, long, default_value_t = false)]
    symmetrize: bool,

    /// Average degree of generated graphs
    #[arg(short = 'k', long, default_value_t = 16)]
    degree: usize,

    /// Number of timed trials
    #[arg(short = 'n', long, default_value_t = 16)]
    trials: usize,

    /// Start vertex (random vertices with edges otherwise)
    #[arg(short = 'r', long)]
    source: Option<i64>,

    /// Iterations: BC sources per trial, PageRank iteration cap
    #[arg(short, long)]
    iters: Option<usize>,

    /// SSSP bucket width
    #[arg(short, long)]
    delta: Option<i64>,

    /// Log kernel statistics for the last trial
    #[arg(short, long, default_value_t = false)]
    analysis: bool,

    /// Verify every trial against a serial oracle
    #[arg(short, long, default_value_t = false)]
    verify: bool,

    /// Worker threads (rayon default otherwise)
    #[arg(long)]
    threads: Option<usize>,

    /// JSON file with kernel parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output path for `convert`
    #[arg(short, long, required_if_eq("kernel", "convert"))]
    output: Option<PathBuf>,

    /// Build a weighted graph for `convert`
    #[arg(short, long, default_value_t = false)]
    weighted: bool,
}

impl Cli {
    fn graph_source(&self) -> GraphSource {
        match (&self.file, self.scale, self.uniform) {
            (Some(path), _, _) => GraphSource::File(path.clone()),
            (None, Some(scale), _) => GraphSource::Synthetic {
                scale,
                degree: self.degree,
                uniform: false,
            },
            (None, None, scale) => GraphSource::Synthetic {
                scale: scale.unwrap_or_default(),
                degree: self.degree,
                uniform: true,
            },
        }
    }

    fn kernel_config(&self) -> Result<KernelConfig> {
        let mut config = match &self.config {
            Some(path) => KernelConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
            None => KernelConfig::default(),
        };
        if let Some(iters) = self.iters {
            config.bc.num_iters = iters;
            config.pagerank.max_iters = iters;
        }
        if let Some(delta) = self.delta {
            config.sssp.delta = delta;
        }
        if config.sssp.delta <= 0 {
            return Err(GraphError::InvalidDelta(config.sssp.delta).into());
        }
        Ok(config)
    }

    fn trial_config(&self) -> TrialConfig {
        TrialConfig {
            num_trials: self.trials,
            analysis: self.analysis,
            verify: self.verify,
        }
    }

    fn load<D: Destination>(&self) -> Result<CompactGraph<D>> {
        let g = make_graph(&self.graph_source(), self.symmetrize)?;
        g.log_stats();
        Ok(g)
    }
}

fn passed(report: &TrialReport) -> bool {
    report.verified != Some(false)
}

fn run_bfs(cli: &Cli, config: &KernelConfig) -> Result<bool> {
    let g: CompactGraph<Node> = cli.load()?;
    let mut picker = SourcePicker::new(&g, cli.source)?;
    let report = run_trials(
        &g,
        &cli.trial_config(),
        |g| {
            let source = picker.pick_next();
            (source, direction_optimizing_bfs(g, source, &config.bfs))
        },
        |g, (_, parent)| {
            let (reached, edges) = tree_stats(g, parent);
            info!(reached, edges, "bfs tree");
        },
        |g, (source, parent)| verify_bfs(g, *source, parent),
    );
    Ok(passed(&report))
}

fn run_sssp(cli: &Cli, config: &KernelConfig) -> Result<bool> {
    let delta = i32::try_from(config.sssp.delta).map_err(|_| GraphError::InvalidDelta(config.sssp.delta))?;
    let g: CompactGraph<WNode> = cli.load()?;
    let mut picker = SourcePicker::new(&g, cli.source)?;
    let report = run_trials(
        &g,
        &cli.trial_config(),
        |g| {
            let source = picker.pick_next();
            (source, delta_step(g, source, delta))
        },
        |_, (_, dist)| info!(reached = reached_count(dist), "sssp tree"),
        |g, (source, dist)| verify_sssp(g, *source, dist),
    );
    Ok(passed(&report))
}

fn run_cc(cli: &Cli, config: &KernelConfig, sv: bool) -> Result<bool> {
    let g: CompactGraph<Node> = cli.load()?;
    let report = run_trials(
        &g,
        &cli.trial_config(),
        |g| {
            if sv {
                shiloach_vishkin(g)
            } else {
                afforest(g, &config.afforest)
            }
        },
        |_, comp| {
            let (count, largest) = component_stats(comp, TOP_K);
            for (label, size) in largest {
                info!(%label, size, "component");
            }
            info!(count, "components");
        },
        |g, comp| verify_cc(g, comp),
    );
    Ok(passed(&report))
}

fn run_bc(cli: &Cli, config: &KernelConfig) -> Result<bool> {
    let g: CompactGraph<Node> = cli.load()?;
    let mut picker = SourcePicker::new(&g, cli.source)?;
    let num_iters = config.bc.num_iters;
    let report = run_trials(
        &g,
        &cli.trial_config(),
        |g| {
            let sources: Vec<Node> = (0..num_iters).map(|_| picker.pick_next()).collect();
            let scores = brandes(g, &sources);
            (sources, scores)
        },
        |_, (_, scores)| {
            for (vertex, score) in top_k(scores.iter().copied().enumerate(), TOP_K) {
                info!(vertex, score, "bc");
            }
        },
        |g, (sources, scores)| verify_bc(g, sources, scores),
    );
    Ok(passed(&report))
}

fn run_pr(cli: &Cli, config: &KernelConfig) -> Result<bool> {
    let g: CompactGraph<Node> = cli.load()?;
    let report = run_trials(
        &g,
        &cli.trial_config(),
        |g| pagerank_pull(g, &config.pagerank),
        |_, scores| {
            for (vertex, score) in top_k(scores.iter().copied().enumerate(), TOP_K) {
                info!(vertex, score, "pagerank");
            }
        },
        |g, scores| verify_pagerank(g, scores, &config.pagerank),
    );
    Ok(passed(&report))
}

fn run_tc(cli: &Cli, config: &KernelConfig) -> Result<bool> {
    let g: CompactGraph<Node> = cli.load()?;
    if g.directed() {
        return Err(GraphError::DirectedInput("triangle counting").into());
    }
    let report = run_trials(
        &g,
        &cli.trial_config(),
        |g| triangle_count(g, &config.tc),
        |_, total| {
            if let Ok(total) = total {
                info!(total, "triangles");
            }
        },
        |g, total| matches!(total, Ok(count) if verify_tc(g, *count)),
    );
    Ok(passed(&report))
}

fn run_convert(cli: &Cli) -> Result<bool> {
    let output = cli.output.as_deref().context("convert needs --output")?;
    if cli.weighted {
        write_graph(&cli.load::<WNode>()?, output)?;
    } else {
        write_graph(&cli.load::<Node>()?, output)?;
    }
    info!(path = %output.display(), "wrote graph");
    Ok(true)
}

fn run(cli: &Cli) -> Result<bool> {
    let config = cli.kernel_config()?;
    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = cli.threads {
        pool = pool.num_threads(threads);
    }
    let pool = pool.build().context("building thread pool")?;
    info!(threads = pool.current_num_threads(), kernel = ?cli.kernel, "starting");

    pool.install(|| match cli.kernel {
        Kernel::Bfs => run_bfs(cli, &config),
        Kernel::Sssp => run_sssp(cli, &config),
        Kernel::Cc => run_cc(cli, &config, false),
        Kernel::CcSv => run_cc(cli, &config, true),
        Kernel::Bc => run_bc(cli, &config),
        Kernel::Pr => run_pr(cli, &config),
        Kernel::Tc => run_tc(cli, &config),
        Kernel::Convert => run_convert(cli),
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_VERIFY_FAILED),
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(err.downcast_ref::<GraphError>().map_or(EXIT_FAILURE, GraphError::exit_code))
        }
    }
}
