//! Keeps the pairwise consistent inter-robot loop closures of two pose graphs.
//!
//! Usage:
//!   pcm robot1.g2o robot2.g2o interrobot.g2o
//!   pcm robot1.g2o robot2.g2o interrobot.g2o retained.txt --confidence 0.99 --heuristic

use clap::Parser;
use pcm::io::read_g2o_file;
use pcm::{solve_pose_graphs, CliqueMethod, PcmConfig};

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Measurements of robot 1 (.g2o)
    robot1: PathBuf,

    /// Measurements of robot 2 (.g2o)
    robot2: PathBuf,

    /// Inter-robot loop closures (.g2o)
    interrobot: PathBuf,

    /// Output file of the consistent loop closures
    output: Option<PathBuf>,

    /// Chi-squared threshold on the squared Mahalanobis distance
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Confidence level of the chi-squared threshold (0.90, 0.95 or 0.99)
    #[arg(short = 'p', long)]
    confidence: Option<f64>,

    /// Use the hand-picked thresholds (0.58 in 2D, 2.20 in 3D)
    #[arg(long)]
    legacy_threshold: bool,

    /// Greedy maximum clique instead of the exact search
    #[arg(long)]
    heuristic: bool,

    /// Work budget of the maximum clique search
    #[arg(long)]
    budget: Option<usize>,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file of the consistency graph (Matrix Market)
    #[arg(short, long)]
    graph: Option<PathBuf>,

    /// Output file of the pruned pose graph (.g2o)
    #[arg(long)]
    pose_graph: Option<PathBuf>,
}

/// Configuration file overridden by the command line
fn load_config(args: &Args) -> pcm::Result<PcmConfig> {
    let mut config = match &args.config {
        Some(path) => PcmConfig::load(path)?,
        None => PcmConfig::default(),
    };

    if args.threshold.is_some() {
        config.threshold = args.threshold;
    }
    if let Some(confidence) = args.confidence {
        config.confidence = confidence;
    }
    if args.legacy_threshold {
        config.legacy_threshold = true;
    }
    if args.heuristic {
        config.clique_method = CliqueMethod::Heuristic;
    }
    if args.budget.is_some() {
        config.clique_budget = args.budget;
    }
    if args.output.is_some() {
        config.loop_closures_path = args.output.clone();
    }
    if args.graph.is_some() {
        config.consistency_graph_path = args.graph.clone();
    }
    if args.pose_graph.is_some() {
        config.pose_graph_path = args.pose_graph.clone();
    }
    Ok(config)
}

fn run(args: &Args) -> pcm::Result<()> {
    let config = load_config(args)?;

    let robot1 = read_g2o_file(&args.robot1, false)?;
    let robot2 = read_g2o_file(&args.robot2, false)?;
    let interrobot = read_g2o_file(&args.interrobot, true)?;

    let loop_closures = solve_pose_graphs(robot1, robot2, interrobot, &config)?;

    println!("Size of the maximum clique: {}", loop_closures.len());
    if let Some(path) = &config.loop_closures_path {
        println!("Consistent loop closures saved in {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
