//! gto CLI - Command-line interface for the gto solver
//!
//! Solves a spot described by a JSON params file, reports the size of its
//! abstracted tree, evaluates hands and benchmarks the evaluator.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gto_engine::abstraction::BasicAbstraction;
use gto_engine::card::parse_cards;
use gto_engine::cfr::{create_solver, Solver, SolverCore, SolverKind};
use gto_engine::config::CfrResult;
use gto_engine::evaluator::{benchmark_throughput, HandEvaluator, MaskEvaluator};
use gto_engine::game::{Action, GameState};
use gto_tree::{build_root, measure, ParamsFile};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "gto", version)]
#[command(about = "CFR solver for no-limit hold'em river spots")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve the spot described by a params file
    Solve {
        /// JSON file with `solver_config` and `game_config`
        #[arg(short, long)]
        params_file: PathBuf,
        /// vanilla, mccfr or cfr-plus; defaults from `use_chance_sampling`
        #[arg(short, long)]
        solver: Option<String>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output_format: OutputFormat,
        /// Resume from this checkpoint before solving
        #[arg(short, long)]
        checkpoint: Option<PathBuf>,
    },
    /// Print the size of the abstracted tree below the configured root
    Tree {
        #[arg(short, long)]
        params_file: PathBuf,
    },
    /// Evaluate five to seven cards, e.g. "AsKsQsJsTs"
    Eval { cards: String },
    /// Benchmarks
    Bench {
        #[command(subcommand)]
        target: BenchTarget,
    },
}

#[derive(Subcommand)]
enum BenchTarget {
    /// Seven-card evaluator throughput
    Evaluator {
        #[arg(default_value_t = 1_000_000)]
        sample_size: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

/// Root strategy of the acting seat, one entry per abstracted action
#[derive(Serialize)]
struct ActionWeight {
    action: String,
    probability: f64,
}

#[derive(Serialize)]
struct SolveReport<'a> {
    success: bool,
    solver: String,
    result: &'a CfrResult,
    player: usize,
    strategy: Vec<ActionWeight>,
    metadata: &'a ParamsFile,
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let json_errors = matches!(
        cli.command,
        Commands::Solve {
            output_format: OutputFormat::Json,
            ..
        }
    );
    if let Err(e) = run(cli.command) {
        if json_errors {
            println!("{}", serde_json::json!({ "success": false, "error": format!("{e:#}") }));
        } else {
            eprintln!("error: {e:#}");
        }
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Solve {
            params_file,
            solver,
            output_format,
            checkpoint,
        } => solve(&params_file, solver.as_deref(), output_format, checkpoint.as_deref()),
        Commands::Tree { params_file } => tree(&params_file),
        Commands::Eval { cards } => eval(&cards),
        Commands::Bench {
            target: BenchTarget::Evaluator { sample_size },
        } => {
            bench_evaluator(sample_size);
            Ok(())
        }
    }
}

fn load_params(path: &Path) -> Result<ParamsFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read params file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("cannot parse params file {}", path.display()))
}

fn solve(
    params_file: &Path,
    solver_name: Option<&str>,
    format: OutputFormat,
    checkpoint: Option<&Path>,
) -> Result<()> {
    let params = load_params(params_file)?;
    let root = build_root(&params.game_config).context("invalid game_config")?;

    let kind = match solver_name {
        Some(name) => name.parse::<SolverKind>()?,
        None if params.solver_config.use_chance_sampling => SolverKind::ExternalSampling,
        None => SolverKind::Vanilla,
    };

    let evaluator: Arc<dyn HandEvaluator> = Arc::new(MaskEvaluator::new());
    let abstraction = Arc::new(BasicAbstraction::new(evaluator.clone()));
    let core = SolverCore::new(abstraction, evaluator, params.solver_config.clone());
    let mut solver = create_solver(kind, core);

    if let Some(path) = checkpoint {
        solver
            .load_checkpoint(path)
            .with_context(|| format!("cannot resume from {}", path.display()))?;
    }

    info!("{:<32}{}", "root", root.to_string().trim_end());
    let result = solver.solve(&root)?;
    let player = root.current_player;
    let strategy = root_strategy(solver.as_ref(), &root, player);

    match format {
        OutputFormat::Json => {
            let report = SolveReport {
                success: true,
                solver: kind.to_string(),
                result: &result,
                player,
                strategy,
                metadata: &params,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("Solver: {kind}");
            println!("{result}");
            println!();
            println!("Strategy for player {player}:");
            for weight in &strategy {
                println!("  {:<16}{:.4}", weight.action, weight.probability);
            }
        }
    }
    Ok(())
}

fn root_strategy(solver: &dyn Solver, root: &GameState, player: usize) -> Vec<ActionWeight> {
    let probabilities = solver.strategy(root, player);
    let actions: Vec<Action> = solver.core().abstraction().abstracted_actions(root);
    actions
        .iter()
        .zip(probabilities)
        .map(|(action, probability)| ActionWeight {
            action: action.to_string(),
            probability,
        })
        .collect()
}

fn tree(params_file: &Path) -> Result<()> {
    let params = load_params(params_file)?;
    let root = build_root(&params.game_config).context("invalid game_config")?;
    let evaluator: Arc<dyn HandEvaluator> = Arc::new(MaskEvaluator::new());
    let abstraction = BasicAbstraction::new(evaluator);
    let stats = measure(&root, &abstraction)?;

    println!("Nodes:      {}", stats.nodes);
    println!("Decisions:  {}", stats.decisions);
    println!("Terminals:  {}", stats.terminals);
    println!("Max depth:  {}", stats.max_depth);
    Ok(())
}

fn eval(text: &str) -> Result<()> {
    let cards = parse_cards(text)?;
    if !(5..=7).contains(&cards.len()) {
        bail!("expected 5 to 7 cards, got {}", cards.len());
    }
    let strength = MaskEvaluator::new().evaluate(&cards)?;
    println!("Category: {}", strength.category());
    println!("Strength: {}", strength.value());
    Ok(())
}

fn bench_evaluator(sample_size: usize) {
    println!("Running hand evaluator benchmark...");
    println!("Sample size: {} hands", sample_size);
    let (evals_per_sec, duration_ms) = benchmark_throughput(sample_size);

    println!("Results:");
    println!("  Duration: {} ms", duration_ms);
    println!("  Throughput: {:.2} evals/sec", evals_per_sec);
    println!("  Throughput: {:.2}M evals/sec", evals_per_sec / 1_000_000.0);
}
