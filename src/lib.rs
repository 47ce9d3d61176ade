pub mod card;
pub mod tableau;
pub mod game;
pub mod moves;
pub mod memo;
pub mod search;
pub mod display;
pub mod stats;
pub mod deal;
pub mod canonical_deals;
pub mod error;

use std::path::PathBuf;

use clap::Parser;
use log::{LevelFilter, info};

use crate::display::{print_solution, print_tableau};
use crate::error::SolverError;
use crate::moves::Engine;
use crate::search::{Method, SearchConfig};

/// Command line of the `shenzhen_solver` binary.
#[derive(Debug, Parser)]
#[command(version, about = "Solve a SHENZHEN solitaire deal")]
pub struct Args {
    /// Deal file: one column per line, cards bottom to top.
    #[arg(short, long, default_value = "test/case1.txt")]
    pub filename: PathBuf,

    #[arg(short, long, value_enum, default_value_t = Method::Dfs)]
    pub method: Method,

    /// Depth at which best-first search gives up.
    #[arg(short = 'd', long, default_value_t = 200)]
    pub max_depth: u32,

    /// Random seed for best-first sampling. Any size; separators are ignored.
    #[arg(short, long, default_value = "0")]
    pub seed: String,

    /// Seeds tried by best-first search before giving up.
    #[arg(short, long, default_value_t = 5)]
    pub attempts: u32,

    /// Print the starting board and log every expanded board.
    #[arg(short, long)]
    pub verbose: bool,

    /// Solve a built-in deal instead of reading a file.
    #[arg(long)]
    pub demo: bool,
}

impl Args {
    pub fn search_config(&self) -> Result<SearchConfig, SolverError> {
        Ok(SearchConfig {
            method: self.method,
            max_depth: self.max_depth,
            seed: deal::normalize_seed(&self.seed)?,
            attempts: self.attempts,
            verbose: self.verbose,
            ..SearchConfig::default()
        })
    }
}

/// Log to stderr at `info`, or `debug` with `--verbose`. `RUST_LOG`
/// overrides either.
fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    // A logger may already be installed when running under a test harness.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .try_init();
}

/// Entry point for the `shenzhen_solver` binary.
///
/// Loads the deal (or the built-in one with `--demo`), validates it, runs
/// the selected search and prints the solution as `Step N: <move>` lines.
///
/// Example:
///   cargo run -- -f test/case1.txt -m a_star -s 7
pub fn run() -> Result<(), SolverError> {
    let args = Args::parse();
    init_logging(args.verbose);
    let config = args.search_config()?;

    let tableau = if args.demo {
        info!("using the built-in demo deal");
        canonical_deals::easy_win_deal()
    } else {
        info!("loading {}", args.filename.display());
        deal::load_deal(&args.filename)?
    };

    let mut engine = Engine::new();
    let start = engine.initial_state(tableau)?;
    if args.verbose || args.demo {
        println!("Initial layout:");
        print_tableau(start.tableau());
    }

    let outcome = search::solve(&mut engine, &start, &config);
    match outcome.solution() {
        Some(moves) => {
            println!("Solved with seed {} in {} move(s):", outcome.seed, moves.len());
            print_solution(moves);
        }
        None => println!("No solution found ({:?})", outcome.termination),
    }
    println!("Search stats: {}", outcome.stats);

    Ok(())
}
