// praxis_sim/src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Praxis: closed-loop intersection episodes against a simulated human
/// driver, planned by the active-inference engine in `praxis_core`.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The path to the scenario TOML file to run.
    #[arg(short, long, default_value = "assets/scenarios/intersection.toml")]
    pub scenario: PathBuf,

    /// Seed for the ground-truth human's action noise.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Overrides the scenario's cycle limit.
    #[arg(long)]
    pub cycles: Option<usize>,
}
