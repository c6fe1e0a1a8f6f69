// praxis_sim/src/main.rs

mod cli;
mod episode;
mod human;
mod scenario;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use scenario::ScenarioConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Cli::parse();
    info!(scenario = %args.scenario.display(), seed = args.seed, "loading scenario");

    let mut scenario = ScenarioConfig::load(&args.scenario)?;
    if let Some(cycles) = args.cycles {
        scenario.planner.max_cycles = cycles;
    }
    scenario.planner.validate()?;

    let summary = episode::run(&scenario, args.seed)?;

    println!("============================================================");
    println!("Episode Summary");
    println!("============================================================");
    println!("True human maneuver:        {:?}", scenario.human.maneuver);
    println!("True human rationality:     {:.4}", scenario.human.beta);
    println!("Passed intersection:        {}", summary.passed_intersection);
    println!("Collision occurred:         {}", summary.collision);
    println!("Total control cycles:       {}", summary.cycles);
    println!("Min inter-vehicle distance: {:.2} m", summary.min_separation);
    println!("Final belief over models:");
    for (prob, candidate) in summary
        .final_belief
        .iter()
        .zip(praxis_core::prelude::ModelBank::from_config(&scenario.planner)?.candidates())
    {
        println!(
            "  beta={:.2} maneuver={:?} attentive={} -> {:.4}",
            candidate.beta, candidate.maneuver, candidate.attentive, prob
        );
    }
    println!("============================================================");
    Ok(())
}
