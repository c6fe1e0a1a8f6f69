// praxis_sim/src/episode.rs

//! The closed-loop episode runner: observation → planner cycle → world
//! step, repeated until the planner terminates. Acts as the external
//! safety monitor (collision detection) and as the logging side-channel
//! consumer; nothing here feeds back into planning beyond the observation.

use tracing::{debug, info};

use praxis_core::prelude::{
    step_human, CycleOutcome, JointState, KinematicBicycle, Observation, Planner, Propagator,
    Result, Termination,
};

use crate::human::GroundTruthHuman;
use crate::scenario::ScenarioConfig;

/// End-of-episode statistics, mirroring the analysis the planner was
/// originally evaluated with.
#[derive(Debug, Clone)]
pub struct EpisodeSummary {
    pub termination: Termination,
    pub cycles: usize,
    pub passed_intersection: bool,
    pub collision: bool,
    pub min_separation: f64,
    pub final_belief: Vec<f64>,
    pub ego_trajectory: Vec<[f64; 4]>,
    pub human_trajectory: Vec<[f64; 4]>,
}

pub fn run(scenario: &ScenarioConfig, seed: u64) -> Result<EpisodeSummary> {
    let config = &scenario.planner;
    let world = KinematicBicycle::new(config.wheelbase, config.max_steer);
    let mut planner = Planner::new(
        config.clone(),
        Box::new(KinematicBicycle::new(config.wheelbase, config.max_steer)),
    )?;
    let mut human = GroundTruthHuman::new(config, &scenario.human, seed)?;

    let mut joint = scenario.start.joint_state();
    let mut human_action = 0.0;
    let mut min_separation = f64::INFINITY;
    let mut cycles = 0;
    let mut ego_trajectory = vec![vehicle_row(&joint, true)];
    let mut human_trajectory = vec![vehicle_row(&joint, false)];

    let termination = loop {
        min_separation = min_separation.min(joint.separation());
        let observation = Observation {
            joint,
            human_action,
            collision: joint.separation() < config.collision_radius,
        };

        match planner.cycle(&observation)? {
            CycleOutcome::Act(report) => {
                debug!(
                    cycle = report.cycle,
                    belief = ?report.belief.probs(),
                    accel = report.action[0],
                    steer = report.action[1],
                    separation = joint.separation(),
                    reused = report.reused_previous_plan,
                    "cycle complete"
                );
                human_action = human.act(&joint)?;
                let ego = world.step(&joint.ego, &report.action, config.dt);
                let next_human = step_human(&joint.human, human_action, config.dt);
                joint = JointState::new(ego, next_human, joint.time + config.dt);
                ego_trajectory.push(vehicle_row(&joint, true));
                human_trajectory.push(vehicle_row(&joint, false));
                cycles += 1;
            }
            CycleOutcome::Terminated(t) => break t,
        }
    };

    let summary = EpisodeSummary {
        termination,
        cycles,
        passed_intersection: termination == Termination::GoalReached,
        collision: termination == Termination::Collision,
        min_separation,
        final_belief: planner.belief().probs().to_vec(),
        ego_trajectory,
        human_trajectory,
    };
    info!(
        termination = ?summary.termination,
        cycles = summary.cycles,
        min_separation = summary.min_separation,
        "episode finished"
    );
    Ok(summary)
}

fn vehicle_row(joint: &JointState, ego: bool) -> [f64; 4] {
    let s = if ego { &joint.ego } else { &joint.human };
    [s[0], s[1], s[2], s[3]]
}
