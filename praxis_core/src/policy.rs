// praxis_core/src/policy.rs

//! Candidate ego trajectory generation. Candidates are constant-primitive
//! control sequences (one accel and one steer held over the horizon), the
//! cartesian product of the configured primitive sets, filtered for
//! kinematic feasibility and a coarse lane corridor. The generator is
//! guaranteed to return at least one candidate: when every primitive
//! combination is filtered out, it falls back to a straight-line safe stop.

use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::PlannerConfig;
use crate::propagation::{KinematicBicycle, Propagator};
use crate::types::{EgoControl, JointState, STATE_V, STATE_X};

/// One candidate ego action sequence over the planning horizon.
#[derive(Debug, Clone)]
pub struct ActionCandidate {
    pub controls: Vec<EgoControl>,
    /// Position in generation order; the final tie-break key.
    pub index: usize,
    /// Accumulated squared control magnitude, used as the first tie-break.
    pub effort: f64,
    pub is_safe_stop: bool,
}

impl ActionCandidate {
    fn new(controls: Vec<EgoControl>, index: usize, is_safe_stop: bool) -> Self {
        let effort = controls.iter().map(|u| u[0] * u[0] + u[1] * u[1]).sum();
        Self {
            controls,
            index,
            effort,
            is_safe_stop,
        }
    }
}

pub struct PolicyGenerator {
    accel_primitives: Vec<f64>,
    steer_primitives: Vec<f64>,
    horizon_steps: usize,
    dt: f64,
    max_accel: f64,
    max_brake: f64,
    max_steer: f64,
    max_speed: f64,
    ego_lane_x: f64,
    road_half_width: f64,
    safe_stop_brake: f64,
    jitter: f64,
    feasibility_model: KinematicBicycle,
    rng: Option<ChaCha8Rng>,
}

impl PolicyGenerator {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            accel_primitives: config.accel_primitives.clone(),
            steer_primitives: config.steer_primitives.clone(),
            horizon_steps: config.horizon_steps,
            dt: config.dt,
            max_accel: config.max_accel,
            max_brake: config.max_brake,
            max_steer: config.max_steer,
            max_speed: config.max_speed,
            ego_lane_x: config.ego_lane_x,
            road_half_width: config.road_half_width,
            safe_stop_brake: config.safe_stop_brake,
            jitter: config.candidate_jitter,
            feasibility_model: KinematicBicycle::new(config.wheelbase, config.max_steer),
            rng: None,
        }
    }

    /// Enables seeded per-step jitter on the primitives. Without a seed the
    /// generator is fully deterministic.
    pub fn with_seed(config: &PlannerConfig, seed: u64) -> Self {
        let mut gen = Self::new(config);
        gen.rng = Some(ChaCha8Rng::seed_from_u64(seed));
        gen
    }

    /// Produces the candidate set for this cycle. Never empty.
    pub fn generate(&mut self, joint: &JointState) -> Vec<ActionCandidate> {
        let mut candidates = Vec::new();
        let mut index = 0;

        let accel_primitives = self.accel_primitives.clone();
        let steer_primitives = self.steer_primitives.clone();
        for &accel in &accel_primitives {
            for &steer in &steer_primitives {
                let controls = self.build_sequence(accel, steer);
                if self.is_feasible(joint, &controls) {
                    candidates.push(ActionCandidate::new(controls, index, false));
                    index += 1;
                }
            }
        }

        if candidates.is_empty() {
            debug!("all primitive candidates infeasible; emitting safe stop only");
            candidates.push(self.safe_stop(index));
        }
        candidates
    }

    /// The fallback trajectory: hold the lane and brake comfortably to a
    /// halt. Always kinematically feasible.
    pub fn safe_stop(&self, index: usize) -> ActionCandidate {
        let controls = vec![EgoControl::new(-self.safe_stop_brake, 0.0); self.horizon_steps];
        ActionCandidate::new(controls, index, true)
    }

    fn build_sequence(&mut self, accel: f64, steer: f64) -> Vec<EgoControl> {
        let jitter = self.jitter;
        (0..self.horizon_steps)
            .map(|_| {
                let (da, ds) = match self.rng.as_mut() {
                    Some(rng) if jitter > 0.0 => (
                        rng.gen_range(-jitter..=jitter),
                        // Steering jitter an order of magnitude smaller;
                        // primitives are radians, not m/s^2.
                        rng.gen_range(-jitter..=jitter) * 0.1,
                    ),
                    _ => (0.0, 0.0),
                };
                EgoControl::new(accel + da, steer + ds)
            })
            .collect()
    }

    /// Rolls the sequence through the feasibility model: control limits,
    /// speed envelope, and the coarse lane corridor (no-go region check).
    pub(crate) fn is_feasible(&self, joint: &JointState, controls: &[EgoControl]) -> bool {
        for u in controls {
            if u[0] > self.max_accel || u[0] < -self.max_brake || u[1].abs() > self.max_steer {
                return false;
            }
        }
        let mut state = joint.ego;
        for u in controls {
            state = self.feasibility_model.step(&state, u, self.dt);
            if state[STATE_V] > self.max_speed {
                return false;
            }
            if (state[STATE_X] - self.ego_lane_x).abs() > self.road_half_width {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VehicleState;

    fn joint() -> JointState {
        JointState::new(
            VehicleState::new(1.0, -10.0, std::f64::consts::FRAC_PI_2, 5.0),
            VehicleState::new(-12.0, 1.0, 0.0, 7.0),
            0.0,
        )
    }

    #[test]
    fn always_returns_candidates() {
        let config = PlannerConfig::default();
        let mut gen = PolicyGenerator::new(&config);
        let candidates = gen.generate(&joint());
        assert!(!candidates.is_empty());
        // Indices follow generation order without gaps.
        for (i, c) in candidates.iter().enumerate() {
            assert_eq!(c.index, i);
        }
    }

    #[test]
    fn all_infeasible_yields_exactly_the_safe_stop() {
        // Every accel primitive violates the accel limits.
        let config = PlannerConfig {
            accel_primitives: vec![9.0, -9.0],
            ..Default::default()
        };
        let mut gen = PolicyGenerator::new(&config);
        let candidates = gen.generate(&joint());
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].is_safe_stop);
        assert!(candidates[0]
            .controls
            .iter()
            .all(|u| u[0] == -config.safe_stop_brake && u[1] == 0.0));
    }

    #[test]
    fn generation_is_deterministic_without_a_seed() {
        let config = PlannerConfig::default();
        let a = PolicyGenerator::new(&config).generate(&joint());
        let b = PolicyGenerator::new(&config).generate(&joint());
        assert_eq!(a.len(), b.len());
        for (ca, cb) in a.iter().zip(&b) {
            assert_eq!(ca.controls, cb.controls);
            assert_eq!(ca.index, cb.index);
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let config = PlannerConfig {
            candidate_jitter: 0.2,
            ..Default::default()
        };
        let a = PolicyGenerator::with_seed(&config, 7).generate(&joint());
        let b = PolicyGenerator::with_seed(&config, 7).generate(&joint());
        for (ca, cb) in a.iter().zip(&b) {
            assert_eq!(ca.controls, cb.controls);
        }
    }
}
