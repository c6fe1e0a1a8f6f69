// praxis_core/src/config.rs

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::models::Maneuver;

/// Every tunable the decision engine recognizes. Deserialized from the
/// scenario file by the application layer; the engine itself never touches
/// disk. All fields default to the unsignalized-intersection scenario the
/// planner was developed against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    // --- Horizon & timing ---
    /// Number of planning steps per candidate trajectory.
    pub horizon_steps: usize,
    /// Planner timestep, seconds.
    pub dt: f64,
    /// Episode length bound; the loop terminates after this many cycles.
    pub max_cycles: usize,
    /// Optional wall-clock budget for the EVALUATE phase, milliseconds.
    /// When exceeded, unfinished candidates are abandoned and the previous
    /// cycle's plan supplies the action.
    pub evaluate_deadline_ms: Option<u64>,

    // --- Human model bank ---
    /// Ordered rationality grid (Boltzmann inverse temperatures).
    pub rationality_levels: Vec<f64>,
    /// Intended maneuvers hypothesized for the human.
    pub maneuvers: Vec<Maneuver>,
    /// Candidates with rationality below this threshold model a distracted
    /// driver: their yielding cost ignores the ego outside the reaction
    /// radius.
    pub attentive_beta_min: f64,
    /// Shared discrete support of every predicted human-action distribution.
    pub human_accel_set: Vec<f64>,
    /// Free-flow speed the human tracks, m/s.
    pub human_desired_speed: f64,
    /// Distance at which an attentive human starts reacting to the ego, m.
    pub human_awareness_radius: f64,
    /// Distance at which even a distracted human reacts to the ego, m.
    pub human_reaction_radius: f64,

    // --- Belief ---
    /// Probability floor applied to every posterior entry before
    /// renormalization.
    pub belief_floor: f64,
    /// Gaussian kernel bandwidth for the observed-action likelihood, m/s^2.
    pub likelihood_bandwidth: f64,

    // --- Expected free energy ---
    /// Scalar trading pragmatic cost against epistemic (probing) value.
    pub information_gain_weight: f64,
    pub safety_weight: f64,
    pub goal_weight: f64,
    pub effort_weight: f64,
    /// Flat penalty added when a rollout dips below the collision radius.
    pub collision_penalty: f64,

    // --- Geometry & goal ---
    /// Proximity radius below which risk cost accrues, m.
    pub safety_radius: f64,
    /// Separation treated as a collision, m.
    pub collision_radius: f64,
    /// Center of the ego's (northbound) lane.
    pub ego_lane_x: f64,
    /// The episode goal: ego has crossed the intersection once past this y.
    pub goal_y: f64,
    pub ego_desired_speed: f64,
    /// Coarse no-go bound: candidates that leave the lane corridor by more
    /// than this are filtered out.
    pub road_half_width: f64,

    // --- Candidate generation ---
    pub accel_primitives: Vec<f64>,
    pub steer_primitives: Vec<f64>,
    /// Standard deviation of seeded per-candidate jitter; 0 disables it.
    pub candidate_jitter: f64,

    // --- Kinematic limits ---
    pub max_accel: f64,
    /// Braking magnitude limit (positive number).
    pub max_brake: f64,
    pub max_steer: f64,
    pub max_speed: f64,
    pub wheelbase: f64,
    /// Deceleration used by the fallback safe-stop candidate.
    pub safe_stop_brake: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            horizon_steps: 10,
            dt: 0.25,
            max_cycles: 400,
            evaluate_deadline_ms: None,

            rationality_levels: vec![0.25, 0.5, 1.0],
            maneuvers: vec![Maneuver::Proceed, Maneuver::Yield],
            attentive_beta_min: 0.5,
            human_accel_set: vec![-3.0, -1.5, 0.0, 1.5],
            human_desired_speed: 8.0,
            human_awareness_radius: 15.0,
            human_reaction_radius: 4.0,

            belief_floor: 1e-3,
            likelihood_bandwidth: 0.75,

            information_gain_weight: 1.0,
            safety_weight: 10.0,
            goal_weight: 1.0,
            effort_weight: 0.1,
            collision_penalty: 1e4,

            safety_radius: 3.5,
            collision_radius: 1.5,
            ego_lane_x: 1.0,
            goal_y: 40.0,
            ego_desired_speed: 6.0,
            road_half_width: 2.0,

            accel_primitives: vec![-3.0, -1.5, 0.0, 1.0, 2.0],
            steer_primitives: vec![-0.1, 0.0, 0.1],
            candidate_jitter: 0.0,

            max_accel: 2.0,
            max_brake: 4.0,
            max_steer: 0.5,
            max_speed: 15.0,
            wheelbase: 2.7,
            safe_stop_brake: 2.5,
        }
    }
}

impl PlannerConfig {
    /// Checks the cross-field invariants the engine relies on. Called once
    /// at planner construction; a violation is fatal.
    pub fn validate(&self) -> Result<()> {
        if self.horizon_steps == 0 {
            return Err(PlannerError::InvalidConfig(
                "horizon_steps must be at least 1".into(),
            ));
        }
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(PlannerError::InvalidConfig("dt must be positive".into()));
        }
        if self.rationality_levels.is_empty() || self.maneuvers.is_empty() {
            return Err(PlannerError::InvalidConfig(
                "rationality_levels and maneuvers must be non-empty".into(),
            ));
        }
        if self.rationality_levels.iter().any(|&b| b <= 0.0) {
            return Err(PlannerError::InvalidConfig(
                "rationality levels must be strictly positive".into(),
            ));
        }
        if self.human_accel_set.len() < 2 {
            return Err(PlannerError::InvalidConfig(
                "human_accel_set needs at least two entries".into(),
            ));
        }
        let bank_size = self.rationality_levels.len() * self.maneuvers.len();
        if !(self.belief_floor > 0.0 && self.belief_floor < 1.0 / bank_size as f64) {
            return Err(PlannerError::InvalidConfig(format!(
                "belief_floor must lie in (0, 1/{bank_size})"
            )));
        }
        if self.likelihood_bandwidth <= 0.0 {
            return Err(PlannerError::InvalidConfig(
                "likelihood_bandwidth must be positive".into(),
            ));
        }
        if self.accel_primitives.is_empty() || self.steer_primitives.is_empty() {
            return Err(PlannerError::InvalidConfig(
                "accel_primitives and steer_primitives must be non-empty".into(),
            ));
        }
        if self.collision_radius >= self.safety_radius {
            return Err(PlannerError::InvalidConfig(
                "collision_radius must be smaller than safety_radius".into(),
            ));
        }
        if self.max_brake <= 0.0 || self.safe_stop_brake <= 0.0 || self.safe_stop_brake > self.max_brake {
            return Err(PlannerError::InvalidConfig(
                "brake limits must be positive with safe_stop_brake <= max_brake".into(),
            ));
        }
        if self.wheelbase <= 0.0 {
            return Err(PlannerError::InvalidConfig(
                "wheelbase must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Number of candidates in the model bank this config induces.
    pub fn bank_size(&self) -> usize {
        self.rationality_levels.len() * self.maneuvers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        PlannerConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_zero_horizon() {
        let cfg = PlannerConfig {
            horizon_steps: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_oversized_belief_floor() {
        let cfg = PlannerConfig {
            belief_floor: 0.5,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
