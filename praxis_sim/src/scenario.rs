// praxis_sim/src/scenario.rs

//! Scenario loading. A scenario file bundles the planner configuration with
//! the ground-truth human parameters (which the planner never sees) and the
//! initial vehicle states.

use std::path::Path;

use figment::{
    providers::{Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use praxis_core::prelude::{JointState, Maneuver, PlannerConfig, VehicleState};

/// Ground truth about the simulated human driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrueHumanConfig {
    /// The human's actual rationality.
    pub beta: f64,
    /// The human's actual intended maneuver.
    pub maneuver: Maneuver,
    /// Whether the human pays attention to the ego beyond the short
    /// reaction radius.
    pub attentive: bool,
    /// Standard deviation of execution noise on the realized acceleration.
    pub noise_std: f64,
}

impl Default for TrueHumanConfig {
    fn default() -> Self {
        Self {
            beta: 1.0,
            maneuver: Maneuver::Yield,
            attentive: true,
            noise_std: 0.15,
        }
    }
}

/// Initial `[x, y, heading, v]` for both vehicles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StartConfig {
    pub ego: [f64; 4],
    pub human: [f64; 4],
}

impl Default for StartConfig {
    fn default() -> Self {
        Self {
            // Ego heads north toward the intersection; the human heads east.
            ego: [1.0, -15.0, std::f64::consts::FRAC_PI_2, 5.0],
            human: [-25.0, 1.0, 0.0, 8.0],
        }
    }
}

impl StartConfig {
    pub fn joint_state(&self) -> JointState {
        JointState::new(
            VehicleState::from_row_slice(&self.ego),
            VehicleState::from_row_slice(&self.human),
            0.0,
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub planner: PlannerConfig,
    pub human: TrueHumanConfig,
    pub start: StartConfig,
}

impl ScenarioConfig {
    /// Loads and parses the scenario file. Missing sections fall back to
    /// the intersection defaults.
    pub fn load(path: &Path) -> Result<Self, figment::Error> {
        Figment::new().merge(Toml::file(path)).extract()
    }
}
