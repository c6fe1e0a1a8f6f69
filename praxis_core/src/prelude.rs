// praxis_core/src/prelude.rs

//! Convenience re-exports for downstream crates.

pub use crate::belief::BeliefState;
pub use crate::config::PlannerConfig;
pub use crate::efe::{EfeEvaluator, Score};
pub use crate::error::{PlannerError, Result};
pub use crate::models::{ActionDistribution, HumanModelCandidate, Maneuver, ModelBank, ModelId};
pub use crate::planner::{
    CycleOutcome, CycleReport, Observation, Planner, PlannerPhase, ScoredCandidate, Termination,
};
pub use crate::policy::{ActionCandidate, PolicyGenerator};
pub use crate::propagation::{step_human, KinematicBicycle, Propagator};
pub use crate::types::{
    EgoControl, HumanAction, JointState, Trajectory, VehicleState, STATE_HEADING, STATE_V,
    STATE_X, STATE_Y,
};
