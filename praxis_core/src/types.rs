// praxis_core/src/types.rs

use nalgebra::{Vector2, Vector4};

// --- Core Type Aliases ---

/// Planar vehicle state: `[x, y, heading, v]`.
/// Units: meters, meters, radians, meters/second.
pub type VehicleState = Vector4<f64>;

/// Ego control input: `[accel, steer]`.
/// Units: meters/second^2, radians.
pub type EgoControl = Vector2<f64>;

/// The human's decision variable is longitudinal acceleration only; the
/// human vehicle is lane-constrained, so steering carries no intent signal.
pub type HumanAction = f64;

// --- State vector index names ---
pub const STATE_X: usize = 0;
pub const STATE_Y: usize = 1;
pub const STATE_HEADING: usize = 2;
pub const STATE_V: usize = 3;

/// An immutable snapshot of both vehicles at one discrete timestep.
/// Produced by the propagator (during rollouts) or by external observation
/// (at the start of a control cycle); consumed by every component.
#[derive(Debug, Clone, Copy)]
pub struct JointState {
    pub ego: VehicleState,
    pub human: VehicleState,
    /// Simulation time of this snapshot, seconds.
    pub time: f64,
}

impl JointState {
    pub fn new(ego: VehicleState, human: VehicleState, time: f64) -> Self {
        Self { ego, human, time }
    }

    /// Euclidean distance between the two vehicle origins.
    pub fn separation(&self) -> f64 {
        let dx = self.ego[STATE_X] - self.human[STATE_X];
        let dy = self.ego[STATE_Y] - self.human[STATE_Y];
        (dx * dx + dy * dy).sqrt()
    }

    /// True if every component of both states is finite.
    pub fn is_finite(&self) -> bool {
        self.ego.iter().all(|c| c.is_finite())
            && self.human.iter().all(|c| c.is_finite())
            && self.time.is_finite()
    }
}

/// An ordered sequence of joint states produced by rolling a candidate out
/// through the propagator (ego side) and one human model (human side).
pub type Trajectory = Vec<JointState>;
