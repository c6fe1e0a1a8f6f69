// praxis_core/src/propagation.rs

//! Kinematics used during rollouts. The planner treats the propagator as a
//! black-box collaborator behind a trait so an integration can substitute
//! its own vehicle model; the kinematic bicycle below is the default.

use crate::types::{EgoControl, VehicleState, STATE_HEADING, STATE_V, STATE_X, STATE_Y};

/// Pure single-step kinematics: `step(state, control, dt) -> next_state`.
/// Implementations must be deterministic and side-effect free; they are
/// called concurrently from the evaluation phase.
pub trait Propagator: Send + Sync {
    fn step(&self, state: &VehicleState, control: &EgoControl, dt: f64) -> VehicleState;
}

/// Kinematic bicycle model for car-like vehicles.
/// State `[x, y, heading, v]`, control `[accel, steer]`:
/// x_dot = v cos(heading), y_dot = v sin(heading),
/// heading_dot = v tan(steer) / wheelbase, v_dot = accel.
#[derive(Debug, Clone)]
pub struct KinematicBicycle {
    /// Distance between front and rear axles, meters.
    pub wheelbase: f64,
    /// Maximum allowable steering angle, radians.
    pub max_steer: f64,
}

impl KinematicBicycle {
    pub fn new(wheelbase: f64, max_steer: f64) -> Self {
        Self {
            wheelbase,
            max_steer,
        }
    }
}

impl Propagator for KinematicBicycle {
    fn step(&self, state: &VehicleState, control: &EgoControl, dt: f64) -> VehicleState {
        let heading = state[STATE_HEADING];
        let v = state[STATE_V];
        let steer = control[1].clamp(-self.max_steer, self.max_steer);

        let heading_dot = if self.wheelbase.abs() < 1e-6 {
            0.0
        } else {
            v * steer.tan() / self.wheelbase
        };

        VehicleState::new(
            state[STATE_X] + v * heading.cos() * dt,
            state[STATE_Y] + v * heading.sin() * dt,
            heading + heading_dot * dt,
            // No reverse gear in this scenario.
            (v + control[0] * dt).max(0.0),
        )
    }
}

/// Advances the lane-constrained human: straight-line motion along its
/// current heading under a scalar acceleration.
pub fn step_human(state: &VehicleState, accel: f64, dt: f64) -> VehicleState {
    let heading = state[STATE_HEADING];
    let v = state[STATE_V];
    VehicleState::new(
        state[STATE_X] + v * heading.cos() * dt,
        state[STATE_Y] + v * heading.sin() * dt,
        heading,
        (v + accel * dt).max(0.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EgoControl;
    use approx::assert_abs_diff_eq;

    #[test]
    fn straight_line_integration() {
        let model = KinematicBicycle::new(2.7, 0.5);
        let start = VehicleState::new(0.0, 0.0, 0.0, 10.0);
        let next = model.step(&start, &EgoControl::new(0.0, 0.0), 0.1);
        assert_abs_diff_eq!(next[STATE_X], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(next[STATE_Y], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(next[STATE_V], 10.0, epsilon = 1e-12);
    }

    #[test]
    fn speed_never_goes_negative() {
        let model = KinematicBicycle::new(2.7, 0.5);
        let start = VehicleState::new(0.0, 0.0, 0.0, 0.5);
        let next = model.step(&start, &EgoControl::new(-4.0, 0.0), 1.0);
        assert_eq!(next[STATE_V], 0.0);
    }

    #[test]
    fn steering_is_clamped() {
        let model = KinematicBicycle::new(2.7, 0.1);
        let start = VehicleState::new(0.0, 0.0, 0.0, 5.0);
        let clamped = model.step(&start, &EgoControl::new(0.0, 2.0), 0.1);
        let at_limit = model.step(&start, &EgoControl::new(0.0, 0.1), 0.1);
        assert_abs_diff_eq!(
            clamped[STATE_HEADING],
            at_limit[STATE_HEADING],
            epsilon = 1e-12
        );
    }
}
