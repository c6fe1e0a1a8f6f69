// praxis_core/src/efe.rs

//! Expected free energy scoring.
//!
//! Each candidate is rolled out once per human-model hypothesis: the ego
//! follows the candidate controls through the propagator while the human
//! follows the hypothesis' most probable predicted action. The pragmatic
//! term is the belief-weighted sum of proximity risk, goal deviation, and
//! control effort over those rollouts. The epistemic term is the per-step
//! mutual information between model identity and the predicted human action
//! (entropy of the belief-weighted mixture pmf minus the belief-weighted
//! entropies), summed over the horizon and gated by the normalized belief
//! entropy so a confident belief stops paying for probing.
//!
//! total = pragmatic − information_gain_weight · epistemic. Lower is better.

use crate::belief::BeliefState;
use crate::config::PlannerConfig;
use crate::error::{PlannerError, Result};
use crate::models::{ModelBank, ModelId};
use crate::policy::ActionCandidate;
use crate::propagation::{step_human, Propagator};
use crate::types::{JointState, Trajectory, STATE_V, STATE_X};

/// Scalar expected free energy of one candidate, with its decomposition
/// kept for logging. Lower `total` is more desirable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub total: f64,
    pub pragmatic: f64,
    pub epistemic: f64,
}

pub struct EfeEvaluator {
    dt: f64,
    information_gain_weight: f64,
    safety_weight: f64,
    goal_weight: f64,
    effort_weight: f64,
    collision_penalty: f64,
    safety_radius: f64,
    collision_radius: f64,
    ego_lane_x: f64,
    ego_desired_speed: f64,
}

impl EfeEvaluator {
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            dt: config.dt,
            information_gain_weight: config.information_gain_weight,
            safety_weight: config.safety_weight,
            goal_weight: config.goal_weight,
            effort_weight: config.effort_weight,
            collision_penalty: config.collision_penalty,
            safety_radius: config.safety_radius,
            collision_radius: config.collision_radius,
            ego_lane_x: config.ego_lane_x,
            ego_desired_speed: config.ego_desired_speed,
        }
    }

    /// Scores one candidate against the current belief. Deterministic, no
    /// side effects; an `Err` drops only this candidate.
    pub fn score(
        &self,
        candidate: &ActionCandidate,
        belief: &BeliefState,
        bank: &ModelBank,
        propagator: &dyn Propagator,
        joint: &JointState,
    ) -> Result<Score> {
        if belief.len() != bank.len() {
            return Err(PlannerError::BeliefSizeMismatch {
                belief: belief.len(),
                bank: bank.len(),
            });
        }

        // Hypotheses with mass; the belief floor keeps all of them alive,
        // but a caller-supplied prior may zero some out.
        let supported: Vec<ModelId> = bank
            .candidates()
            .iter()
            .map(|c| c.id)
            .filter(|&id| belief.prob(id) > 0.0)
            .collect();
        if supported.is_empty() {
            return Err(PlannerError::EmptyBank);
        }

        let mut ego = joint.ego;
        let mut humans: Vec<_> = supported.iter().map(|_| joint.human).collect();
        let mut pragmatic_runs = vec![0.0_f64; supported.len()];
        let mut info_sum = 0.0;
        let mut time = joint.time;

        for (step, u) in candidate.controls.iter().enumerate() {
            // Predictive distribution per hypothesis at this future state.
            let mut dists = Vec::with_capacity(supported.len());
            for (h, &id) in supported.iter().enumerate() {
                let js = JointState::new(ego, humans[h], time);
                dists.push(bank.predict(id, &js)?);
            }
            info_sum += mutual_information(belief, &supported, &dists);

            // Advance the joint rollout one step.
            ego = propagator.step(&ego, u, self.dt);
            if !ego.iter().all(|c| c.is_finite()) {
                return Err(PlannerError::RolloutDiverged {
                    step,
                    reason: "ego state became non-finite".into(),
                });
            }
            for (h, dist) in dists.iter().enumerate() {
                let accel = bank.accel_set()[dist.argmax()];
                humans[h] = step_human(&humans[h], accel, self.dt);
                if !humans[h].iter().all(|c| c.is_finite()) {
                    return Err(PlannerError::RolloutDiverged {
                        step,
                        reason: "human state became non-finite".into(),
                    });
                }
                let js = JointState::new(ego, humans[h], time + self.dt);
                pragmatic_runs[h] += self.step_cost(&js);
            }
            time += self.dt;
        }

        let mut pragmatic = self.effort_weight * candidate.effort;
        for (h, &id) in supported.iter().enumerate() {
            pragmatic += belief.prob(id) * pragmatic_runs[h];
        }
        let epistemic = belief.normalized_entropy() * info_sum;
        let total = pragmatic - self.information_gain_weight * epistemic;
        if !total.is_finite() {
            return Err(PlannerError::RolloutDiverged {
                step: candidate.controls.len(),
                reason: "score is not finite".into(),
            });
        }

        Ok(Score {
            total,
            pragmatic,
            epistemic,
        })
    }

    /// Rolls the candidate out under a single hypothesis, returning the
    /// joint trajectory. Used for the per-cycle report/visualization
    /// side-channel.
    pub fn rollout(
        &self,
        candidate: &ActionCandidate,
        hypothesis: ModelId,
        bank: &ModelBank,
        propagator: &dyn Propagator,
        joint: &JointState,
    ) -> Result<Trajectory> {
        let mut trajectory = Vec::with_capacity(candidate.controls.len() + 1);
        let mut current = *joint;
        trajectory.push(current);
        for (step, u) in candidate.controls.iter().enumerate() {
            let dist = bank.predict(hypothesis, &current)?;
            let accel = bank.accel_set()[dist.argmax()];
            let ego = propagator.step(&current.ego, u, self.dt);
            let human = step_human(&current.human, accel, self.dt);
            current = JointState::new(ego, human, current.time + self.dt);
            if !current.is_finite() {
                return Err(PlannerError::RolloutDiverged {
                    step,
                    reason: "rollout state became non-finite".into(),
                });
            }
            trajectory.push(current);
        }
        Ok(trajectory)
    }

    /// Per-step pragmatic cost at one predicted joint state.
    fn step_cost(&self, js: &JointState) -> f64 {
        let mut cost = 0.0;

        // (a) Collision / proximity risk.
        let d = js.separation();
        if d < self.collision_radius {
            cost += self.collision_penalty;
        } else if d < self.safety_radius {
            let ramp =
                (self.safety_radius - d) / (self.safety_radius - self.collision_radius);
            cost += self.safety_weight * ramp * ramp;
        }

        // (b) Deviation from the reference: stay in lane, keep desired speed.
        let lane_err = js.ego[STATE_X] - self.ego_lane_x;
        let speed_err = js.ego[STATE_V] - self.ego_desired_speed;
        cost += self.goal_weight * (lane_err * lane_err + 0.25 * speed_err * speed_err);

        cost
    }
}

/// I(model; next action) over the shared discrete action set:
/// H(Σ_c b_c p_c) − Σ_c b_c H(p_c). Zero when all hypotheses predict the
/// same distribution; bounded above by the belief entropy.
fn mutual_information(
    belief: &BeliefState,
    supported: &[ModelId],
    dists: &[crate::models::ActionDistribution],
) -> f64 {
    let n_actions = dists[0].probs().len();
    let mut mixture = vec![0.0_f64; n_actions];
    let mut weighted_entropy = 0.0;
    let mass: f64 = supported.iter().map(|&id| belief.prob(id)).sum();
    for (&id, dist) in supported.iter().zip(dists) {
        let w = belief.prob(id) / mass;
        for (m, &p) in mixture.iter_mut().zip(dist.probs()) {
            *m += w * p;
        }
        weighted_entropy += w * dist.entropy();
    }
    let mixture_entropy = -mixture
        .iter()
        .filter(|&&p| p > 0.0)
        .map(|&p| p * p.ln())
        .sum::<f64>();
    (mixture_entropy - weighted_entropy).max(0.0)
}
