// praxis_core/src/models.rs

//! The human model bank: a fixed, enumerable registry of candidate driver
//! models, one per (rationality level, intended maneuver) pair. Each
//! candidate is Boltzmann-rational: it scores every acceleration in a shared
//! discrete set against its own cost function and softmaxes with its
//! rationality as inverse temperature. A high-rationality candidate
//! concentrates mass on its cheapest action; a low-rationality one spreads
//! out toward uniform.

use serde::{Deserialize, Serialize};

use crate::config::PlannerConfig;
use crate::error::{PlannerError, Result};
use crate::types::{JointState, STATE_V};

/// The maneuver the human is hypothesized to be committed to at the
/// intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Maneuver {
    /// Drive through at free-flow speed.
    Proceed,
    /// Slow down and let the ego cross first.
    Yield,
}

/// Index of a candidate within the bank. Stable for the lifetime of the
/// bank; belief entries are aligned to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId(pub usize);

/// A normalized pmf over the bank's shared acceleration set.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDistribution {
    probs: Vec<f64>,
}

impl ActionDistribution {
    fn from_weights(mut weights: Vec<f64>) -> Self {
        let total: f64 = weights.iter().sum();
        // Weights come from exp(-beta * cost) and are always positive, but
        // guard against underflow to an all-zero vector.
        if total <= 0.0 || !total.is_finite() {
            let uniform = 1.0 / weights.len() as f64;
            weights.iter_mut().for_each(|w| *w = uniform);
        } else {
            weights.iter_mut().for_each(|w| *w /= total);
        }
        Self { probs: weights }
    }

    pub fn probs(&self) -> &[f64] {
        &self.probs
    }

    /// Index of the most probable action; first index wins ties so the
    /// rollouts stay deterministic.
    pub fn argmax(&self) -> usize {
        let mut best = 0;
        for (i, &p) in self.probs.iter().enumerate() {
            if p > self.probs[best] {
                best = i;
            }
        }
        best
    }

    /// Shannon entropy in nats.
    pub fn entropy(&self) -> f64 {
        -self
            .probs
            .iter()
            .filter(|&&p| p > 0.0)
            .map(|&p| p * p.ln())
            .sum::<f64>()
    }
}

/// One hypothesis about the human driver. Immutable after bank construction.
#[derive(Debug, Clone)]
pub struct HumanModelCandidate {
    pub id: ModelId,
    /// Rationality (Boltzmann inverse temperature).
    pub beta: f64,
    pub maneuver: Maneuver,
    /// Attentive candidates react to the ego from the awareness radius;
    /// distracted ones only inside the short reaction radius.
    pub attentive: bool,
}

/// Parameters shared by every candidate's cost function, lifted out of
/// `PlannerConfig` once at construction.
#[derive(Debug, Clone)]
struct BankParams {
    dt: f64,
    desired_speed: f64,
    awareness_radius: f64,
    reaction_radius: f64,
}

/// The fixed registry of human model candidates.
#[derive(Debug, Clone)]
pub struct ModelBank {
    candidates: Vec<HumanModelCandidate>,
    accel_set: Vec<f64>,
    params: BankParams,
}

impl ModelBank {
    /// Builds the cartesian product of configured rationality levels and
    /// maneuvers. Candidate order is (beta-major, maneuver-minor) and fixed
    /// for the lifetime of the bank.
    pub fn from_config(config: &PlannerConfig) -> Result<Self> {
        if config.rationality_levels.is_empty() || config.maneuvers.is_empty() {
            return Err(PlannerError::EmptyBank);
        }
        let mut candidates = Vec::with_capacity(config.bank_size());
        for &beta in &config.rationality_levels {
            for &maneuver in &config.maneuvers {
                candidates.push(HumanModelCandidate {
                    id: ModelId(candidates.len()),
                    beta,
                    maneuver,
                    attentive: beta >= config.attentive_beta_min,
                });
            }
        }
        Ok(Self {
            candidates,
            accel_set: config.human_accel_set.clone(),
            params: BankParams {
                dt: config.dt,
                desired_speed: config.human_desired_speed,
                awareness_radius: config.human_awareness_radius,
                reaction_radius: config.human_reaction_radius,
            },
        })
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn candidates(&self) -> &[HumanModelCandidate] {
        &self.candidates
    }

    /// Shared support of every predicted action distribution.
    pub fn accel_set(&self) -> &[f64] {
        &self.accel_set
    }

    pub fn get(&self, id: ModelId) -> Result<&HumanModelCandidate> {
        self.candidates
            .get(id.0)
            .ok_or(PlannerError::UnknownModel(id.0))
    }

    /// Predicted distribution over the human's next acceleration under
    /// candidate `id`. Deterministic, no side effects.
    pub fn predict(&self, id: ModelId, joint: &JointState) -> Result<ActionDistribution> {
        let candidate = self.get(id)?;
        let weights = self
            .accel_set
            .iter()
            .map(|&a| {
                let cost = self.action_cost(candidate, joint, a);
                (-candidate.beta * cost).exp()
            })
            .collect();
        Ok(ActionDistribution::from_weights(weights))
    }

    /// Cost candidate `c` assigns to taking acceleration `accel` from the
    /// current joint state. Shapes follow the intersection scenario: a
    /// proceeding human tracks its free-flow speed; a yielding human
    /// additionally penalizes speed while the ego is close enough to matter.
    fn action_cost(&self, c: &HumanModelCandidate, joint: &JointState, accel: f64) -> f64 {
        let v_next = (joint.human[STATE_V] + accel * self.params.dt).max(0.0);

        // Speed tracking plus mild comfort penalty on harsh inputs.
        let speed_err = v_next - self.params.desired_speed;
        let mut cost = 0.05 * speed_err * speed_err + 0.02 * accel * accel;

        if c.maneuver == Maneuver::Yield {
            let react_radius = if c.attentive {
                self.params.awareness_radius
            } else {
                self.params.reaction_radius
            };
            let sep = joint.separation();
            if sep < react_radius {
                // The closer the ego, the more any residual speed costs.
                let urgency = 1.0 - sep / react_radius;
                cost += 0.6 * urgency * v_next * v_next;
            }
        }
        cost
    }
}
