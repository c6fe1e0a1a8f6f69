// praxis_core/src/belief.rs

//! Bayesian belief over the human model bank.
//!
//! The belief is the only state that persists across control cycles. One
//! update runs per cycle: each candidate's likelihood for the observed human
//! acceleration is computed through a Gaussian kernel against the
//! candidate's predicted pmf (a smoothed action distance, so an observation
//! outside every candidate's support still yields informative, non-zero
//! likelihoods), then the posterior is floored and renormalized. The new
//! probability vector is built in full before it replaces the old one.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PlannerError, Result};
use crate::models::{ModelBank, ModelId};
use crate::types::{HumanAction, JointState};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeliefState {
    probs: Vec<f64>,
}

impl BeliefState {
    /// Uniform prior over `n` candidates.
    pub fn uniform(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(PlannerError::EmptyBank);
        }
        Ok(Self {
            probs: vec![1.0 / n as f64; n],
        })
    }

    /// Prior from explicit weights; normalizes, rejects non-positive mass.
    pub fn from_prior(weights: Vec<f64>) -> Result<Self> {
        if weights.is_empty() {
            return Err(PlannerError::EmptyBank);
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(PlannerError::MalformedObservation(
                "prior weights must be finite and non-negative".into(),
            ));
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(PlannerError::MalformedObservation(
                "prior weights sum to zero".into(),
            ));
        }
        Ok(Self {
            probs: weights.into_iter().map(|w| w / total).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    pub fn probs(&self) -> &[f64] {
        &self.probs
    }

    pub fn prob(&self, id: ModelId) -> f64 {
        self.probs.get(id.0).copied().unwrap_or(0.0)
    }

    /// Most probable candidate; lowest index wins ties.
    pub fn map_candidate(&self) -> ModelId {
        let mut best = 0;
        for (i, &p) in self.probs.iter().enumerate() {
            if p > self.probs[best] {
                best = i;
            }
        }
        ModelId(best)
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

    /// Entropy scaled to [0, 1] by the uniform-distribution maximum.
    pub fn normalized_entropy(&self) -> f64 {
        if self.probs.len() < 2 {
            return 0.0;
        }
        self.entropy() / (self.probs.len() as f64).ln()
    }

    /// One Bayesian cycle: posterior(c) ∝ prior(c) · L(c | observed),
    /// normalized and then mixed with a small uniform component so every
    /// entry stays at or above `floor` and no hypothesis ever becomes
    /// unreachable. The update is atomic: the new vector is computed in
    /// full, then swapped in.
    pub fn update(
        &mut self,
        bank: &ModelBank,
        observed: HumanAction,
        joint: &JointState,
        floor: f64,
        bandwidth: f64,
    ) -> Result<()> {
        if !observed.is_finite() {
            return Err(PlannerError::MalformedObservation(format!(
                "observed human acceleration is not finite: {observed}"
            )));
        }
        if !joint.is_finite() {
            return Err(PlannerError::MalformedObservation(
                "joint state contains non-finite components".into(),
            ));
        }
        if self.probs.len() != bank.len() {
            return Err(PlannerError::BeliefSizeMismatch {
                belief: self.probs.len(),
                bank: bank.len(),
            });
        }

        let mut posterior = Vec::with_capacity(self.probs.len());
        for candidate in bank.candidates() {
            let dist = bank.predict(candidate.id, joint)?;
            let likelihood = kernel_likelihood(observed, bank.accel_set(), dist.probs(), bandwidth);
            posterior.push(self.probs[candidate.id.0] * likelihood);
        }

        let total: f64 = posterior.iter().sum();
        if total > 0.0 && total.is_finite() {
            posterior.iter_mut().for_each(|p| *p /= total);
        } else {
            // Every likelihood underflowed; keep the prior rather than
            // collapsing to garbage. The floor pass below still applies.
            debug!("all likelihoods underflowed; retaining prior belief");
            posterior.copy_from_slice(&self.probs);
        }

        // Apply the floor as a uniform mixture: p <- (1 - nε)p + ε. This
        // keeps the sum at exactly one while guaranteeing every entry >= ε,
        // which a floor-then-renormalize pass does not.
        let lambda = floor * posterior.len() as f64;
        posterior
            .iter_mut()
            .for_each(|p| *p = (1.0 - lambda) * *p + floor);

        debug!(posterior = ?posterior, "belief updated");
        self.probs = posterior;
        Ok(())
    }
}

/// Likelihood of an observed acceleration under a discrete predicted pmf,
/// smoothed by a Gaussian kernel over action distance. Never returns zero
/// for finite inputs.
fn kernel_likelihood(observed: f64, support: &[f64], probs: &[f64], bandwidth: f64) -> f64 {
    let inv_two_bw2 = 1.0 / (2.0 * bandwidth * bandwidth);
    support
        .iter()
        .zip(probs)
        .map(|(&a, &p)| {
            let d = observed - a;
            p * (-d * d * inv_two_bw2).exp()
        })
        .sum::<f64>()
        .max(f64::MIN_POSITIVE)
}
