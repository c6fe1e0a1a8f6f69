// praxis_sim/src/human.rs

//! The ground-truth human driver. Reuses the core model machinery with a
//! single-candidate bank built from the scenario's true parameters, samples
//! an acceleration from that model's Boltzmann distribution each cycle, and
//! corrupts it with execution noise. The planner only ever sees the
//! realized acceleration.

use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::Normal;

use praxis_core::prelude::{JointState, ModelBank, ModelId, PlannerConfig, Result};

use crate::scenario::TrueHumanConfig;

pub struct GroundTruthHuman {
    bank: ModelBank,
    noise: Normal<f64>,
    rng: ChaCha8Rng,
}

impl GroundTruthHuman {
    pub fn new(planner_config: &PlannerConfig, human: &TrueHumanConfig, seed: u64) -> Result<Self> {
        // A bank of exactly one candidate: the true human.
        let config = PlannerConfig {
            rationality_levels: vec![human.beta],
            maneuvers: vec![human.maneuver],
            attentive_beta_min: if human.attentive { 0.0 } else { f64::INFINITY },
            ..planner_config.clone()
        };
        let bank = ModelBank::from_config(&config)?;
        Ok(Self {
            bank,
            noise: Normal::new(0.0, human.noise_std.max(1e-9))
                .expect("noise_std is finite and non-negative"),
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// The realized acceleration for this control period.
    pub fn act(&mut self, joint: &JointState) -> Result<f64> {
        let dist = self.bank.predict(ModelId(0), joint)?;
        let idx = WeightedIndex::new(dist.probs())
            .expect("predicted distribution is normalized and non-negative")
            .sample(&mut self.rng);
        let accel = self.bank.accel_set()[idx] + self.noise.sample(&mut self.rng);
        Ok(accel)
    }
}
