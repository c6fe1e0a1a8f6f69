// praxis_core/src/error.rs

use thiserror::Error;

/// Failure modes of the decision engine.
///
/// Precondition violations (`UnknownModel`, `MalformedObservation`,
/// `InvalidConfig`, `EmptyBank`) are programming or configuration errors and
/// abort the cycle. `RolloutDiverged` is recoverable: the planner drops the
/// offending candidate and continues with the rest.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("unknown human model id {0}")]
    UnknownModel(usize),

    #[error("malformed observation: {0}")]
    MalformedObservation(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("human model bank is empty")]
    EmptyBank,

    #[error("rollout diverged at step {step}: {reason}")]
    RolloutDiverged { step: usize, reason: String },

    #[error("belief has {belief} entries but the bank has {bank} candidates")]
    BeliefSizeMismatch { belief: usize, bank: usize },

    #[error("planner episode already terminated")]
    Terminated,
}

pub type Result<T> = std::result::Result<T, PlannerError>;
