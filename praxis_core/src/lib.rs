// praxis_core/src/lib.rs

//! Active-inference motion planning for an ego vehicle interacting with one
//! human-driven vehicle of unknown rationality and intent. The planner
//! maintains a Bayesian belief over a fixed bank of human driver models and
//! selects receding-horizon trajectories by expected free energy: predicted
//! risk/goal cost minus a configurable weight times the expected
//! information gain about which model is driving.

pub mod belief;
pub mod config;
pub mod efe;
pub mod error;
pub mod models;
pub mod planner;
pub mod policy;
pub mod prelude;
pub mod propagation;
pub mod types;
