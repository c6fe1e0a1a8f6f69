// praxis_core/src/planner.rs

//! The receding-horizon control loop.
//!
//! One `cycle` call runs UPDATE_BELIEF → GENERATE_CANDIDATES → EVALUATE →
//! SELECT_AND_ACT and returns the committed first action together with a
//! report for the logging/visualization side-channel. The belief is the
//! only state that survives between cycles and is replaced atomically
//! during UPDATE_BELIEF; evaluation reads a fixed belief snapshot.
//!
//! Candidate scoring is fork-join parallel (one scoped thread per
//! candidate, joined before selection). When an evaluation deadline is
//! configured the phase instead runs sequentially so unfinished candidates
//! can be abandoned mid-phase; a blown deadline falls back to the previous
//! cycle's trajectory rather than stalling the control period.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::belief::BeliefState;
use crate::config::PlannerConfig;
use crate::efe::{EfeEvaluator, Score};
use crate::error::{PlannerError, Result};
use crate::models::ModelBank;
use crate::policy::{ActionCandidate, PolicyGenerator};
use crate::propagation::Propagator;
use crate::types::{EgoControl, HumanAction, JointState, Trajectory, STATE_Y};

/// Phases of the planner state machine, exposed for introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerPhase {
    Init,
    AwaitObservation,
    UpdateBelief,
    GenerateCandidates,
    Evaluate,
    SelectAndAct,
    Terminated,
}

/// What the planner receives at the start of every control cycle.
#[derive(Debug, Clone, Copy)]
pub struct Observation {
    pub joint: JointState,
    /// The human's realized acceleration since the previous cycle.
    pub human_action: HumanAction,
    /// Raised by the external safety monitor; ends the episode.
    pub collision: bool,
}

/// A candidate together with its score, for the side-channel.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: ActionCandidate,
    pub score: Score,
}

/// Everything a visualizer/logger wants to see about one cycle. Never feeds
/// back into planning.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: usize,
    pub joint: JointState,
    pub belief: BeliefState,
    pub scored: Vec<ScoredCandidate>,
    /// Rollout of the selected candidate under the most probable hypothesis.
    pub selected_trajectory: Trajectory,
    pub action: EgoControl,
    /// True when the deadline fallback reused the previous cycle's plan.
    pub reused_previous_plan: bool,
}

/// Why the episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    GoalReached,
    Collision,
    MaxCyclesExceeded,
}

/// Result of one control cycle.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    Act(Box<CycleReport>),
    Terminated(Termination),
}

/// The receding-horizon active-inference planner. Owns the belief and the
/// collaborator handles; everything else is per-cycle transient.
pub struct Planner {
    config: PlannerConfig,
    bank: ModelBank,
    belief: BeliefState,
    generator: PolicyGenerator,
    evaluator: EfeEvaluator,
    propagator: Box<dyn Propagator>,
    phase: PlannerPhase,
    cycle_count: usize,
    /// Remaining controls of the last committed candidate, consumed from
    /// the front when the deadline fallback triggers.
    previous_plan: Vec<EgoControl>,
}

impl Planner {
    pub fn new(config: PlannerConfig, propagator: Box<dyn Propagator>) -> Result<Self> {
        config.validate()?;
        let bank = ModelBank::from_config(&config)?;
        let belief = BeliefState::uniform(bank.len())?;
        let generator = PolicyGenerator::new(&config);
        let evaluator = EfeEvaluator::from_config(&config);
        Ok(Self {
            config,
            bank,
            belief,
            generator,
            evaluator,
            propagator,
            phase: PlannerPhase::Init,
            cycle_count: 0,
            previous_plan: Vec::new(),
        })
    }

    /// Replaces the uniform prior; must match the bank size.
    pub fn set_prior(&mut self, prior: BeliefState) -> Result<()> {
        if prior.len() != self.bank.len() {
            return Err(PlannerError::BeliefSizeMismatch {
                belief: prior.len(),
                bank: self.bank.len(),
            });
        }
        self.belief = prior;
        Ok(())
    }

    pub fn phase(&self) -> PlannerPhase {
        self.phase
    }

    pub fn belief(&self) -> &BeliefState {
        &self.belief
    }

    pub fn bank(&self) -> &ModelBank {
        &self.bank
    }

    /// Runs one full control cycle. Precondition violations (malformed
    /// observation, corrupt configuration) are fatal; everything else is
    /// handled inside the cycle.
    pub fn cycle(&mut self, observation: &Observation) -> Result<CycleOutcome> {
        if self.phase == PlannerPhase::Terminated {
            return Err(PlannerError::Terminated);
        }
        if !observation.joint.is_finite() {
            return Err(PlannerError::MalformedObservation(
                "observed joint state contains non-finite components".into(),
            ));
        }

        if let Some(termination) = self.check_termination(observation) {
            info!(?termination, cycles = self.cycle_count, "episode over");
            self.phase = PlannerPhase::Terminated;
            return Ok(CycleOutcome::Terminated(termination));
        }

        // UPDATE_BELIEF. The estimator computes the full posterior before
        // the swap; no reader can observe a partial update.
        self.phase = PlannerPhase::UpdateBelief;
        self.belief.update(
            &self.bank,
            observation.human_action,
            &observation.joint,
            self.config.belief_floor,
            self.config.likelihood_bandwidth,
        )?;

        // GENERATE_CANDIDATES. Guaranteed non-empty.
        self.phase = PlannerPhase::GenerateCandidates;
        let candidates = self.generator.generate(&observation.joint);

        // EVALUATE.
        self.phase = PlannerPhase::Evaluate;
        let deadline = self
            .config
            .evaluate_deadline_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));
        let (scored, deadline_blown) = self.evaluate(&candidates, &observation.joint, deadline);

        if deadline_blown {
            if let Some(report) = self.fallback_to_previous_plan(observation, scored.clone()) {
                self.cycle_count += 1;
                self.phase = PlannerPhase::AwaitObservation;
                return Ok(CycleOutcome::Act(Box::new(report)));
            }
            // No previous plan to reuse; fall through and select from
            // whatever did get scored.
        }

        // SELECT_AND_ACT.
        self.phase = PlannerPhase::SelectAndAct;
        let report = self.select_and_act(observation, scored)?;
        self.cycle_count += 1;
        self.phase = PlannerPhase::AwaitObservation;
        Ok(CycleOutcome::Act(Box::new(report)))
    }

    fn check_termination(&self, observation: &Observation) -> Option<Termination> {
        if observation.collision {
            return Some(Termination::Collision);
        }
        if observation.joint.ego[STATE_Y] >= self.config.goal_y {
            return Some(Termination::GoalReached);
        }
        if self.cycle_count >= self.config.max_cycles {
            return Some(Termination::MaxCyclesExceeded);
        }
        None
    }

    /// Scores every candidate against the belief snapshot. Returns the
    /// successfully scored set plus whether the deadline was blown.
    ///
    /// Without a deadline this is fork-join: one scoped thread per
    /// candidate, each writing only its own slot. With a deadline the loop
    /// runs sequentially so remaining candidates can be abandoned the
    /// moment the budget runs out.
    fn evaluate(
        &self,
        candidates: &[ActionCandidate],
        joint: &JointState,
        deadline: Option<Instant>,
    ) -> (Vec<ScoredCandidate>, bool) {
        let results: Vec<Result<Score>> = match deadline {
            None => {
                let evaluator = &self.evaluator;
                let belief = &self.belief;
                let bank = &self.bank;
                let propagator = self.propagator.as_ref();
                std::thread::scope(|scope| {
                    let handles: Vec<_> = candidates
                        .iter()
                        .map(|candidate| {
                            scope.spawn(move || {
                                evaluator.score(candidate, belief, bank, propagator, joint)
                            })
                        })
                        .collect();
                    handles
                        .into_iter()
                        .map(|h| {
                            h.join().unwrap_or_else(|_| {
                                Err(PlannerError::RolloutDiverged {
                                    step: 0,
                                    reason: "evaluation worker panicked".into(),
                                })
                            })
                        })
                        .collect()
                })
            }
            Some(deadline) => {
                let mut results = Vec::with_capacity(candidates.len());
                for candidate in candidates {
                    if Instant::now() >= deadline {
                        break;
                    }
                    results.push(self.evaluator.score(
                        candidate,
                        &self.belief,
                        &self.bank,
                        self.propagator.as_ref(),
                        joint,
                    ));
                }
                results
            }
        };

        let deadline_blown = results.len() < candidates.len();
        let mut scored = Vec::with_capacity(results.len());
        for (candidate, result) in candidates.iter().zip(results) {
            match result {
                Ok(score) => scored.push(ScoredCandidate {
                    candidate: candidate.clone(),
                    score,
                }),
                Err(err) => {
                    warn!(candidate = candidate.index, %err, "dropping candidate");
                }
            }
        }
        (scored, deadline_blown)
    }

    /// Deadline fallback: serve the next action of the previously committed
    /// plan instead of blocking the control period.
    fn fallback_to_previous_plan(
        &mut self,
        observation: &Observation,
        scored: Vec<ScoredCandidate>,
    ) -> Option<CycleReport> {
        if self.previous_plan.is_empty() {
            return None;
        }
        let action = self.previous_plan.remove(0);
        warn!("evaluation deadline exceeded; reusing previous plan");
        Some(CycleReport {
            cycle: self.cycle_count,
            joint: observation.joint,
            belief: self.belief.clone(),
            scored,
            selected_trajectory: vec![observation.joint],
            action,
            reused_previous_plan: true,
        })
    }

    /// argmin over scores; ties broken by lower control effort, then by
    /// generation order. Falls back to the safe stop when nothing scored.
    fn select_and_act(
        &mut self,
        observation: &Observation,
        mut scored: Vec<ScoredCandidate>,
    ) -> Result<CycleReport> {
        if scored.is_empty() {
            warn!("no candidate survived evaluation; committing safe stop");
            let safe_stop = self.generator.safe_stop(0);
            match self.evaluator.score(
                &safe_stop,
                &self.belief,
                &self.bank,
                self.propagator.as_ref(),
                &observation.joint,
            ) {
                Ok(score) => scored.push(ScoredCandidate {
                    candidate: safe_stop,
                    score,
                }),
                Err(err) => {
                    // Even unscorable, the safe stop is still the action of
                    // last resort; commit it directly.
                    warn!(%err, "safe stop unscorable; committing it unscored");
                    let action = safe_stop.controls[0];
                    self.previous_plan = safe_stop.controls[1..].to_vec();
                    return Ok(CycleReport {
                        cycle: self.cycle_count,
                        joint: observation.joint,
                        belief: self.belief.clone(),
                        scored: Vec::new(),
                        selected_trajectory: vec![observation.joint],
                        action,
                        reused_previous_plan: false,
                    });
                }
            }
        }

        let best = scored
            .iter()
            .min_by(|a, b| {
                a.score
                    .total
                    .total_cmp(&b.score.total)
                    .then(a.candidate.effort.total_cmp(&b.candidate.effort))
                    .then(a.candidate.index.cmp(&b.candidate.index))
            })
            .expect("scored set is non-empty")
            .clone();

        // The report rollout is side-channel only; a failure here must not
        // invalidate an already-selected action.
        let selected_trajectory = self
            .evaluator
            .rollout(
                &best.candidate,
                self.belief.map_candidate(),
                &self.bank,
                self.propagator.as_ref(),
                &observation.joint,
            )
            .unwrap_or_else(|err| {
                warn!(%err, "selected-trajectory rollout failed");
                vec![observation.joint]
            });

        let action = best.candidate.controls[0];
        self.previous_plan = best.candidate.controls[1..].to_vec();
        debug!(
            cycle = self.cycle_count,
            selected = best.candidate.index,
            total = best.score.total,
            pragmatic = best.score.pragmatic,
            epistemic = best.score.epistemic,
            "action committed"
        );

        Ok(CycleReport {
            cycle: self.cycle_count,
            joint: observation.joint,
            belief: self.belief.clone(),
            scored,
            selected_trajectory,
            action,
            reused_previous_plan: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagation::KinematicBicycle;
    use crate::types::VehicleState;

    fn observation() -> Observation {
        Observation {
            joint: JointState::new(
                VehicleState::new(1.0, -10.0, std::f64::consts::FRAC_PI_2, 5.0),
                VehicleState::new(-14.0, 1.0, 0.0, 7.0),
                0.0,
            ),
            human_action: 0.0,
            collision: false,
        }
    }

    fn planner(config: PlannerConfig) -> Planner {
        let propagator = KinematicBicycle::new(config.wheelbase, config.max_steer);
        Planner::new(config, Box::new(propagator)).unwrap()
    }

    #[test]
    fn identical_inputs_select_identical_actions() {
        let obs = observation();
        let mut a = planner(PlannerConfig::default());
        let mut b = planner(PlannerConfig::default());
        for _ in 0..3 {
            let ra = a.cycle(&obs).unwrap();
            let rb = b.cycle(&obs).unwrap();
            match (ra, rb) {
                (CycleOutcome::Act(ra), CycleOutcome::Act(rb)) => {
                    assert_eq!(ra.action, rb.action);
                    assert_eq!(ra.belief, rb.belief);
                }
                _ => panic!("expected both planners to act"),
            }
        }
    }

    #[test]
    fn tie_break_prefers_effort_then_generation_order() {
        let mut p = planner(PlannerConfig::default());
        let obs = observation();
        let score = Score {
            total: 1.0,
            pragmatic: 1.0,
            epistemic: 0.0,
        };
        let mk = |accel: f64, index: usize| ScoredCandidate {
            candidate: ActionCandidate {
                controls: vec![EgoControl::new(accel, 0.0); 10],
                index,
                effort: accel * accel * 10.0,
                is_safe_stop: false,
            },
            score,
        };
        // Equal totals: lower effort must win.
        let report = p
            .select_and_act(&obs, vec![mk(2.0, 0), mk(0.5, 1)])
            .unwrap();
        assert_eq!(report.action, EgoControl::new(0.5, 0.0));

        // Equal totals and efforts: earlier generation index must win.
        // Steering sign distinguishes the candidates without changing the
        // squared effort.
        let mk_steer = |steer: f64, index: usize| ScoredCandidate {
            candidate: ActionCandidate {
                controls: vec![EgoControl::new(1.0, steer); 10],
                index,
                effort: (1.0 + steer * steer) * 10.0,
                is_safe_stop: false,
            },
            score,
        };
        let report = p
            .select_and_act(
                &obs,
                vec![mk_steer(0.1, 3), mk_steer(-0.1, 1), mk_steer(0.1, 2)],
            )
            .unwrap();
        assert_eq!(report.action, EgoControl::new(1.0, -0.1));
    }

    /// A propagator that blows up for specific acceleration commands, used
    /// to inject per-candidate rollout failures.
    struct FailingOn {
        inner: KinematicBicycle,
        poisoned: Vec<f64>,
    }

    impl Propagator for FailingOn {
        fn step(&self, state: &VehicleState, control: &EgoControl, dt: f64) -> VehicleState {
            if self.poisoned.iter().any(|&p| (control[0] - p).abs() < 1e-9) {
                return VehicleState::new(f64::NAN, f64::NAN, f64::NAN, f64::NAN);
            }
            self.inner.step(state, control, dt)
        }
    }

    #[test]
    fn partial_evaluation_failure_degrades_gracefully() {
        // Ten candidates, three of which poison the rollout.
        let config = PlannerConfig {
            accel_primitives: vec![
                -3.5, -3.0, -2.5, -2.0, -1.5, -1.0, -0.5, 0.0, 0.5, 1.0,
            ],
            steer_primitives: vec![0.0],
            ..Default::default()
        };
        let propagator = FailingOn {
            inner: KinematicBicycle::new(config.wheelbase, config.max_steer),
            poisoned: vec![-2.5, -1.0, 0.5],
        };
        let mut p = Planner::new(config, Box::new(propagator)).unwrap();
        match p.cycle(&observation()).unwrap() {
            CycleOutcome::Act(report) => {
                assert_eq!(report.scored.len(), 7);
                assert!(report
                    .scored
                    .iter()
                    .all(|s| s.score.total.is_finite()));
            }
            CycleOutcome::Terminated(_) => panic!("episode should not terminate"),
        }
    }

    #[test]
    fn total_evaluation_failure_falls_back_to_safe_stop() {
        let config = PlannerConfig {
            steer_primitives: vec![0.0],
            ..Default::default()
        };
        // Poison every primitive; only the safe stop (distinct brake value)
        // survives.
        let poisoned = config.accel_primitives.clone();
        let propagator = FailingOn {
            inner: KinematicBicycle::new(config.wheelbase, config.max_steer),
            poisoned,
        };
        let safe_stop_brake = config.safe_stop_brake;
        let mut p = Planner::new(config, Box::new(propagator)).unwrap();
        match p.cycle(&observation()).unwrap() {
            CycleOutcome::Act(report) => {
                assert_eq!(report.action, EgoControl::new(-safe_stop_brake, 0.0));
            }
            CycleOutcome::Terminated(_) => panic!("episode should not terminate"),
        }
    }

    #[test]
    fn goal_and_collision_terminate_the_episode() {
        let mut p = planner(PlannerConfig::default());
        let mut obs = observation();
        obs.collision = true;
        match p.cycle(&obs).unwrap() {
            CycleOutcome::Terminated(t) => assert_eq!(t, Termination::Collision),
            CycleOutcome::Act(_) => panic!("collision must terminate"),
        }
        assert_eq!(p.phase(), PlannerPhase::Terminated);
        assert!(matches!(
            p.cycle(&observation()),
            Err(PlannerError::Terminated)
        ));

        let mut p = planner(PlannerConfig::default());
        let mut obs = observation();
        obs.joint.ego[STATE_Y] = 41.0;
        match p.cycle(&obs).unwrap() {
            CycleOutcome::Terminated(t) => assert_eq!(t, Termination::GoalReached),
            CycleOutcome::Act(_) => panic!("goal must terminate"),
        }
    }

    #[test]
    fn non_finite_observation_is_a_precondition_violation() {
        let mut p = planner(PlannerConfig::default());
        let mut obs = observation();
        obs.joint.ego[0] = f64::NAN;
        assert!(matches!(
            p.cycle(&obs),
            Err(PlannerError::MalformedObservation(_))
        ));
    }
}
