// praxis_core/tests/planner_cycle.rs

//! Closed-loop tests of the full decision engine: belief convergence,
//! probing behavior when only information differs between candidates, the
//! deadline fallback, and a complete intersection episode.

use praxis_core::prelude::*;

fn intersection_joint(ego_y: f64, human_x: f64, human_v: f64) -> JointState {
    JointState::new(
        VehicleState::new(1.0, ego_y, std::f64::consts::FRAC_PI_2, 5.0),
        VehicleState::new(human_x, 1.0, 0.0, human_v),
        0.0,
    )
}

fn make_planner(config: PlannerConfig) -> Planner {
    let propagator = KinematicBicycle::new(config.wheelbase, config.max_steer);
    Planner::new(config, Box::new(propagator)).unwrap()
}

/// With every pragmatic weight zeroed, selection is driven purely by
/// epistemic value: the planner must pick the candidate with the highest
/// expected information gain.
#[test]
fn pure_epistemic_selection_picks_the_probing_action() {
    let config = PlannerConfig {
        rationality_levels: vec![1.0],
        maneuvers: vec![Maneuver::Proceed, Maneuver::Yield],
        safety_weight: 0.0,
        goal_weight: 0.0,
        effort_weight: 0.0,
        collision_penalty: 0.0,
        ..Default::default()
    };
    let mut planner = make_planner(config);
    let obs = Observation {
        joint: intersection_joint(-10.0, -16.0, 8.0),
        human_action: 0.0,
        collision: false,
    };
    match planner.cycle(&obs).unwrap() {
        CycleOutcome::Act(report) => {
            let selected = report
                .scored
                .iter()
                .min_by(|a, b| a.score.total.total_cmp(&b.score.total))
                .unwrap();
            let most_informative = report
                .scored
                .iter()
                .max_by(|a, b| a.score.epistemic.total_cmp(&b.score.epistemic))
                .unwrap();
            assert!(
                (selected.score.epistemic - most_informative.score.epistemic).abs() < 1e-12,
                "selected candidate must carry the highest information gain"
            );
            assert!(most_informative.score.epistemic > 0.0);
        }
        CycleOutcome::Terminated(_) => panic!("episode should not terminate"),
    }
}

/// Five consecutive observations matching one candidate's prediction push
/// its posterior above 0.95.
#[test]
fn consistent_observations_converge_above_95_percent() {
    let config = PlannerConfig {
        rationality_levels: vec![1.0],
        maneuvers: vec![Maneuver::Proceed, Maneuver::Yield],
        ..Default::default()
    };
    let mut planner = make_planner(config.clone());

    // Ego close enough that the Yield hypothesis predicts hard braking
    // while Proceed predicts holding speed; the human holds speed.
    let joint = intersection_joint(-3.0, -8.0, config.human_desired_speed);
    let proceed = planner
        .bank()
        .candidates()
        .iter()
        .find(|c| c.maneuver == Maneuver::Proceed)
        .unwrap()
        .id;

    for _ in 0..5 {
        let obs = Observation {
            joint,
            human_action: 0.0,
            collision: false,
        };
        match planner.cycle(&obs).unwrap() {
            CycleOutcome::Act(_) => {}
            CycleOutcome::Terminated(_) => panic!("episode should not terminate"),
        }
    }
    assert!(planner.belief().prob(proceed) > 0.95);
}

/// A zero evaluation budget abandons all candidate scores. The first cycle
/// has no previous plan and must still commit the safe stop; the second
/// cycle reuses the committed plan's tail.
#[test]
fn blown_deadline_reuses_the_previous_plan() {
    let config = PlannerConfig {
        evaluate_deadline_ms: Some(0),
        ..Default::default()
    };
    let safe_stop_brake = config.safe_stop_brake;
    let mut planner = make_planner(config);
    let obs = Observation {
        joint: intersection_joint(-10.0, -14.0, 7.0),
        human_action: 0.0,
        collision: false,
    };

    match planner.cycle(&obs).unwrap() {
        CycleOutcome::Act(report) => {
            assert!(!report.reused_previous_plan);
            assert_eq!(report.action, EgoControl::new(-safe_stop_brake, 0.0));
        }
        CycleOutcome::Terminated(_) => panic!("episode should not terminate"),
    }
    match planner.cycle(&obs).unwrap() {
        CycleOutcome::Act(report) => {
            assert!(report.reused_previous_plan);
            assert_eq!(report.action, EgoControl::new(-safe_stop_brake, 0.0));
        }
        CycleOutcome::Terminated(_) => panic!("episode should not terminate"),
    }
}

/// Full episode against a ground-truth yielding human: the ego must cross
/// the intersection without a collision, and the belief must end sharper
/// than it started.
#[test]
fn ego_crosses_against_a_yielding_human() {
    let config = PlannerConfig::default();
    let mut planner = make_planner(config.clone());
    let world = KinematicBicycle::new(config.wheelbase, config.max_steer);

    // Ground truth: attentive, highly rational yielder.
    let truth = planner
        .bank()
        .candidates()
        .iter()
        .find(|c| c.maneuver == Maneuver::Yield && c.attentive && c.beta >= 1.0)
        .unwrap()
        .id;

    let mut joint = intersection_joint(-12.0, -20.0, config.human_desired_speed);
    let mut human_action = 0.0;
    let initial_entropy = planner.belief().entropy();
    let mut termination = None;

    for _ in 0..config.max_cycles + 1 {
        let obs = Observation {
            joint,
            human_action,
            collision: joint.separation() < config.collision_radius,
        };
        match planner.cycle(&obs).unwrap() {
            CycleOutcome::Act(report) => {
                // Advance the world one control period.
                let dist = planner.bank().predict(truth, &joint).unwrap();
                human_action = planner.bank().accel_set()[dist.argmax()];
                let ego = world.step(&joint.ego, &report.action, config.dt);
                let human = step_human(&joint.human, human_action, config.dt);
                joint = JointState::new(ego, human, joint.time + config.dt);
            }
            CycleOutcome::Terminated(t) => {
                termination = Some(t);
                break;
            }
        }
    }

    assert_eq!(termination, Some(Termination::GoalReached));
    assert!(planner.belief().entropy() < initial_entropy);
}
