use arena_core::sim::{AgentStatus, Termination};
use arena_core::{evaluate, Evaluation, Policy, PolicyError};

/// Moves under the oldest visible hazard and fires once lined up.
#[derive(Clone, Debug)]
struct Tracker {
    tolerance: f64,
}

impl Policy for Tracker {
    fn evaluate(&mut self, features: &[f64]) -> Result<Vec<f64>, PolicyError> {
        arena_core::check_feature_arity(features)?;
        let offset = features[0] - (features[3] + 34.5);
        let fire = if offset.abs() <= self.tolerance { -1.0 } else { 1.0 };
        Ok(vec![offset, fire])
    }
}

fn population() -> Vec<Tracker> {
    [2.0, 6.0, 12.0, 30.0]
        .into_iter()
        .map(|tolerance| Tracker { tolerance })
        .collect()
}

#[test]
fn population_run_is_reproducible() {
    let first = evaluate(0xBEEF, population(), 40).unwrap();
    let second = evaluate(0xBEEF, population(), 40).unwrap();

    assert_eq!(first.termination, second.termination);
    assert_eq!(first.ticks, second.ticks);
    assert_eq!(first.standings, second.standings);
    assert_eq!(first.standings.len(), 4);

    let champion = first.champion.expect("a champion is always chosen");
    let best = first
        .standings
        .iter()
        .filter(|s| {
            first.termination == Termination::RosterEmpty || s.status == AgentStatus::Surviving
        })
        .map(|s| s.fitness)
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(champion.fitness, best);
}

#[test]
fn idle_baseline_never_gains_fitness() {
    #[derive(Clone, Debug)]
    struct Idle;
    impl Policy for Idle {
        fn evaluate(&mut self, _features: &[f64]) -> Result<Vec<f64>, PolicyError> {
            Ok(vec![0.0, 1.0])
        }
    }

    let idle = evaluate(0xBEEF, vec![Idle], 40).unwrap();
    assert!(idle.standings[0].fitness <= 0.0);
    assert!(matches!(
        idle.standings[0].status,
        AgentStatus::Eliminated { .. }
    ));
}

#[test]
fn snapshots_serialize_for_renderers() {
    let mut evaluation = Evaluation::new(11, population()).with_hazard_cap(5);
    for _ in 0..120 {
        if evaluation.step().unwrap().is_some() {
            break;
        }
    }
    let snapshot = evaluation.snapshot();
    let json = serde_json::to_value(&snapshot).unwrap();

    assert_eq!(json["counters"]["mode"], "evaluation");
    assert_eq!(json["agents"].as_array().map(Vec::len), Some(4));
    assert_eq!(json["tick"], snapshot.tick);
}
