use super::*;
use crate::constants::AGENT_WIDTH;
use crate::entities::{HazardId, Projectile};
use crate::error::PolicyError;

#[derive(Clone, Debug, PartialEq)]
enum Scripted {
    Idle(u32),
    Gunner(u32),
    Chaser,
    Broken,
    Erratic,
}

impl Policy for Scripted {
    fn evaluate(&mut self, features: &[f64]) -> Result<Vec<f64>, PolicyError> {
        Ok(match self {
            Scripted::Idle(_) => vec![0.0, 1.0],
            Scripted::Gunner(_) => vec![0.0, -1.0],
            Scripted::Chaser => {
                let offset = features[0] - (features[3] + AGENT_WIDTH / 2.0);
                let fire = if offset.abs() < 10.0 { -1.0 } else { 1.0 };
                vec![offset, fire]
            }
            Scripted::Broken => vec![1.0, 2.0, 3.0],
            Scripted::Erratic => vec![f64::NAN, f64::NAN],
        })
    }
}

fn place_hazard<P: Policy>(
    evaluation: &mut Evaluation<P>,
    x: f64,
    y: f64,
    size: f64,
) -> HazardId {
    let mut hazard = evaluation.spawner.spawn();
    hazard.x = x;
    hazard.y = y;
    hazard.size = size;
    hazard.angle = 0.0;
    for record in evaluation.roster.active_mut() {
        record.agent.visible.push(hazard.id);
    }
    evaluation.registry.push(hazard);
    hazard.id
}

fn active_ids<P>(evaluation: &Evaluation<P>) -> Vec<AgentId> {
    evaluation.roster.active().iter().map(|r| r.id()).collect()
}

#[test]
fn shared_hazard_rewards_every_agent_that_hits_it() {
    let mut evaluation = Evaluation::new(1, vec![Scripted::Idle(0), Scripted::Idle(1)]);
    let hazard = place_hazard(&mut evaluation, 200.0, 380.0, 50.0);
    for record in evaluation.roster.active_mut() {
        record.agent.projectiles.push(Projectile {
            id: ProjectileId(0),
            x: 234.0,
            y: 440.0,
        });
    }

    assert_eq!(evaluation.step(), Ok(None));

    for record in evaluation.roster.active() {
        assert_eq!(record.ledger.fitness, 5.0);
        assert_eq!(record.ledger.hits, 1);
        assert_eq!(record.agent.score, 1);
        assert!(record.agent.visible.is_empty());
        assert!(record.agent.projectiles.is_empty());
    }
    assert!(evaluation.registry().contains(hazard));
}

#[test]
fn agent_result_does_not_depend_on_the_population() {
    let solo = evaluate(0xC0FFEE, vec![Scripted::Chaser], 12).unwrap();
    let crowd = evaluate(
        0xC0FFEE,
        vec![
            Scripted::Chaser,
            Scripted::Idle(1),
            Scripted::Gunner(2),
            Scripted::Chaser,
        ],
        12,
    )
    .unwrap();

    assert_eq!(solo.standings[0], crowd.standings[0]);
    assert_eq!(crowd.standings[0].fitness, crowd.standings[3].fitness);
}

#[test]
fn wasted_shots_cross_the_floor_and_retire_next_tick() {
    let mut evaluation = Evaluation::new(3, vec![Scripted::Idle(0)]);
    evaluation.roster.active_mut()[0].ledger.fitness = -99.95;
    evaluation.roster.active_mut()[0]
        .agent
        .projectiles
        .push(Projectile {
            id: ProjectileId(0),
            x: 234.0,
            y: -6.0,
        });

    assert_eq!(evaluation.step(), Ok(None));
    let record = &evaluation.roster.active()[0];
    assert!((record.ledger.fitness - -100.05).abs() < 1e-9);
    assert_eq!(record.ledger.wasted_projectiles, 1);
    assert!(record.agent.projectiles.is_empty());

    assert_eq!(evaluation.step(), Ok(Some(Termination::RosterEmpty)));
    let outcome = evaluation.into_outcome();
    let standing = outcome.standings[0];
    assert!((standing.fitness - -110.05).abs() < 1e-9);
    assert_eq!(
        standing.status,
        AgentStatus::Eliminated {
            tick: 2,
            cause: EliminationCause::FitnessFloor
        }
    );
}

#[test]
fn collision_landing_on_the_floor_keeps_its_own_cause() {
    let mut evaluation = Evaluation::new(3, vec![Scripted::Idle(0)]);
    evaluation.roster.active_mut()[0].ledger.fitness = -96.0;
    let hazard = place_hazard(&mut evaluation, 200.0, 400.0, 50.0);

    assert_eq!(evaluation.step(), Ok(Some(Termination::RosterEmpty)));
    assert!(evaluation.registry().contains(hazard));

    let outcome = evaluation.into_outcome();
    assert_eq!(outcome.standings[0].fitness, -100.0);
    assert_eq!(
        outcome.standings[0].status,
        AgentStatus::Eliminated {
            tick: 1,
            cause: EliminationCause::BodyCollision
        }
    );
}

#[test]
fn let_through_hazard_eliminates_and_leaves_the_registry() {
    let mut evaluation = Evaluation::new(4, vec![Scripted::Idle(0), Scripted::Idle(1)]);
    let hazard = place_hazard(&mut evaluation, 0.0, 501.0, 50.0);

    assert_eq!(evaluation.step(), Ok(Some(Termination::RosterEmpty)));
    assert!(!evaluation.registry().contains(hazard));
    for retired in evaluation.roster().retired() {
        assert_eq!(retired.cause, EliminationCause::LetThrough);
        assert_eq!(retired.record.ledger.fitness, -2.0);
        assert!(retired.record.agent.visible.is_empty());
    }
}

#[test]
fn steady_fire_is_spaced_by_the_cooldown() {
    let mut evaluation = Evaluation::new(8, vec![Scripted::Gunner(0)]);
    place_hazard(&mut evaluation, 0.0, -5_000.0, 50.0);
    evaluation.roster.active_mut()[0].agent.cooldown_ticks = 50;

    let mut fired_at = Vec::new();
    for _ in 0..160 {
        assert_eq!(evaluation.step(), Ok(None));
        if evaluation.roster.active()[0].agent.cooldown_ticks == 1 {
            fired_at.push(evaluation.tick());
        }
    }
    assert_eq!(fired_at, vec![1, 51, 101, 151]);
}

#[test]
fn retiring_keeps_agent_ledger_and_policy_together() {
    let mut evaluation = Evaluation::new(
        5,
        vec![
            Scripted::Idle(10),
            Scripted::Idle(20),
            Scripted::Idle(30),
        ],
    );
    evaluation.roster.active_mut()[1].ledger.fitness = -150.0;

    assert_eq!(evaluation.step(), Ok(None));

    assert_eq!(active_ids(&evaluation), vec![AgentId(0), AgentId(2)]);
    let policies: Vec<_> = evaluation
        .roster
        .active()
        .iter()
        .map(|r| r.policy.clone())
        .collect();
    assert_eq!(policies, vec![Scripted::Idle(10), Scripted::Idle(30)]);

    let retired = &evaluation.roster.retired()[0];
    assert_eq!(retired.record.id(), AgentId(1));
    assert_eq!(retired.record.policy, Scripted::Idle(20));
    assert_eq!(retired.record.ledger.fitness, -160.0);
    assert_eq!(retired.cause, EliminationCause::FitnessFloor);
    assert_eq!(retired.tick, 1);
}

#[test]
fn invariants_hold_every_tick() {
    let mut evaluation = Evaluation::new(
        0xFACE,
        vec![
            Scripted::Chaser,
            Scripted::Gunner(1),
            Scripted::Idle(2),
            Scripted::Chaser,
        ],
    )
    .with_hazard_cap(25);

    loop {
        let done = evaluation.step().unwrap();
        assert_eq!(evaluation.validate_invariants(), Ok(()));
        for retired in evaluation.roster().retired() {
            assert!(retired.record.agent.visible.is_empty());
        }
        if done.is_some() {
            break;
        }
    }
}

#[test]
fn hazard_cap_ends_the_run_after_the_cap_is_exceeded() {
    let outcome = evaluate(
        2,
        vec![Scripted::Idle(0), Scripted::Idle(1), Scripted::Idle(2)],
        1,
    )
    .unwrap();

    assert_eq!(outcome.termination, Termination::HazardCap);
    assert_eq!(outcome.ticks, 160);
    assert_eq!(outcome.hazards_spawned, 2);
    assert!(outcome
        .standings
        .iter()
        .all(|s| s.status == AgentStatus::Surviving));

    let champion = outcome.champion.unwrap();
    assert_eq!(champion.agent, AgentId(0));
    assert_eq!(champion.policy, Scripted::Idle(0));
}

#[test]
fn retired_agents_compete_once_the_roster_is_empty() {
    let mut evaluation = Evaluation::new(
        6,
        vec![Scripted::Idle(0), Scripted::Idle(1), Scripted::Idle(2)],
    );
    evaluation.roster.active_mut()[1].ledger.fitness = 500.0;
    assert!(evaluation
        .roster
        .retire(AgentId(1), EliminationCause::BodyCollision, 0));

    assert_eq!(evaluation.run(), Ok(Termination::RosterEmpty));
    let outcome = evaluation.into_outcome();

    let champion = outcome.champion.unwrap();
    assert_eq!(champion.agent, AgentId(1));
    assert_eq!(champion.fitness, 500.0);
    assert_eq!(champion.policy, Scripted::Idle(1));
    assert_eq!(outcome.standings.len(), 3);
}

#[test]
fn only_survivors_compete_at_the_hazard_cap() {
    let mut evaluation = Evaluation::new(
        6,
        vec![Scripted::Idle(0), Scripted::Idle(1), Scripted::Idle(2)],
    )
    .with_hazard_cap(1);
    evaluation.roster.active_mut()[1].ledger.fitness = 500.0;
    evaluation.roster.active_mut()[2].ledger.fitness = 3.0;
    evaluation
        .roster
        .retire(AgentId(1), EliminationCause::BodyCollision, 0);

    assert_eq!(evaluation.run(), Ok(Termination::HazardCap));
    let outcome = evaluation.into_outcome();

    let champion = outcome.champion.unwrap();
    assert_eq!(champion.agent, AgentId(2));
    assert_eq!(champion.fitness, 3.0);
    assert_eq!(
        outcome.standings[1].status,
        AgentStatus::Eliminated {
            tick: 0,
            cause: EliminationCause::BodyCollision
        }
    );
}

#[test]
fn policy_contract_errors_name_the_agent_and_tick() {
    let mut evaluation = Evaluation::new(9, vec![Scripted::Idle(0), Scripted::Broken]);

    // Nothing visible yet, so the broken policy is never asked.
    assert_eq!(evaluation.step(), Ok(None));

    place_hazard(&mut evaluation, 0.0, 0.0, 50.0);
    assert_eq!(
        evaluation.step(),
        Err(EngineError::Policy {
            agent: AgentId(1),
            tick: 2,
            source: PolicyError::OutputArity {
                expected: 2,
                actual: 3
            },
        })
    );
}

#[test]
fn failed_runs_keep_reporting_the_same_error() {
    let mut evaluation = Evaluation::new(9, vec![Scripted::Idle(0), Scripted::Broken]);
    place_hazard(&mut evaluation, 0.0, 0.0, 50.0);

    let err = evaluation.step().unwrap_err();
    assert_eq!(evaluation.failed(), Some(&err));
    let tick = evaluation.tick();

    assert_eq!(evaluation.step(), Err(err.clone()));
    assert_eq!(evaluation.run(), Err(err));
    assert_eq!(evaluation.tick(), tick);
    assert_eq!(evaluation.terminated(), None);
}

#[test]
fn nan_outputs_neither_move_nor_fire() {
    let outcome = evaluate(7, vec![Scripted::Idle(0), Scripted::Erratic], 5).unwrap();

    let [idle, erratic] = outcome.standings.as_slice() else {
        panic!("expected two standings, got {:?}", outcome.standings);
    };
    assert_eq!(erratic.agent, AgentId(1));
    assert_eq!(erratic.fitness, idle.fitness);
    assert_eq!(erratic.status, idle.status);
    assert_eq!(erratic.wasted_projectiles, 0);
}

#[test]
fn finished_runs_stay_finished() {
    let mut evaluation = Evaluation::new(1, vec![Scripted::Idle(0)]).with_hazard_cap(0);
    assert_eq!(evaluation.run(), Ok(Termination::HazardCap));
    let tick = evaluation.tick();
    assert_eq!(evaluation.step(), Ok(Some(Termination::HazardCap)));
    assert_eq!(evaluation.tick(), tick);
    assert_eq!(evaluation.terminated(), Some(Termination::HazardCap));
}

#[test]
fn same_seed_same_outcome() {
    let population = || vec![Scripted::Chaser, Scripted::Gunner(1), Scripted::Chaser];
    let first = evaluate(77, population(), 30).unwrap();
    let second = evaluate(77, population(), 30).unwrap();

    assert_eq!(first.standings, second.standings);
    assert_eq!(first.ticks, second.ticks);
    assert_eq!(first.termination, second.termination);
    assert_eq!(
        first.champion.map(|c| c.agent),
        second.champion.map(|c| c.agent)
    );
}

#[test]
fn snapshot_lists_retired_agents_as_dead() {
    let mut evaluation = Evaluation::new(3, vec![Scripted::Idle(0), Scripted::Idle(1)]);
    evaluation.roster.retire(AgentId(0), EliminationCause::LetThrough, 0);
    let snapshot = evaluation.snapshot();

    assert_eq!(snapshot.agents.len(), 2);
    assert!(!snapshot.agents[0].alive);
    assert!(snapshot.agents[1].alive);
    assert_eq!(
        snapshot.counters,
        ModeCounters::Evaluation {
            hazards_spawned: 0,
            live_agents: 1
        }
    );
}
