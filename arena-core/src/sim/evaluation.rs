use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::constants::{EVALUATION_AGENT_SPAWN_X, EVALUATION_HAZARD_CAP};
use crate::controller::{act, decide};
use crate::entities::{Agent, AgentId, ProjectileId};
use crate::error::{EngineError, RuleCode};
use crate::lifecycle::{resolve_collisions, AgentRecord, HazardRegistry, RemovalSet, Roster};
use crate::policy::Policy;
use crate::scoring::{select_champion, EliminationCause, FitnessEvent};
use crate::spawner::{HazardSpawner, SpawnClock, SpawnProfile};

use super::{
    agent_snapshot, check_agent, check_registry, hazard_snapshots, ArenaSnapshot, ModeCounters,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    RosterEmpty,
    HazardCap,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AgentStatus {
    Surviving,
    Eliminated { tick: u32, cause: EliminationCause },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub agent: AgentId,
    pub fitness: f64,
    pub hits: u32,
    pub wasted_projectiles: u32,
    pub status: AgentStatus,
}

/// The agent reported back for the next round of training, with its policy
/// handed over by value.
#[derive(Clone, Debug)]
pub struct Champion<P> {
    pub agent: AgentId,
    pub fitness: f64,
    pub policy: P,
}

#[derive(Clone, Debug)]
pub struct EvaluationOutcome<P> {
    pub termination: Termination,
    pub ticks: u32,
    pub hazards_spawned: u32,
    pub standings: Vec<Standing>,
    pub champion: Option<Champion<P>>,
}

/// A population of agents facing one shared hazard stream.
#[derive(Clone, Debug)]
pub struct Evaluation<P> {
    tick: u32,
    hazards_spawned: u32,
    hazard_cap: u32,
    registry: HazardRegistry,
    spawner: HazardSpawner,
    clock: SpawnClock,
    roster: Roster<P>,
    terminated: Option<Termination>,
    /// Set when a policy broke its contract. The world is left mid-tick, so
    /// every later `step` reports the same error.
    failed: Option<EngineError>,
}

impl<P: Policy> Evaluation<P> {
    /// One agent per policy, ids assigned in order.
    pub fn new(seed: u32, policies: Vec<P>) -> Self {
        let records = policies
            .into_iter()
            .enumerate()
            .map(|(index, policy)| {
                let agent = Agent::new(AgentId(index as u32), EVALUATION_AGENT_SPAWN_X);
                AgentRecord::new(agent, policy)
            })
            .collect();

        Self {
            tick: 0,
            hazards_spawned: 0,
            hazard_cap: EVALUATION_HAZARD_CAP,
            registry: HazardRegistry::default(),
            spawner: HazardSpawner::new(seed, SpawnProfile::evaluation()),
            clock: SpawnClock::default(),
            roster: Roster::new(records),
            terminated: None,
            failed: None,
        }
    }

    pub fn with_hazard_cap(mut self, hazard_cap: u32) -> Self {
        self.hazard_cap = hazard_cap;
        self
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn hazards_spawned(&self) -> u32 {
        self.hazards_spawned
    }

    pub fn registry(&self) -> &HazardRegistry {
        &self.registry
    }

    pub fn roster(&self) -> &Roster<P> {
        &self.roster
    }

    pub fn rng_state(&self) -> u32 {
        self.spawner.rng_state()
    }

    pub fn terminated(&self) -> Option<Termination> {
        self.terminated
    }

    pub fn failed(&self) -> Option<&EngineError> {
        self.failed.as_ref()
    }

    /// Runs one tick. Returns the termination reason once the run is over.
    pub fn step(&mut self) -> Result<Option<Termination>, EngineError> {
        if self.terminated.is_some() {
            return Ok(self.terminated);
        }
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        if self.roster.is_empty() {
            return Ok(self.finish(Termination::RosterEmpty));
        }

        self.tick += 1;
        let tick = self.tick;

        self.enforce_fitness_floor();

        let exit = self.spawner.profile().exit;
        let exited = self.registry.advance(exit);
        for hazard in &exited {
            debug!(%hazard, tick, "hazard exited the arena");
        }

        let mut failure = None;
        for record in self.roster.active_mut() {
            match decide(&record.agent, &self.registry, &mut record.policy) {
                Ok(Some(decision)) => {
                    act(&mut record.agent, decision);
                }
                Ok(None) => {}
                Err(source) => {
                    failure = Some(EngineError::Policy {
                        agent: record.agent.id,
                        tick,
                        source,
                    });
                    break;
                }
            }
        }
        if let Some(err) = failure {
            warn!(%err, "evaluation halted");
            self.failed = Some(err.clone());
            return Err(err);
        }

        for record in self.roster.active_mut() {
            record.agent.tick_cooldown();
            for projectile in &mut record.agent.projectiles {
                projectile.advance();
            }
        }

        let mut removals = RemovalSet::default();
        let mut pending: Vec<(AgentId, Vec<FitnessEvent>)> = Vec::new();

        for record in self.roster.active() {
            let agent = &record.agent;
            let expired: Vec<ProjectileId> = agent
                .projectiles
                .iter()
                .filter(|projectile| projectile.is_expired())
                .map(|projectile| projectile.id)
                .collect();
            let report = resolve_collisions(agent, &self.registry, &exited, &expired);

            let mut events = Vec::new();
            for (projectile, hazard) in &report.hits {
                events.push(FitnessEvent::ProjectileHit);
                removals.resolve_for(agent.id, *hazard);
                removals.remove_projectile(agent.id, *projectile);
            }
            for projectile in expired {
                events.push(FitnessEvent::WastedProjectile);
                removals.remove_projectile(agent.id, projectile);
            }
            events.extend(report.body_hits.iter().map(|_| FitnessEvent::BodyCollision));
            events.extend(report.let_through.iter().map(|_| FitnessEvent::LetThrough));
            pending.push((agent.id, events));
        }
        for hazard in exited {
            removals.remove_hazard(hazard);
        }

        for (id, events) in pending {
            let Some(record) = self.roster.active_mut().iter_mut().find(|r| r.id() == id) else {
                continue;
            };
            for event in events {
                if event == FitnessEvent::ProjectileHit && !record.ledger.is_frozen() {
                    record.agent.score += 1;
                }
                if let Some(cause) = record.ledger.record(event) {
                    removals.eliminate(id, cause);
                }
            }
        }

        removals.apply(
            &mut self.registry,
            self.roster.active_mut().iter_mut().map(|record| &mut record.agent),
        );
        for (id, cause) in removals.eliminations() {
            self.roster.retire(*id, *cause, tick);
        }

        if self.clock.advance() {
            let hazard = self.spawner.spawn();
            for record in self.roster.active_mut() {
                record.agent.visible.push(hazard.id);
            }
            self.registry.push(hazard);
            self.hazards_spawned += 1;
        }

        if self.roster.is_empty() {
            return Ok(self.finish(Termination::RosterEmpty));
        }
        if self.hazards_spawned > self.hazard_cap {
            return Ok(self.finish(Termination::HazardCap));
        }
        Ok(None)
    }

    pub fn run(&mut self) -> Result<Termination, EngineError> {
        loop {
            if let Some(termination) = self.step()? {
                return Ok(termination);
            }
        }
    }

    pub fn validate_invariants(&self) -> Result<(), RuleCode> {
        check_registry(&self.registry)?;
        for record in self.roster.active() {
            check_agent(&record.agent, &self.registry)?;
        }
        Ok(())
    }

    pub fn snapshot(&self) -> ArenaSnapshot {
        let live = self
            .roster
            .active()
            .iter()
            .map(|record| agent_snapshot(&record.agent, Some(record.ledger.fitness), true));
        let retired = self.roster.retired().iter().map(|retired| {
            agent_snapshot(
                &retired.record.agent,
                Some(retired.record.ledger.fitness),
                false,
            )
        });
        let mut agents: Vec<_> = live.chain(retired).collect();
        agents.sort_by_key(|agent| agent.id);

        ArenaSnapshot {
            tick: self.tick,
            rng_state: self.spawner.rng_state(),
            counters: ModeCounters::Evaluation {
                hazards_spawned: self.hazards_spawned,
                live_agents: self.roster.active().len(),
            },
            hazards: hazard_snapshots(&self.registry),
            agents,
        }
    }

    /// Standings for the whole population in id order, plus the champion.
    /// After an empty roster every agent competes with its frozen fitness;
    /// otherwise only the survivors do.
    pub fn into_outcome(self) -> EvaluationOutcome<P> {
        let termination = self.terminated.unwrap_or(if self.roster.is_empty() {
            Termination::RosterEmpty
        } else {
            Termination::HazardCap
        });
        let (active, retired) = self.roster.into_parts();

        let mut standings: Vec<Standing> = active
            .iter()
            .map(|record| Standing {
                agent: record.id(),
                fitness: record.ledger.fitness,
                hits: record.ledger.hits,
                wasted_projectiles: record.ledger.wasted_projectiles,
                status: AgentStatus::Surviving,
            })
            .chain(retired.iter().map(|retired| Standing {
                agent: retired.record.id(),
                fitness: retired.record.ledger.fitness,
                hits: retired.record.ledger.hits,
                wasted_projectiles: retired.record.ledger.wasted_projectiles,
                status: AgentStatus::Eliminated {
                    tick: retired.tick,
                    cause: retired.cause,
                },
            }))
            .collect();
        standings.sort_by_key(|standing| standing.agent);

        let picked = match termination {
            Termination::RosterEmpty => {
                select_champion(standings.iter().map(|s| (s.agent, s.fitness)))
            }
            Termination::HazardCap => select_champion(
                active
                    .iter()
                    .map(|record| (record.id(), record.ledger.fitness)),
            ),
        };

        let champion = picked.and_then(|(id, fitness)| {
            active
                .into_iter()
                .chain(retired.into_iter().map(|retired| retired.record))
                .find(|record| record.id() == id)
                .map(|record| Champion {
                    agent: id,
                    fitness,
                    policy: record.policy,
                })
        });

        EvaluationOutcome {
            termination,
            ticks: self.tick,
            hazards_spawned: self.hazards_spawned,
            standings,
            champion,
        }
    }

    /// Agents at or below the floor are dropped before anything else
    /// happens this tick.
    fn enforce_fitness_floor(&mut self) {
        let breached: Vec<AgentId> = self
            .roster
            .active()
            .iter()
            .filter(|record| record.ledger.breached_floor())
            .map(|record| record.id())
            .collect();

        for id in breached {
            if let Some(record) = self.roster.active_mut().iter_mut().find(|r| r.id() == id) {
                record.ledger.record(FitnessEvent::FloorBreach);
            }
            self.roster.retire(id, EliminationCause::FitnessFloor, self.tick);
        }
    }

    fn finish(&mut self, termination: Termination) -> Option<Termination> {
        self.terminated = Some(termination);
        info!(
            ?termination,
            tick = self.tick,
            hazards_spawned = self.hazards_spawned,
            survivors = self.roster.active().len(),
            "evaluation finished"
        );
        self.terminated
    }
}

/// Runs a whole evaluation and returns its outcome.
pub fn evaluate<P: Policy>(
    seed: u32,
    policies: Vec<P>,
    hazard_cap: u32,
) -> Result<EvaluationOutcome<P>, EngineError> {
    let population = policies.len();
    let mut evaluation = Evaluation::new(seed, policies).with_hazard_cap(hazard_cap);
    info!(seed, population, hazard_cap, "evaluation started");
    evaluation.run()?;
    Ok(evaluation.into_outcome())
}

#[cfg(test)]
mod tests;
