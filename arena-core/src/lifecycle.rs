//! Shared hazard registry, read-only collision resolution, and the batched
//! removal pass that keeps every agent's visible subset consistent with it.
//!
//! Collision resolution never mutates anything. Each tick collects a
//! [`RemovalSet`] from the pre-removal state of the world and applies it in
//! one pass afterwards, so the order agents are resolved in cannot change
//! what any of them sees.

use tracing::debug;

use crate::entities::{Agent, AgentId, ExitThreshold, Hazard, HazardId, ProjectileId};
use crate::geometry::intersects;
use crate::scoring::{EliminationCause, FitnessLedger};

/// Every live hazard, strictly ordered by id (oldest first).
#[derive(Clone, Debug, Default)]
pub struct HazardRegistry {
    hazards: Vec<Hazard>,
}

impl HazardRegistry {
    pub fn len(&self) -> usize {
        self.hazards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hazards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hazard> {
        self.hazards.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = HazardId> + '_ {
        self.hazards.iter().map(|hazard| hazard.id)
    }

    pub fn get(&self, id: HazardId) -> Option<&Hazard> {
        self.hazards
            .binary_search_by_key(&id, |hazard| hazard.id)
            .ok()
            .map(|index| &self.hazards[index])
    }

    pub fn contains(&self, id: HazardId) -> bool {
        self.get(id).is_some()
    }

    /// New hazards always carry the highest id so far.
    pub fn push(&mut self, hazard: Hazard) {
        debug_assert!(self.hazards.last().map_or(true, |last| last.id < hazard.id));
        self.hazards.push(hazard);
    }

    pub fn remove(&mut self, id: HazardId) -> Option<Hazard> {
        let index = self.hazards.binary_search_by_key(&id, |hazard| hazard.id).ok()?;
        Some(self.hazards.remove(index))
    }

    /// Moves every hazard one step. A hazard already past the exit line does
    /// not move and is reported instead.
    pub fn advance(&mut self, exit: ExitThreshold) -> Vec<HazardId> {
        let mut exited = Vec::new();
        for hazard in &mut self.hazards {
            if hazard.has_exited(exit) {
                exited.push(hazard.id);
            } else {
                hazard.advance();
            }
        }
        exited
    }

    pub fn is_ordered(&self) -> bool {
        self.hazards.windows(2).all(|pair| pair[0].id < pair[1].id)
    }
}

/// What one agent ran into this tick, computed without touching any state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// Projectile strikes, oldest visible hazard first.
    pub hits: Vec<(ProjectileId, HazardId)>,
    /// Visible hazards touching the agent that no projectile consumed.
    pub body_hits: Vec<HazardId>,
    /// Exited hazards the agent still had visible.
    pub let_through: Vec<HazardId>,
}

/// Resolves one agent against the current registry. Each projectile consumes
/// at most one hazard and each hazard is consumed at most once. Projectiles
/// listed in `spent` are ignored.
pub fn resolve_collisions(
    agent: &Agent,
    registry: &HazardRegistry,
    exited: &[HazardId],
    spent: &[ProjectileId],
) -> CollisionReport {
    let mut report = CollisionReport::default();
    let mut used: Vec<ProjectileId> = Vec::new();
    let agent_rect = agent.rect();

    for &hazard_id in &agent.visible {
        if exited.contains(&hazard_id) {
            report.let_through.push(hazard_id);
            continue;
        }
        let Some(hazard) = registry.get(hazard_id) else {
            continue;
        };
        let hazard_rect = hazard.rect();

        let striker = agent.projectiles.iter().find(|projectile| {
            !spent.contains(&projectile.id)
                && !used.contains(&projectile.id)
                && intersects(&projectile.rect(), &hazard_rect)
        });
        if let Some(projectile) = striker {
            used.push(projectile.id);
            report.hits.push((projectile.id, hazard_id));
            continue;
        }

        if intersects(&agent_rect, &hazard_rect) {
            report.body_hits.push(hazard_id);
        }
    }

    report
}

/// Removals gathered during a tick, applied together once resolution is done.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemovalSet {
    /// Leave the shared registry and every visible subset.
    hazards: Vec<HazardId>,
    /// Leave only one agent's visible subset.
    resolved: Vec<(AgentId, HazardId)>,
    projectiles: Vec<(AgentId, ProjectileId)>,
    eliminations: Vec<(AgentId, EliminationCause)>,
}

impl RemovalSet {
    pub fn is_empty(&self) -> bool {
        self.hazards.is_empty()
            && self.resolved.is_empty()
            && self.projectiles.is_empty()
            && self.eliminations.is_empty()
    }

    pub fn remove_hazard(&mut self, hazard: HazardId) {
        if !self.hazards.contains(&hazard) {
            self.hazards.push(hazard);
        }
    }

    pub fn resolve_for(&mut self, agent: AgentId, hazard: HazardId) {
        if !self.resolved.contains(&(agent, hazard)) {
            self.resolved.push((agent, hazard));
        }
    }

    pub fn remove_projectile(&mut self, agent: AgentId, projectile: ProjectileId) {
        if !self.projectiles.contains(&(agent, projectile)) {
            self.projectiles.push((agent, projectile));
        }
    }

    pub fn eliminate(&mut self, agent: AgentId, cause: EliminationCause) {
        if !self.eliminations.iter().any(|(id, _)| *id == agent) {
            self.eliminations.push((agent, cause));
        }
    }

    pub fn hazards(&self) -> &[HazardId] {
        &self.hazards
    }

    pub fn eliminations(&self) -> &[(AgentId, EliminationCause)] {
        &self.eliminations
    }

    /// Applies hazard and projectile removals to the registry and the given
    /// agents. Entities that are already gone are skipped. Eliminations are
    /// left to the owner of the roster.
    pub fn apply<'a, I>(&self, registry: &mut HazardRegistry, agents: I)
    where
        I: IntoIterator<Item = &'a mut Agent>,
    {
        for agent in agents {
            let owner = agent.id;
            for (_, projectile) in self.projectiles.iter().filter(|(id, _)| *id == owner) {
                agent.drop_projectile(*projectile);
            }
            for (_, hazard) in self.resolved.iter().filter(|(id, _)| *id == owner) {
                agent.forget_hazard(*hazard);
            }
            agent.visible.retain(|hazard| !self.hazards.contains(hazard));
        }

        for &hazard in &self.hazards {
            if registry.remove(hazard).is_some() {
                debug!(%hazard, "hazard removed from registry");
            }
        }
    }
}

/// One agent bundled with its fitness and its policy binding.
#[derive(Clone, Debug)]
pub struct AgentRecord<P> {
    pub agent: Agent,
    pub ledger: FitnessLedger,
    pub policy: P,
}

impl<P> AgentRecord<P> {
    pub fn new(agent: Agent, policy: P) -> Self {
        Self {
            agent,
            ledger: FitnessLedger::default(),
            policy,
        }
    }

    pub fn id(&self) -> AgentId {
        self.agent.id
    }
}

#[derive(Clone, Debug)]
pub struct RetiredAgent<P> {
    pub record: AgentRecord<P>,
    pub tick: u32,
    pub cause: EliminationCause,
}

/// Live agents in id order, plus the ones already eliminated.
#[derive(Clone, Debug)]
pub struct Roster<P> {
    active: Vec<AgentRecord<P>>,
    retired: Vec<RetiredAgent<P>>,
}

impl<P> Roster<P> {
    pub fn new(mut records: Vec<AgentRecord<P>>) -> Self {
        records.sort_by_key(|record| record.id());
        Self {
            active: records,
            retired: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn active(&self) -> &[AgentRecord<P>] {
        &self.active
    }

    pub fn active_mut(&mut self) -> &mut [AgentRecord<P>] {
        &mut self.active
    }

    pub fn retired(&self) -> &[RetiredAgent<P>] {
        &self.retired
    }

    pub fn get(&self, id: AgentId) -> Option<&AgentRecord<P>> {
        self.active.iter().find(|record| record.id() == id)
    }

    /// Moves the whole record out of the live roster in one step. The agent
    /// stops referencing hazards and its fitness is frozen. Retiring an agent
    /// that is not live is a no-op.
    pub fn retire(&mut self, id: AgentId, cause: EliminationCause, tick: u32) -> bool {
        let Some(index) = self.active.iter().position(|record| record.id() == id) else {
            return false;
        };

        let mut record = self.active.remove(index);
        record.agent.visible.clear();
        if record.ledger.eliminated_by.is_none() {
            record.ledger.eliminated_by = Some(cause);
        }
        debug!(agent = %id, %cause, tick, fitness = record.ledger.fitness, "agent eliminated");
        self.retired.push(RetiredAgent { record, tick, cause });
        true
    }

    pub fn into_parts(self) -> (Vec<AgentRecord<P>>, Vec<RetiredAgent<P>>) {
        (self.active, self.retired)
    }
}
