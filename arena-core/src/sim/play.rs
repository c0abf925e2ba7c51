use core::convert::Infallible;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::{
    EXTRA_LIFE_SPAWN_COUNTER_RESET, INITIAL_TICK_RATE, PLAY_AGENT_SPAWN_X, TICK_RATE_RAMP,
};
use crate::controller::{act, decide};
use crate::entities::{Agent, AgentId, HazardId};
use crate::error::{EngineError, RuleCode};
use crate::lifecycle::{resolve_collisions, HazardRegistry, RemovalSet};
use crate::policy::{Decision, Policy, Unbound};
use crate::scoring::PlayTally;
use crate::spawner::{HazardSpawner, SpawnClock, SpawnProfile};
use crate::tape::InputFrame;

use super::{
    agent_snapshot, check_agent, check_lives, check_registry, hazard_snapshots, ArenaSnapshot,
    ModeCounters, ReplayResult,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Running,
    GameOver,
    Leaderboard,
    Exited,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayCommand {
    Restart,
    Exit,
    ViewLeaderboard,
    Back,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayEvent {
    HazardSpawned(HazardId),
    HazardDestroyed(HazardId),
    LifeLost { hazard: HazardId, lives: u32 },
    ExtraLife { lives: u32 },
    AutopilotToggled { enabled: bool },
    /// Lives ran out. The driver submits `score` to the leaderboard.
    GameOver { score: u32 },
    Restarted,
    ShowLeaderboard,
    Exited,
}

/// Single-agent session driven by operator input, optionally handing the
/// steering to a bound policy.
#[derive(Clone, Debug)]
pub struct PlaySession<P> {
    phase: Phase,
    tick: u32,
    tally: PlayTally,
    agent: Agent,
    registry: HazardRegistry,
    spawner: HazardSpawner,
    clock: SpawnClock,
    tick_rate: f64,
    autopilot: bool,
    policy: Option<P>,
}

impl PlaySession<Unbound> {
    pub fn manual(seed: u32) -> Self {
        Self::new(seed, None)
    }
}

impl<P: Policy> PlaySession<P> {
    pub fn new(seed: u32, policy: Option<P>) -> Self {
        Self {
            phase: Phase::Running,
            tick: 0,
            tally: PlayTally::default(),
            agent: Agent::new(AgentId(0), PLAY_AGENT_SPAWN_X),
            registry: HazardRegistry::default(),
            spawner: HazardSpawner::new(seed, SpawnProfile::play()),
            clock: SpawnClock::default(),
            tick_rate: INITIAL_TICK_RATE,
            autopilot: false,
            policy,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn score(&self) -> u32 {
        self.tally.score
    }

    pub fn lives(&self) -> u32 {
        self.tally.lives
    }

    pub fn tick_rate(&self) -> f64 {
        self.tick_rate
    }

    pub fn autopilot(&self) -> bool {
        self.autopilot
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn registry(&self) -> &HazardRegistry {
        &self.registry
    }

    pub fn rng_state(&self) -> u32 {
        self.spawner.rng_state()
    }

    pub fn result(&self) -> ReplayResult {
        ReplayResult {
            final_score: self.tally.score,
            final_rng_state: self.spawner.rng_state(),
            tick_count: self.tick,
        }
    }

    /// Turns the autopilot on or off. Turning it on needs a bound policy.
    pub fn set_autopilot(&mut self, enabled: bool) -> bool {
        self.switch_autopilot(enabled, self.policy.is_some())
    }

    fn switch_autopilot(&mut self, enabled: bool, policy_bound: bool) -> bool {
        if enabled && !policy_bound {
            return false;
        }
        self.autopilot = enabled;
        true
    }

    /// Advances one tick, consulting the bound policy while autopilot is on.
    pub fn step(&mut self, input: InputFrame) -> Result<Vec<PlayEvent>, EngineError> {
        let mut policy = self.policy.take();
        let policy_bound = policy.is_some();
        let tick = self.tick + 1;
        let result = self.advance(input, policy_bound, |agent, registry| {
            let Some(policy) = policy.as_mut() else {
                return Ok(None);
            };
            decide(agent, registry, policy).map_err(|source| EngineError::Policy {
                agent: agent.id,
                tick,
                source,
            })
        });
        self.policy = policy;
        result
    }

    /// Advances one tick with the autopilot held off. Toggle requests are
    /// ignored, so a tape replays the same whether or not a policy exists.
    pub fn step_manual(&mut self, mut input: InputFrame) -> Vec<PlayEvent> {
        input.toggle_autopilot = false;
        self.autopilot = false;
        match self.advance(input, false, |_, _| Ok::<_, Infallible>(None)) {
            Ok(events) => events,
            Err(never) => match never {},
        }
    }

    pub fn command(&mut self, command: PlayCommand) -> Option<PlayEvent> {
        match (self.phase, command) {
            (Phase::GameOver | Phase::Leaderboard, PlayCommand::Restart) => {
                self.restart();
                Some(PlayEvent::Restarted)
            }
            (Phase::GameOver | Phase::Leaderboard, PlayCommand::Exit) => {
                self.phase = Phase::Exited;
                Some(PlayEvent::Exited)
            }
            (Phase::GameOver, PlayCommand::ViewLeaderboard) => {
                self.phase = Phase::Leaderboard;
                Some(PlayEvent::ShowLeaderboard)
            }
            (Phase::Leaderboard, PlayCommand::Back) => {
                self.phase = Phase::GameOver;
                None
            }
            _ => None,
        }
    }

    pub fn validate_invariants(&self) -> Result<(), RuleCode> {
        check_registry(&self.registry)?;
        check_agent(&self.agent, &self.registry)?;
        check_lives(self.tally.lives)?;
        Ok(())
    }

    pub fn snapshot(&self) -> ArenaSnapshot {
        ArenaSnapshot {
            tick: self.tick,
            rng_state: self.spawner.rng_state(),
            counters: ModeCounters::Play {
                phase: self.phase,
                score: self.tally.score,
                lives: self.tally.lives,
                tick_rate: self.tick_rate,
                autopilot: self.autopilot,
            },
            hazards: hazard_snapshots(&self.registry),
            agents: vec![agent_snapshot(
                &self.agent,
                None,
                self.phase == Phase::Running,
            )],
        }
    }

    /// Fresh agent, lives and hazards. The hazard stream carries on from the
    /// generator's current state.
    fn restart(&mut self) {
        self.phase = Phase::Running;
        self.tally = PlayTally::default();
        self.agent = Agent::new(AgentId(0), PLAY_AGENT_SPAWN_X);
        self.registry = HazardRegistry::default();
        self.clock = SpawnClock::default();
        self.tick_rate = INITIAL_TICK_RATE;
        self.autopilot = false;
        info!(tick = self.tick, "play session restarted");
    }

    /// `policy_bound` stands in for `self.policy` while the caller holds the
    /// policy outside the session.
    fn advance<E, F>(
        &mut self,
        input: InputFrame,
        policy_bound: bool,
        mut pilot: F,
    ) -> Result<Vec<PlayEvent>, E>
    where
        F: FnMut(&Agent, &HazardRegistry) -> Result<Option<Decision>, E>,
    {
        self.tick += 1;
        let mut events = Vec::new();

        match self.phase {
            Phase::Running => {}
            Phase::GameOver => {
                let command = if input.restart {
                    Some(PlayCommand::Restart)
                } else if input.quit {
                    Some(PlayCommand::Exit)
                } else if input.view_leaderboard {
                    Some(PlayCommand::ViewLeaderboard)
                } else {
                    None
                };
                events.extend(command.and_then(|command| self.command(command)));
                return Ok(events);
            }
            Phase::Leaderboard => {
                let command = if input.restart {
                    Some(PlayCommand::Restart)
                } else if input.quit {
                    Some(PlayCommand::Exit)
                } else if input.view_leaderboard {
                    Some(PlayCommand::Back)
                } else {
                    None
                };
                events.extend(command.and_then(|command| self.command(command)));
                return Ok(events);
            }
            Phase::Exited => return Ok(events),
        }

        if input.quit {
            self.phase = Phase::Exited;
            events.push(PlayEvent::Exited);
            return Ok(events);
        }

        self.tick_rate += TICK_RATE_RAMP;

        if input.fire {
            self.agent.try_fire();
        }
        if !self.autopilot {
            if input.left {
                self.agent.move_left();
            }
            if input.right {
                self.agent.move_right();
            }
        }
        if input.toggle_autopilot && self.switch_autopilot(!self.autopilot, policy_bound) {
            events.push(PlayEvent::AutopilotToggled {
                enabled: self.autopilot,
            });
        }

        if self.clock.advance() {
            let hazard = self.spawner.spawn();
            self.agent.visible.push(hazard.id);
            self.registry.push(hazard);
            events.push(PlayEvent::HazardSpawned(hazard.id));

            if self.tally.extra_life_due() {
                self.tally.grant_life();
                self.clock.restart_at(EXTRA_LIFE_SPAWN_COUNTER_RESET);
                events.push(PlayEvent::ExtraLife {
                    lives: self.tally.lives,
                });
            }
        }

        let exited = self.registry.advance(self.spawner.profile().exit);

        if self.autopilot {
            if let Some(decision) = pilot(&self.agent, &self.registry)? {
                act(&mut self.agent, decision);
            }
        }

        self.agent.tick_cooldown();
        self.agent.projectiles.retain_mut(|projectile| {
            if projectile.is_expired() {
                return false;
            }
            projectile.advance();
            true
        });

        let report = resolve_collisions(&self.agent, &self.registry, &exited, &[]);
        let mut removals = RemovalSet::default();

        for (projectile, hazard) in &report.hits {
            self.tally.award_hit();
            removals.remove_hazard(*hazard);
            removals.remove_projectile(self.agent.id, *projectile);
            events.push(PlayEvent::HazardDestroyed(*hazard));
        }
        for hazard in &report.body_hits {
            self.tally.lose_life();
            removals.remove_hazard(*hazard);
            events.push(PlayEvent::LifeLost {
                hazard: *hazard,
                lives: self.tally.lives,
            });
        }
        for hazard in exited {
            removals.remove_hazard(hazard);
        }

        removals.apply(&mut self.registry, [&mut self.agent]);
        self.agent.score = self.tally.score;

        if self.tally.lives == 0 {
            self.phase = Phase::GameOver;
            debug!(tick = self.tick, score = self.tally.score, "game over");
            events.push(PlayEvent::GameOver {
                score: self.tally.score,
            });
        }

        Ok(events)
    }
}
