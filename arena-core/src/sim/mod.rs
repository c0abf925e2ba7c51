use serde::{Deserialize, Serialize};

use crate::constants::{ARENA_WIDTH, MAX_LIVES, PROJECTILE_CAP};
use crate::entities::{Agent, AgentId, HazardId};
use crate::error::{RuleCode, TapeError};
use crate::geometry::Rect;
use crate::lifecycle::HazardRegistry;
use crate::tape::{decode_input_byte, parse_tape};

mod evaluation;
mod play;

pub use evaluation::{
    evaluate, AgentStatus, Champion, Evaluation, EvaluationOutcome, Standing, Termination,
};
pub use play::{Phase, PlayCommand, PlayEvent, PlaySession};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayResult {
    pub final_score: u32,
    pub final_rng_state: u32,
    pub tick_count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HazardSnapshot {
    pub id: HazardId,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub angle: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: AgentId,
    pub rect: Rect,
    pub projectiles: Vec<Rect>,
    pub visible: Vec<HazardId>,
    pub score: u32,
    pub fitness: Option<f64>,
    pub alive: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ModeCounters {
    Play {
        phase: Phase,
        score: u32,
        lives: u32,
        tick_rate: f64,
        autopilot: bool,
    },
    Evaluation {
        hazards_spawned: u32,
        live_agents: usize,
    },
}

/// Read-only view handed to a renderer once per tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArenaSnapshot {
    pub tick: u32,
    pub rng_state: u32,
    pub counters: ModeCounters,
    pub hazards: Vec<HazardSnapshot>,
    pub agents: Vec<AgentSnapshot>,
}

fn hazard_snapshots(registry: &HazardRegistry) -> Vec<HazardSnapshot> {
    registry
        .iter()
        .map(|hazard| HazardSnapshot {
            id: hazard.id,
            x: hazard.x,
            y: hazard.y,
            size: hazard.size,
            angle: hazard.angle,
        })
        .collect()
}

fn agent_snapshot(agent: &Agent, fitness: Option<f64>, alive: bool) -> AgentSnapshot {
    AgentSnapshot {
        id: agent.id,
        rect: agent.rect(),
        projectiles: agent.projectiles.iter().map(|p| p.rect()).collect(),
        visible: agent.visible.clone(),
        score: agent.score,
        fitness,
        alive,
    }
}

fn check_registry(registry: &HazardRegistry) -> Result<(), RuleCode> {
    if !registry.is_ordered() {
        return Err(RuleCode::HazardRegistryOrder);
    }
    Ok(())
}

fn check_agent(agent: &Agent, registry: &HazardRegistry) -> Result<(), RuleCode> {
    if agent.x < 0.0 || agent.rect().right() > ARENA_WIDTH {
        return Err(RuleCode::AgentBounds);
    }
    if agent.projectiles.len() > PROJECTILE_CAP + 1 {
        return Err(RuleCode::ProjectileLimit);
    }
    if agent.visible.iter().any(|id| !registry.contains(*id)) {
        return Err(RuleCode::DanglingVisibleHazard);
    }
    if agent.visible.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(RuleCode::VisibleHazardOrder);
    }
    Ok(())
}

fn check_lives(lives: u32) -> Result<(), RuleCode> {
    if lives > MAX_LIVES {
        return Err(RuleCode::LivesRange);
    }
    Ok(())
}

/// Re-runs a manual play session. Toggle bits are ignored so the result
/// never depends on a policy.
pub fn replay(seed: u32, inputs: &[u8]) -> ReplayResult {
    let mut session = PlaySession::manual(seed);
    for byte in inputs {
        session.step_manual(decode_input_byte(*byte));
    }
    session.result()
}

/// Like [`replay`] but checks every invariant after every tick.
pub fn replay_strict(seed: u32, inputs: &[u8]) -> Result<ReplayResult, TapeError> {
    let mut session = PlaySession::manual(seed);
    session
        .validate_invariants()
        .map_err(|rule| TapeError::RuleViolation { tick: 0, rule })?;

    for byte in inputs {
        session.step_manual(decode_input_byte(*byte));
        session
            .validate_invariants()
            .map_err(|rule| TapeError::RuleViolation {
                tick: session.tick(),
                rule,
            })?;
    }

    Ok(session.result())
}

/// Parses a tape, replays it, and checks the footer claims.
pub fn verify_tape(bytes: &[u8], max_ticks: u32) -> Result<ReplayResult, TapeError> {
    let tape = parse_tape(bytes, max_ticks)?;
    let result = replay_strict(tape.header.seed, tape.inputs)?;

    if result.tick_count != tape.header.tick_count {
        return Err(TapeError::TickCountMismatch {
            claimed: tape.header.tick_count,
            computed: result.tick_count,
        });
    }
    if result.final_score != tape.footer.final_score {
        return Err(TapeError::ScoreMismatch {
            claimed: tape.footer.final_score,
            computed: result.final_score,
        });
    }
    if result.final_rng_state != tape.footer.final_rng_state {
        return Err(TapeError::RngMismatch {
            claimed: tape.footer.final_rng_state,
            computed: result.final_rng_state,
        });
    }

    Ok(result)
}
