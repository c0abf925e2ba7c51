use crate::policies::AgentPolicy;
use anyhow::{anyhow, Context, Result};
use arena_core::controller::decide;
use arena_core::entities::Steer;
use arena_core::sim::{
    ArenaSnapshot, Evaluation, EvaluationOutcome, Phase, PlayEvent, PlaySession,
};
use arena_core::tape::{encode_input_byte, serialize_tape, InputFrame};
use arena_core::verify_tape;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

#[derive(Clone, Debug)]
pub struct EvaluationRun {
    pub seed: u32,
    pub hazard_cap: u32,
    pub outcome: EvaluationOutcome<AgentPolicy>,
    /// Captured every `snapshot_every` ticks when requested, plus the final
    /// tick.
    pub snapshots: Vec<ArenaSnapshot>,
}

pub fn run_evaluation(
    policies: Vec<AgentPolicy>,
    seed: u32,
    hazard_cap: u32,
    snapshot_every: Option<u32>,
) -> Result<EvaluationRun> {
    if policies.is_empty() {
        return Err(anyhow!("evaluation requires at least one policy"));
    }
    if snapshot_every == Some(0) {
        return Err(anyhow!("snapshot interval must be >= 1"));
    }

    let population = policies.len();
    let mut evaluation = Evaluation::new(seed, policies).with_hazard_cap(hazard_cap);
    evaluation
        .validate_invariants()
        .map_err(|rule| anyhow!("initial invariant failure: {rule}"))?;
    info!(seed, population, hazard_cap, "evaluation started");

    let mut snapshots = Vec::new();
    loop {
        let done = evaluation
            .step()
            .with_context(|| format!("evaluation failed for seed={seed:#010x}"))?;
        if cfg!(debug_assertions) {
            evaluation.validate_invariants().map_err(|rule| {
                anyhow!("invariant failure at tick {}: {rule}", evaluation.tick())
            })?;
        }
        if let Some(every) = snapshot_every {
            if done.is_some() || evaluation.tick() % every == 0 {
                snapshots.push(evaluation.snapshot());
            }
        }
        if done.is_some() {
            break;
        }
    }

    Ok(EvaluationRun {
        seed,
        hazard_cap,
        outcome: evaluation.into_outcome(),
        snapshots,
    })
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayMetrics {
    pub policy_kind: String,
    pub seed: u32,
    pub max_ticks: u32,
    pub tick_count: u32,
    pub final_score: u32,
    pub final_rng_state: u32,
    pub final_lives: u32,
    pub game_over: bool,
    pub hazards_destroyed: u32,
    pub lives_lost: u32,
    pub fire_ticks: u32,
    pub move_ticks: u32,
}

#[derive(Clone, Debug)]
pub struct PlayArtifact {
    pub metrics: PlayMetrics,
    pub inputs: Vec<u8>,
    pub tape: Vec<u8>,
}

/// Plays one headless session with `policy` at the controls.
///
/// The policy's choices are recorded as operator input rather than run
/// through the session's autopilot, so the resulting tape replays without
/// the policy.
pub fn run_play(mut policy: AgentPolicy, seed: u32, max_ticks: u32) -> Result<PlayArtifact> {
    if max_ticks == 0 {
        return Err(anyhow!("max_ticks must be > 0"));
    }

    let mut session = PlaySession::manual(seed);
    let mut inputs = Vec::with_capacity(max_ticks as usize);
    let mut hazards_destroyed = 0u32;
    let mut lives_lost = 0u32;

    while session.tick() < max_ticks && session.phase() == Phase::Running {
        let decision = decide(session.agent(), session.registry(), &mut policy).map_err(
            |err| anyhow!("policy failed at tick {}: {err}", session.tick() + 1),
        )?;
        let frame = decision.map_or_else(InputFrame::default, |decision| InputFrame {
            left: decision.steer == Steer::Left,
            right: decision.steer == Steer::Right,
            fire: decision.fire,
            ..InputFrame::default()
        });
        inputs.push(encode_input_byte(frame));

        for event in session.step_manual(frame) {
            match event {
                PlayEvent::HazardDestroyed(_) => hazards_destroyed += 1,
                PlayEvent::LifeLost { hazard, lives } => {
                    lives_lost += 1;
                    debug!(%hazard, lives, tick = session.tick(), "life lost");
                }
                PlayEvent::GameOver { score } => {
                    info!(seed, score, tick = session.tick(), "game over");
                }
                _ => {}
            }
        }
    }

    let result = session.result();
    let tape = serialize_tape(seed, &inputs, result.final_score, result.final_rng_state);
    verify_tape(&tape, max_ticks.max(result.tick_count))
        .map_err(|err| anyhow!("generated tape failed verification: {err}"))?;

    let fire_ticks = inputs.iter().filter(|b| **b & 0x04 != 0).count() as u32;
    let move_ticks = inputs.iter().filter(|b| **b & 0x03 != 0).count() as u32;

    Ok(PlayArtifact {
        metrics: PlayMetrics {
            policy_kind: policy.kind().to_string(),
            seed,
            max_ticks,
            tick_count: result.tick_count,
            final_score: result.final_score,
            final_rng_state: result.final_rng_state,
            final_lives: session.lives(),
            game_over: session.phase() == Phase::GameOver,
            hazards_destroyed,
            lives_lost,
            fire_ticks,
            move_ticks,
        },
        inputs,
        tape,
    })
}

pub fn write_tape(path: &Path, bytes: &[u8]) -> Result<()> {
    crate::util::ensure_parent(path)?;
    fs::write(path, bytes).with_context(|| format!("failed writing {}", path.display()))
}
