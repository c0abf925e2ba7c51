//! Deterministic tick engine for the falling-hazard arena.
//!
//! Two world steps share the same entities and rules: a single-agent play
//! session driven by operator input, and a population evaluation where every
//! agent faces the same hazard stream and is scored by fitness.

pub mod constants;
pub mod controller;
pub mod entities;
pub mod error;
pub mod geometry;
pub mod leaderboard;
pub mod lifecycle;
pub mod policy;
pub mod rng;
pub mod scoring;
pub mod sim;
pub mod spawner;
pub mod tape;

pub use error::{EngineError, LeaderboardError, PolicyError, RuleCode, TapeError};
pub use leaderboard::Leaderboard;
pub use policy::{check_feature_arity, Policy, Unbound};
pub use sim::{
    evaluate, replay, replay_strict, verify_tape, ArenaSnapshot, Evaluation, EvaluationOutcome,
    PlaySession, ReplayResult,
};
