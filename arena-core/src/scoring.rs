use core::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{
    EXTRA_LIFE_SCORE_STEP, FITNESS_BODY_COLLISION, FITNESS_FLOOR, FITNESS_FLOOR_PENALTY,
    FITNESS_LET_THROUGH, FITNESS_PROJECTILE_HIT, FITNESS_WASTED_PROJECTILE, MAX_LIVES,
    STARTING_LIVES,
};
use crate::entities::AgentId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationCause {
    BodyCollision,
    LetThrough,
    FitnessFloor,
}

impl fmt::Display for EliminationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BodyCollision => write!(f, "body collision"),
            Self::LetThrough => write!(f, "let a hazard through"),
            Self::FitnessFloor => write!(f, "fitness floor"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FitnessEvent {
    ProjectileHit,
    BodyCollision,
    WastedProjectile,
    LetThrough,
    FloorBreach,
}

impl FitnessEvent {
    pub fn delta(self) -> f64 {
        match self {
            Self::ProjectileHit => FITNESS_PROJECTILE_HIT,
            Self::BodyCollision => FITNESS_BODY_COLLISION,
            Self::WastedProjectile => FITNESS_WASTED_PROJECTILE,
            Self::LetThrough => FITNESS_LET_THROUGH,
            Self::FloorBreach => FITNESS_FLOOR_PENALTY,
        }
    }

    pub fn elimination(self) -> Option<EliminationCause> {
        match self {
            Self::BodyCollision => Some(EliminationCause::BodyCollision),
            Self::LetThrough => Some(EliminationCause::LetThrough),
            Self::FloorBreach => Some(EliminationCause::FitnessFloor),
            Self::ProjectileHit | Self::WastedProjectile => None,
        }
    }
}

/// Per-agent fitness accumulator. Once an eliminating event lands the ledger
/// is frozen and ignores everything after it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessLedger {
    pub fitness: f64,
    pub hits: u32,
    pub wasted_projectiles: u32,
    pub eliminated_by: Option<EliminationCause>,
}

impl FitnessLedger {
    pub fn is_frozen(&self) -> bool {
        self.eliminated_by.is_some()
    }

    pub fn breached_floor(&self) -> bool {
        self.fitness <= FITNESS_FLOOR
    }

    /// Returns the elimination cause when this event eliminated the agent.
    pub fn record(&mut self, event: FitnessEvent) -> Option<EliminationCause> {
        if self.is_frozen() {
            return None;
        }

        self.fitness += event.delta();
        match event {
            FitnessEvent::ProjectileHit => self.hits += 1,
            FitnessEvent::WastedProjectile => self.wasted_projectiles += 1,
            _ => {}
        }

        let cause = event.elimination();
        self.eliminated_by = cause;
        cause
    }
}

/// Play-mode score and life counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayTally {
    pub score: u32,
    pub lives: u32,
}

impl Default for PlayTally {
    fn default() -> Self {
        Self {
            score: 0,
            lives: STARTING_LIVES,
        }
    }
}

impl PlayTally {
    pub fn award_hit(&mut self) {
        self.score = self.score.saturating_add(1);
    }

    /// Returns `true` when this was the last life.
    pub fn lose_life(&mut self) -> bool {
        self.lives = self.lives.saturating_sub(1);
        self.lives == 0
    }

    pub fn extra_life_due(&self) -> bool {
        self.score != 0 && self.score % EXTRA_LIFE_SCORE_STEP == 0 && self.lives < MAX_LIVES
    }

    pub fn grant_life(&mut self) {
        self.lives = (self.lives + 1).min(MAX_LIVES);
    }
}

/// Highest fitness wins; equal fitness goes to the lowest id.
pub fn select_champion<I>(candidates: I) -> Option<(AgentId, f64)>
where
    I: IntoIterator<Item = (AgentId, f64)>,
{
    candidates.into_iter().fold(None, |best, (id, fitness)| match best {
        None => Some((id, fitness)),
        Some((best_id, best_fitness)) => {
            let better = fitness.total_cmp(&best_fitness).is_gt()
                || (fitness.total_cmp(&best_fitness).is_eq() && id < best_id);
            if better {
                Some((id, fitness))
            } else {
                Some((best_id, best_fitness))
            }
        }
    })
}
