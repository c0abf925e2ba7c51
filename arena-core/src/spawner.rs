use crate::constants::{
    ARENA_HEIGHT, ARENA_WIDTH, EVALUATION_VERTICAL_SPAN, HAZARD_SIZE_MAX_EXCLUSIVE, HAZARD_SIZE_MIN,
    HAZARD_SIZE_STEP, HAZARD_SPAWN_INTERVAL_TICKS, PLAY_VERTICAL_SPAN, TARGET_MARGIN,
};
use crate::entities::{ExitThreshold, Hazard, HazardId};
use crate::rng::SeededRng;

/// Integer column range a spawn coordinate is drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Columns {
    /// `[0, arena width - size]`, keeping the whole hazard inside the arena.
    Inscribed,
    /// `[min, max]`, both ends included.
    Between(i32, i32),
}

impl Columns {
    fn draw(self, rng: &mut SeededRng, size: u32) -> i32 {
        match self {
            Self::Inscribed => rng.next_inclusive(0, ARENA_WIDTH as i32 - size as i32),
            Self::Between(min, max) => rng.next_inclusive(min, max),
        }
    }
}

/// Mode-specific hazard spawn parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnProfile {
    pub spawn_columns: Columns,
    pub target_columns: Columns,
    pub vertical_span: f64,
    pub exit: ExitThreshold,
}

impl SpawnProfile {
    pub fn play() -> Self {
        Self {
            spawn_columns: Columns::Inscribed,
            target_columns: Columns::Between(TARGET_MARGIN, ARENA_WIDTH as i32 - TARGET_MARGIN),
            vertical_span: PLAY_VERTICAL_SPAN,
            exit: ExitThreshold::Fixed(ARENA_HEIGHT),
        }
    }

    pub fn evaluation() -> Self {
        Self {
            spawn_columns: Columns::Between(TARGET_MARGIN, ARENA_WIDTH as i32 - TARGET_MARGIN),
            target_columns: Columns::Between(0, ARENA_WIDTH as i32),
            vertical_span: EVALUATION_VERTICAL_SPAN,
            exit: ExitThreshold::LanePlusSize,
        }
    }
}

/// Owns the seeded stream hazards are drawn from and hands out stable ids.
#[derive(Clone, Debug)]
pub struct HazardSpawner {
    rng: SeededRng,
    profile: SpawnProfile,
    next_id: u32,
}

impl HazardSpawner {
    pub fn new(seed: u32, profile: SpawnProfile) -> Self {
        Self::from_rng(SeededRng::new(seed), profile)
    }

    pub fn from_rng(rng: SeededRng, profile: SpawnProfile) -> Self {
        Self {
            rng,
            profile,
            next_id: 0,
        }
    }

    pub fn profile(&self) -> SpawnProfile {
        self.profile
    }

    pub fn rng(&self) -> SeededRng {
        self.rng
    }

    pub fn rng_state(&self) -> u32 {
        self.rng.state()
    }

    pub fn spawned(&self) -> u32 {
        self.next_id
    }

    /// Draws size, then spawn column, then target column.
    pub fn spawn(&mut self) -> Hazard {
        let size = self
            .rng
            .next_stepped(HAZARD_SIZE_MIN, HAZARD_SIZE_MAX_EXCLUSIVE, HAZARD_SIZE_STEP);
        let spawn_x = self.profile.spawn_columns.draw(&mut self.rng, size);
        let target_x = self.profile.target_columns.draw(&mut self.rng, size);

        let id = HazardId(self.next_id);
        self.next_id += 1;

        Hazard::aimed(
            id,
            spawn_x as f64,
            size as f64,
            target_x as f64,
            self.profile.vertical_span,
        )
    }
}

/// Fires once every spawn interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpawnClock {
    counter: u32,
}

impl SpawnClock {
    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn advance(&mut self) -> bool {
        self.counter += 1;
        if self.counter >= HAZARD_SPAWN_INTERVAL_TICKS {
            self.counter = 0;
            return true;
        }
        false
    }

    /// Restarts the interval part-way through, shortening the next wait.
    pub fn restart_at(&mut self, counter: u32) {
        self.counter = counter;
    }
}
