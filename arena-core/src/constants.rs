//! Arena rule constants.
//!
//! Positions are in arena pixels with the origin at the top-left corner and
//! y growing downward. Timers count simulation ticks.

// Arena dimensions
pub const ARENA_WIDTH: f64 = 400.0;
pub const ARENA_HEIGHT: f64 = 600.0;

// Agent
pub const AGENT_WIDTH: f64 = 69.0;
pub const AGENT_HEIGHT: f64 = 50.0;
pub const AGENT_VELOCITY: f64 = 5.0;
pub const AGENT_LANE_Y: f64 = 450.0;
pub const PLAY_AGENT_SPAWN_X: f64 = 100.0;
pub const EVALUATION_AGENT_SPAWN_X: f64 = 200.0;

// Projectiles
pub const PROJECTILE_WIDTH: f64 = 5.0;
pub const PROJECTILE_HEIGHT: f64 = 10.0;
pub const PROJECTILE_VELOCITY: f64 = 5.0;
/// Firing is allowed while the live projectile count is at or below this.
pub const PROJECTILE_CAP: usize = 3;
pub const FIRE_COOLDOWN_TICKS: u32 = 50;

// Hazards
pub const HAZARD_VELOCITY: f64 = 5.0;
pub const HAZARD_SIZE_MIN: u32 = 50;
pub const HAZARD_SIZE_MAX_EXCLUSIVE: u32 = 100;
pub const HAZARD_SIZE_STEP: u32 = 5;
pub const HAZARD_SPAWN_INTERVAL_TICKS: u32 = 80;

// Hazard aiming. Target columns keep half an agent's width from the walls.
pub const TARGET_MARGIN: i32 = (AGENT_WIDTH as i32) / 2;
pub const PLAY_VERTICAL_SPAN: f64 = 450.0;
pub const EVALUATION_VERTICAL_SPAN: f64 = 600.0;

// Play session
pub const STARTING_LIVES: u32 = 3;
pub const MAX_LIVES: u32 = 3;
pub const EXTRA_LIFE_SCORE_STEP: u32 = 100;
pub const EXTRA_LIFE_SPAWN_COUNTER_RESET: u32 = 20;
pub const INITIAL_TICK_RATE: f64 = 60.0;
pub const TICK_RATE_RAMP: f64 = 0.01;

// Evaluation fitness shaping
pub const FITNESS_PROJECTILE_HIT: f64 = 5.0;
pub const FITNESS_BODY_COLLISION: f64 = -4.0;
pub const FITNESS_WASTED_PROJECTILE: f64 = -0.1;
pub const FITNESS_LET_THROUGH: f64 = -2.0;
pub const FITNESS_FLOOR: f64 = -100.0;
pub const FITNESS_FLOOR_PENALTY: f64 = -10.0;
pub const EVALUATION_HAZARD_CAP: u32 = 1_500;

// Policy contract arity
pub const FEATURE_COUNT: usize = 5;
pub const OUTPUT_COUNT: usize = 2;

// Leaderboard
pub const LEADERBOARD_CAPACITY: usize = 9;

// Input tape layout
pub const TAPE_MAGIC: u32 = 0x414E_5241; // "ARNA" little-endian
pub const TAPE_VERSION: u8 = 1;
pub const TAPE_HEADER_SIZE: usize = 16;
pub const TAPE_FOOTER_SIZE: usize = 12;
pub const MAX_TAPE_TICKS_DEFAULT: u32 = 216_000;
