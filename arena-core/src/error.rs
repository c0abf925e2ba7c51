use core::fmt;

use crate::entities::AgentId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleCode {
    AgentBounds,
    ProjectileLimit,
    HazardRegistryOrder,
    DanglingVisibleHazard,
    VisibleHazardOrder,
    LivesRange,
}

impl fmt::Display for RuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AgentBounds => write!(f, "AGENT_BOUNDS"),
            Self::ProjectileLimit => write!(f, "PROJECTILE_LIMIT"),
            Self::HazardRegistryOrder => write!(f, "HAZARD_REGISTRY_ORDER"),
            Self::DanglingVisibleHazard => write!(f, "DANGLING_VISIBLE_HAZARD"),
            Self::VisibleHazardOrder => write!(f, "VISIBLE_HAZARD_ORDER"),
            Self::LivesRange => write!(f, "LIVES_RANGE"),
        }
    }
}

/// Violation of the `evaluate(features) -> outputs` contract.
#[derive(Clone, Debug, PartialEq)]
pub enum PolicyError {
    FeatureArity { expected: usize, actual: usize },
    OutputArity { expected: usize, actual: usize },
    Failed { reason: String },
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FeatureArity { expected, actual } => {
                write!(f, "policy expected {expected} features, got {actual}")
            }
            Self::OutputArity { expected, actual } => {
                write!(f, "policy returned {actual} outputs, contract requires {expected}")
            }
            Self::Failed { reason } => write!(f, "policy failed: {reason}"),
        }
    }
}

impl std::error::Error for PolicyError {}

#[derive(Clone, Debug, PartialEq)]
pub enum EngineError {
    Policy {
        agent: AgentId,
        tick: u32,
        source: PolicyError,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Policy { agent, tick, source } => {
                write!(f, "policy contract error for agent {agent} at tick {tick}: {source}")
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Policy { source, .. } => Some(source),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeaderboardError {
    TooFewEntries { found: usize, expected: usize },
    InvalidEntry { index: usize, token: String },
}

impl fmt::Display for LeaderboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewEntries { found, expected } => write!(
                f,
                "leaderboard has {found} entries, expected at least {expected}"
            ),
            Self::InvalidEntry { index, token } => {
                write!(f, "leaderboard entry {index} is not an integer: {token:?}")
            }
        }
    }
}

impl std::error::Error for LeaderboardError {}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TapeError {
    TapeTooShort { actual: usize, min: usize },
    InvalidMagic { found: u32 },
    UnsupportedVersion { found: u8 },
    HeaderReservedNonZero,
    TickCountOutOfRange { tick_count: u32, max_ticks: u32 },
    TapeLengthMismatch { expected: usize, actual: usize },
    ReservedInputBitsNonZero { tick: u32, byte: u8 },
    CrcMismatch { stored: u32, computed: u32 },
    TickCountMismatch { claimed: u32, computed: u32 },
    ScoreMismatch { claimed: u32, computed: u32 },
    RngMismatch { claimed: u32, computed: u32 },
    RuleViolation { tick: u32, rule: RuleCode },
}

impl fmt::Display for TapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TapeTooShort { actual, min } => {
                write!(f, "tape too short: got {actual} bytes, need at least {min}")
            }
            Self::InvalidMagic { found } => write!(f, "invalid tape magic: 0x{found:08x}"),
            Self::UnsupportedVersion { found } => write!(f, "unsupported tape version: {found}"),
            Self::HeaderReservedNonZero => write!(f, "header reserved bytes are non-zero"),
            Self::TickCountOutOfRange {
                tick_count,
                max_ticks,
            } => write!(
                f,
                "tick count out of range: {tick_count} (allowed 1..={max_ticks})"
            ),
            Self::TapeLengthMismatch { expected, actual } => write!(
                f,
                "tape length mismatch: expected {expected} bytes, got {actual}"
            ),
            Self::ReservedInputBitsNonZero { tick, byte } => write!(
                f,
                "input byte reserved bits set at tick {tick}: 0x{byte:02x}"
            ),
            Self::CrcMismatch { stored, computed } => write!(
                f,
                "crc mismatch: stored=0x{stored:08x}, computed=0x{computed:08x}"
            ),
            Self::TickCountMismatch { claimed, computed } => {
                write!(f, "tick-count mismatch: claimed={claimed}, computed={computed}")
            }
            Self::ScoreMismatch { claimed, computed } => {
                write!(f, "score mismatch: claimed={claimed}, computed={computed}")
            }
            Self::RngMismatch { claimed, computed } => {
                write!(
                    f,
                    "rng mismatch: claimed=0x{claimed:08x}, computed=0x{computed:08x}"
                )
            }
            Self::RuleViolation { tick, rule } => {
                write!(f, "rule violation at tick {tick}: {rule}")
            }
        }
    }
}

impl std::error::Error for TapeError {}
