use crate::network::FeedForwardNet;
use arena_core::constants::{AGENT_LANE_Y, AGENT_WIDTH};
use arena_core::policy::{check_feature_arity, Policy};
use arena_core::PolicyError;
use serde::{Deserialize, Serialize};

/// Steers toward the column where the hazard will cross the agent lane and
/// fires once lined up under it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackerPolicy {
    /// Offsets inside this band hold position.
    pub deadband: f64,
    /// Fires while the predicted offset is inside this band.
    pub fire_tolerance: f64,
}

impl Default for TrackerPolicy {
    fn default() -> Self {
        Self {
            deadband: 2.5,
            fire_tolerance: 12.0,
        }
    }
}

impl TrackerPolicy {
    fn predicted_offset(&self, features: &[f64]) -> f64 {
        let (center_x, center_y, angle, agent_x) =
            (features[0], features[1], features[2], features[3]);
        let drop = (AGENT_LANE_Y - center_y).max(0.0);
        let crossing_x = center_x + angle.tan() * drop;
        crossing_x - (agent_x + AGENT_WIDTH / 2.0)
    }
}

impl Policy for TrackerPolicy {
    fn evaluate(&mut self, features: &[f64]) -> Result<Vec<f64>, PolicyError> {
        check_feature_arity(features)?;
        let offset = self.predicted_offset(features);
        let steer = if offset.abs() <= self.deadband {
            0.0
        } else {
            offset
        };
        let fire = if offset.abs() <= self.fire_tolerance {
            -1.0
        } else {
            1.0
        };
        Ok(vec![steer, fire])
    }
}

/// Never moves, never fires. Baseline for rankings.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct IdlePolicy;

impl Policy for IdlePolicy {
    fn evaluate(&mut self, features: &[f64]) -> Result<Vec<f64>, PolicyError> {
        check_feature_arity(features)?;
        Ok(vec![0.0, 1.0])
    }
}

/// Every policy the lab can put into an arena. Serialized with a `kind` tag
/// so champions round-trip through JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentPolicy {
    Network(FeedForwardNet),
    Tracker(TrackerPolicy),
    Idle,
}

impl AgentPolicy {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Tracker(_) => "tracker",
            Self::Idle => "idle",
        }
    }
}

impl Policy for AgentPolicy {
    fn evaluate(&mut self, features: &[f64]) -> Result<Vec<f64>, PolicyError> {
        match self {
            Self::Network(net) => net.evaluate(features),
            Self::Tracker(tracker) => tracker.evaluate(features),
            Self::Idle => IdlePolicy.evaluate(features),
        }
    }
}

struct RosterEntry {
    id: &'static str,
    description: &'static str,
    build: fn() -> AgentPolicy,
}

const ROSTER: &[RosterEntry] = &[
    RosterEntry {
        id: "tracker",
        description: "Heuristic that leads the hazard to its lane crossing and fires when aligned.",
        build: || AgentPolicy::Tracker(TrackerPolicy::default()),
    },
    RosterEntry {
        id: "tracker-eager",
        description: "Tracker with a wide firing band; trades wasted shots for earlier hits.",
        build: || {
            AgentPolicy::Tracker(TrackerPolicy {
                deadband: 2.5,
                fire_tolerance: 30.0,
            })
        },
    },
    RosterEntry {
        id: "idle",
        description: "Stands still and never fires.",
        build: || AgentPolicy::Idle,
    },
];

pub fn policy_ids() -> Vec<&'static str> {
    ROSTER.iter().map(|entry| entry.id).collect()
}

pub fn describe_policies() -> Vec<(&'static str, &'static str)> {
    ROSTER
        .iter()
        .map(|entry| (entry.id, entry.description))
        .collect()
}

pub fn create_policy(id: &str) -> Option<AgentPolicy> {
    ROSTER
        .iter()
        .find(|entry| entry.id == id)
        .map(|entry| (entry.build)())
}
