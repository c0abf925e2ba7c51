use crate::config::{LabConfig, PolicyKind};
use crate::network::FeedForwardNet;
use crate::policies::{create_policy, policy_ids, AgentPolicy, TrackerPolicy};
use crate::util::write_json;
use anyhow::{anyhow, Context, Result};
use arena_core::rng::SeededRng;
use arena_core::sim::Champion;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Champion file written after an evaluation so the next round can start
/// from it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChampionRecord {
    pub seed: u32,
    pub agent: u32,
    pub fitness: f64,
    pub policy: AgentPolicy,
}

impl ChampionRecord {
    pub fn new(seed: u32, champion: Champion<AgentPolicy>) -> Self {
        Self {
            seed,
            agent: champion.agent.0,
            fitness: champion.fitness,
            policy: champion.policy,
        }
    }
}

/// `population` networks drawn from one generator seeded with `seed`.
pub fn random_networks(config: &LabConfig, seed: u32) -> Vec<FeedForwardNet> {
    let mut rng = SeededRng::new(seed);
    (0..config.population)
        .map(|_| FeedForwardNet::random(config.hidden_units, config.weight_scale, &mut rng))
        .collect()
}

/// Population described by the config alone.
pub fn population_from_config(config: &LabConfig, seed: u32) -> Vec<AgentPolicy> {
    match config.policy {
        PolicyKind::Network => random_networks(config, seed)
            .into_iter()
            .map(AgentPolicy::Network)
            .collect(),
        PolicyKind::Tracker => {
            vec![AgentPolicy::Tracker(TrackerPolicy::default()); config.population]
        }
        PolicyKind::Idle => vec![AgentPolicy::Idle; config.population],
    }
}

/// Comma-separated roster ids, one agent each. Repeats are allowed.
pub fn population_from_ids(csv: &str) -> Result<Vec<AgentPolicy>> {
    let mut out = Vec::new();
    for token in csv.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let policy = create_policy(token).ok_or_else(|| {
            anyhow!(
                "unknown policy '{token}'. available: {}",
                policy_ids().join(", ")
            )
        })?;
        out.push(policy);
    }
    if out.is_empty() {
        return Err(anyhow!("--policies resolved to empty list"));
    }
    Ok(out)
}

/// JSON array of networks. Every network is shape-checked.
pub fn load_population(path: &Path) -> Result<Vec<FeedForwardNet>> {
    let data =
        fs::read(path).with_context(|| format!("failed reading population {}", path.display()))?;
    let networks: Vec<FeedForwardNet> = serde_json::from_slice(&data)
        .with_context(|| format!("failed parsing population {}", path.display()))?;
    if networks.is_empty() {
        return Err(anyhow!("population {} is empty", path.display()));
    }
    for (index, net) in networks.iter().enumerate() {
        net.validate()
            .with_context(|| format!("network {index} in {} is malformed", path.display()))?;
    }
    Ok(networks)
}

pub fn save_population(path: &Path, networks: &[FeedForwardNet]) -> Result<()> {
    write_json(path, &networks)
}

pub fn load_champion(path: &Path) -> Result<ChampionRecord> {
    let data =
        fs::read(path).with_context(|| format!("failed reading champion {}", path.display()))?;
    let record: ChampionRecord = serde_json::from_slice(&data)
        .with_context(|| format!("failed parsing champion {}", path.display()))?;
    if let AgentPolicy::Network(net) = &record.policy {
        net.validate()
            .with_context(|| format!("champion network in {} is malformed", path.display()))?;
    }
    Ok(record)
}

pub fn save_champion(path: &Path, record: &ChampionRecord) -> Result<()> {
    write_json(path, record)
}
