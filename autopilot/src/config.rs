use anyhow::{anyhow, Context, Result};
use arena_core::constants::EVALUATION_HAZARD_CAP;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const PRESET_NAMES: [&str; 3] = ["quick", "standard", "marathon"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Randomly initialised feed-forward networks.
    Network,
    Tracker,
    Idle,
}

/// One lab run: what population to field and how long to let it play.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabConfig {
    pub id: String,
    pub description: String,
    pub policy: PolicyKind,
    pub population: usize,

    // Network shape
    pub hidden_units: usize,
    pub weight_scale: f64,

    pub hazard_cap: u32,

    // Seeds: an explicit list wins over `seed_count` generated seeds.
    #[serde(default)]
    pub seeds: Vec<u32>,
    pub seed_count: u32,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            id: "standard".to_string(),
            description: "Mid-sized random network population, a few hundred hazards per run."
                .to_string(),
            policy: PolicyKind::Network,
            population: 32,
            hidden_units: 8,
            weight_scale: 1.0,
            hazard_cap: 300,
            seeds: Vec::new(),
            seed_count: 12,
        }
    }
}

impl LabConfig {
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::default()),
            "quick" => Some(Self {
                id: "quick".to_string(),
                description: "Smoke-test sized run.".to_string(),
                population: 8,
                hidden_units: 4,
                hazard_cap: 40,
                seed_count: 4,
                ..Self::default()
            }),
            "marathon" => Some(Self {
                id: "marathon".to_string(),
                description: "Large population held to the full hazard cap.".to_string(),
                population: 96,
                hidden_units: 12,
                weight_scale: 1.5,
                hazard_cap: EVALUATION_HAZARD_CAP,
                seed_count: 32,
                ..Self::default()
            }),
            _ => None,
        }
    }

    /// Forces every field into the range the runners accept.
    pub fn clamp(&mut self) {
        self.population = self.population.clamp(1, 1_024);
        self.hidden_units = self.hidden_units.clamp(1, 64);
        self.weight_scale = if self.weight_scale.is_finite() {
            self.weight_scale.clamp(0.01, 10.0)
        } else {
            1.0
        };
        self.hazard_cap = self.hazard_cap.clamp(1, EVALUATION_HAZARD_CAP);
        self.seed_count = self.seed_count.clamp(1, 4_096);
    }
}

/// `--config` file wins over `--preset`; neither means the default. The
/// result is always clamped.
pub fn load_config(path: Option<&Path>, preset: Option<&str>) -> Result<LabConfig> {
    let mut config = if let Some(path) = path {
        let data =
            fs::read(path).with_context(|| format!("failed reading config {}", path.display()))?;
        serde_json::from_slice::<LabConfig>(&data)
            .with_context(|| format!("failed parsing config {}", path.display()))?
    } else if let Some(name) = preset {
        LabConfig::preset(name).ok_or_else(|| {
            anyhow!(
                "unknown preset '{name}' (try: {})",
                PRESET_NAMES.join(", ")
            )
        })?
    } else {
        LabConfig::default()
    };
    config.clamp();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_named_preset_resolves() {
        for name in PRESET_NAMES {
            let config = LabConfig::preset(name).unwrap();
            assert_eq!(config.id, name);
        }
        assert!(LabConfig::preset("turbo").is_none());
    }

    #[test]
    fn clamp_pulls_fields_into_range() {
        let mut config = LabConfig {
            population: 0,
            hidden_units: 500,
            weight_scale: f64::NAN,
            hazard_cap: 0,
            seed_count: 0,
            ..LabConfig::default()
        };
        config.clamp();
        assert_eq!(config.population, 1);
        assert_eq!(config.hidden_units, 64);
        assert_eq!(config.weight_scale, 1.0);
        assert_eq!(config.hazard_cap, 1);
        assert_eq!(config.seed_count, 1);
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let err = load_config(None, Some("turbo")).unwrap_err();
        assert!(err.to_string().contains("turbo"));
    }
}
