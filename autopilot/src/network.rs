//! Small feed-forward network that plugs into the engine's policy contract.
//!
//! Five inputs, one `tanh` hidden layer, two linear outputs. Inputs are
//! rescaled to roughly unit range before the first layer so freshly drawn
//! weights do not saturate on raw pixel coordinates.

use arena_core::constants::{ARENA_HEIGHT, ARENA_WIDTH, FEATURE_COUNT, OUTPUT_COUNT};
use arena_core::policy::{check_feature_arity, Policy};
use arena_core::rng::SeededRng;
use arena_core::PolicyError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Neuron {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl Neuron {
    fn random(inputs: usize, scale: f64, rng: &mut SeededRng) -> Self {
        let weights = (0..inputs).map(|_| rng.next_signed_unit(scale)).collect();
        Self {
            weights,
            bias: rng.next_signed_unit(scale),
        }
    }

    fn activate(&self, inputs: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(inputs)
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedForwardNet {
    pub hidden: Vec<Neuron>,
    pub outputs: Vec<Neuron>,
}

impl FeedForwardNet {
    /// Weights and biases drawn uniformly from `[-scale, scale)`.
    pub fn random(hidden_units: usize, scale: f64, rng: &mut SeededRng) -> Self {
        let hidden = (0..hidden_units)
            .map(|_| Neuron::random(FEATURE_COUNT, scale, rng))
            .collect();
        let outputs = (0..OUTPUT_COUNT)
            .map(|_| Neuron::random(hidden_units, scale, rng))
            .collect();
        Self { hidden, outputs }
    }

    pub fn hidden_units(&self) -> usize {
        self.hidden.len()
    }

    /// Checks layer shapes. Networks loaded from disk go through this before
    /// they are handed to the engine.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.hidden.is_empty() {
            return Err(PolicyError::Failed {
                reason: "network has no hidden units".to_string(),
            });
        }
        if let Some(index) = self
            .hidden
            .iter()
            .position(|n| n.weights.len() != FEATURE_COUNT)
        {
            return Err(PolicyError::Failed {
                reason: format!(
                    "hidden neuron {index} has {} weights, expected {FEATURE_COUNT}",
                    self.hidden[index].weights.len()
                ),
            });
        }
        if self.outputs.len() != OUTPUT_COUNT {
            return Err(PolicyError::Failed {
                reason: format!(
                    "network has {} output neurons, expected {OUTPUT_COUNT}",
                    self.outputs.len()
                ),
            });
        }
        if let Some(index) = self
            .outputs
            .iter()
            .position(|n| n.weights.len() != self.hidden.len())
        {
            return Err(PolicyError::Failed {
                reason: format!(
                    "output neuron {index} has {} weights, expected {}",
                    self.outputs[index].weights.len(),
                    self.hidden.len()
                ),
            });
        }
        Ok(())
    }

    pub fn forward(&self, features: &[f64]) -> Vec<f64> {
        let scaled = normalize(features);
        let hidden: Vec<f64> = self
            .hidden
            .iter()
            .map(|neuron| neuron.activate(&scaled).tanh())
            .collect();
        self.outputs
            .iter()
            .map(|neuron| neuron.activate(&hidden))
            .collect()
    }
}

impl Policy for FeedForwardNet {
    fn evaluate(&mut self, features: &[f64]) -> Result<Vec<f64>, PolicyError> {
        check_feature_arity(features)?;
        Ok(self.forward(features))
    }
}

fn normalize(features: &[f64]) -> [f64; FEATURE_COUNT] {
    let mut scaled = [0.0; FEATURE_COUNT];
    for (index, (slot, value)) in scaled.iter_mut().zip(features).enumerate() {
        *slot = match index {
            0 | 3 => value / ARENA_WIDTH,
            1 | 4 => value / ARENA_HEIGHT,
            _ => *value,
        };
    }
    scaled
}
