//! The decision contract agents are driven through.
//!
//! A policy maps five features describing the oldest visible hazard and the
//! agent's own position to two outputs: `steer` and `fire`. The engine makes
//! no assumption about what sits behind the call.

use crate::constants::{FEATURE_COUNT, OUTPUT_COUNT};
use crate::entities::{Agent, Hazard, Steer};
use crate::error::PolicyError;

pub trait Policy {
    fn evaluate(&mut self, features: &[f64]) -> Result<Vec<f64>, PolicyError>;
}

impl<P: Policy + ?Sized> Policy for Box<P> {
    fn evaluate(&mut self, features: &[f64]) -> Result<Vec<f64>, PolicyError> {
        (**self).evaluate(features)
    }
}

impl<P: Policy + ?Sized> Policy for &mut P {
    fn evaluate(&mut self, features: &[f64]) -> Result<Vec<f64>, PolicyError> {
        (**self).evaluate(features)
    }
}

/// Stand-in for sessions that never bind a policy. It has no values, so it
/// can never actually be asked anything.
#[derive(Clone, Copy, Debug)]
pub enum Unbound {}

impl Policy for Unbound {
    fn evaluate(&mut self, _features: &[f64]) -> Result<Vec<f64>, PolicyError> {
        match *self {}
    }
}

/// `(hazard_center_x, hazard_center_y, hazard_angle, agent_x, agent_y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Features([f64; FEATURE_COUNT]);

impl Features {
    pub fn observe(hazard: &Hazard, agent: &Agent) -> Self {
        let (center_x, center_y) = hazard.center();
        Self([center_x, center_y, hazard.angle, agent.x, agent.y])
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    pub steer: Steer,
    pub fire: bool,
}

impl Decision {
    /// `steer > 0` moves right, `steer < 0` moves left, and `fire <= 0`
    /// requests a shot. NaN satisfies none of these, so it holds and
    /// does not fire.
    pub fn from_outputs(outputs: &[f64]) -> Result<Self, PolicyError> {
        if outputs.len() != OUTPUT_COUNT {
            return Err(PolicyError::OutputArity {
                expected: OUTPUT_COUNT,
                actual: outputs.len(),
            });
        }

        let steer = if outputs[0] > 0.0 {
            Steer::Right
        } else if outputs[0] < 0.0 {
            Steer::Left
        } else {
            Steer::Hold
        };

        Ok(Self {
            steer,
            fire: outputs[1] <= 0.0,
        })
    }
}

/// Guard for policy implementations that want to reject malformed input.
pub fn check_feature_arity(features: &[f64]) -> Result<(), PolicyError> {
    if features.len() != FEATURE_COUNT {
        return Err(PolicyError::FeatureArity {
            expected: FEATURE_COUNT,
            actual: features.len(),
        });
    }
    Ok(())
}
