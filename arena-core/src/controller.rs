use crate::entities::{Agent, ProjectileId};
use crate::error::PolicyError;
use crate::lifecycle::HazardRegistry;
use crate::policy::{Decision, Features, Policy};

/// Queries `policy` about the agent's oldest visible hazard. An agent with
/// nothing visible takes no action and the policy is not called.
pub fn decide<P>(
    agent: &Agent,
    registry: &HazardRegistry,
    policy: &mut P,
) -> Result<Option<Decision>, PolicyError>
where
    P: Policy + ?Sized,
{
    let Some(hazard) = agent.visible.iter().find_map(|id| registry.get(*id)) else {
        return Ok(None);
    };

    let features = Features::observe(hazard, agent);
    let outputs = policy.evaluate(features.as_slice())?;
    Decision::from_outputs(&outputs).map(Some)
}

/// Steers first, then attempts to fire.
pub fn act(agent: &mut Agent, decision: Decision) -> Option<ProjectileId> {
    agent.steer(decision.steer);
    if decision.fire {
        agent.try_fire()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{EVALUATION_VERTICAL_SPAN, FIRE_COOLDOWN_TICKS};
    use crate::entities::{AgentId, Hazard, HazardId};

    struct Recording {
        calls: Vec<Vec<f64>>,
        outputs: Vec<f64>,
    }

    impl Policy for Recording {
        fn evaluate(&mut self, features: &[f64]) -> Result<Vec<f64>, PolicyError> {
            self.calls.push(features.to_vec());
            Ok(self.outputs.clone())
        }
    }

    fn registry() -> HazardRegistry {
        let mut registry = HazardRegistry::default();
        registry.push(Hazard::aimed(HazardId(3), 40.0, 50.0, 40.0, EVALUATION_VERTICAL_SPAN));
        registry.push(Hazard::aimed(HazardId(5), 300.0, 80.0, 300.0, EVALUATION_VERTICAL_SPAN));
        registry
    }

    #[test]
    fn empty_visible_subset_skips_the_policy() {
        let agent = Agent::new(AgentId(0), 200.0);
        let mut policy = Recording {
            calls: Vec::new(),
            outputs: vec![1.0, -1.0],
        };
        assert_eq!(decide(&agent, &registry(), &mut policy), Ok(None));
        assert!(policy.calls.is_empty());
    }

    #[test]
    fn first_visible_hazard_drives_the_features() {
        let mut agent = Agent::new(AgentId(0), 200.0);
        agent.visible = vec![HazardId(5)];
        let mut policy = Recording {
            calls: Vec::new(),
            outputs: vec![1.0, -1.0],
        };

        let decision = decide(&agent, &registry(), &mut policy).unwrap().unwrap();
        assert_eq!(policy.calls, vec![vec![340.0, -40.0, 0.0, 200.0, 450.0]]);

        agent.cooldown_ticks = FIRE_COOLDOWN_TICKS;
        let fired = act(&mut agent, decision);
        assert!(fired.is_some());
        assert_eq!(agent.x, 205.0);
    }

    #[test]
    fn bad_output_arity_surfaces() {
        let mut agent = Agent::new(AgentId(0), 200.0);
        agent.visible = vec![HazardId(3)];
        let mut policy = Recording {
            calls: Vec::new(),
            outputs: vec![0.5],
        };
        assert!(matches!(
            decide(&agent, &registry(), &mut policy),
            Err(PolicyError::OutputArity { actual: 1, .. })
        ));
    }
}
