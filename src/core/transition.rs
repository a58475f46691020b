//! Transition record for on-policy rollout collection.

/// One environment step, immutable once recorded.
///
/// Stores everything the update pass needs to reconstruct TD targets and
/// importance ratios: the observation the action was taken in, the action
/// index, the reward, the successor observation, and the terminal flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Observation the action was chosen in.
    pub observation: Vec<f32>,
    /// Discrete action index.
    pub action: u32,
    /// Reward received after the action.
    pub reward: f32,
    /// Successor observation.
    pub next_observation: Vec<f32>,
    /// Episode ended at this step.
    pub done: bool,
}

impl Transition {
    /// Create a new transition.
    pub fn new(
        observation: Vec<f32>,
        action: u32,
        reward: f32,
        next_observation: Vec<f32>,
        done: bool,
    ) -> Self {
        Self {
            observation,
            action,
            reward,
            next_observation,
            done,
        }
    }

    /// Observation width of this transition.
    pub fn obs_dim(&self) -> usize {
        self.observation.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_new() {
        let t = Transition::new(vec![0.1, 0.2], 1, 1.0, vec![0.3, 0.4], false);
        assert_eq!(t.obs_dim(), 2);
        assert_eq!(t.action, 1);
        assert!(!t.done);
    }
}
