//! PPO agent: action selection and the phased update pass.
//!
//! The update pass over a rollout buffer runs in strict phases:
//!
//! 1. validate the buffer layout (an empty buffer is a no-op),
//! 2. snapshot behavior-policy log probabilities without gradient tracking;
//!    they stay frozen for the whole pass,
//! 3. compute TD targets and residuals without gradient tracking, then GAE
//!    advantages; all three derived columns are written back to the buffer,
//! 4. for each epoch, shuffle all step indices and walk contiguous
//!    minibatches, taking one independent Adam step per network.
//!
//! No parameter is mutated until phases 1-3 have completed. Non-finite log
//! probabilities, residuals or losses abort the pass with
//! [`PpoError::NonFinite`] instead of being clamped.

use burn::module::AutodiffModule;
use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Tensor};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::config::{PpoConfig, PpoConfigError};
use super::PpoError;
use crate::algorithms::categorical::Categorical;
use crate::algorithms::gae::compute_advantages;
use crate::algorithms::policy_loss::{clipped_surrogate_loss, value_loss};
use crate::core::rollout::{select, RolloutBuffer};
use crate::nn::{PolicyNet, ValueNet};

/// Summary of one update pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainReport {
    /// Number of minibatch gradient steps taken (per network).
    pub minibatch_updates: usize,
    /// Mean clipped surrogate loss over the pass.
    pub policy_loss: f32,
    /// Mean value regression loss over the pass.
    pub value_loss: f32,
}

/// PPO agent over a discrete action space.
pub struct PpoAgent<B: AutodiffBackend> {
    config: PpoConfig,
    obs_dim: usize,
    n_actions: usize,
    policy_net: PolicyNet<B>,
    value_net: ValueNet<B>,
    policy_optim: OptimizerAdaptor<Adam, PolicyNet<B>, B>,
    value_optim: OptimizerAdaptor<Adam, ValueNet<B>, B>,
    rng: StdRng,
    device: B::Device,
}

impl<B: AutodiffBackend> PpoAgent<B> {
    /// Create an agent with freshly initialized networks.
    ///
    /// The configuration is validated first; nothing is constructed from a
    /// rejected configuration.
    pub fn new(
        config: PpoConfig,
        obs_dim: usize,
        n_actions: usize,
        seed: u64,
        device: &B::Device,
    ) -> Result<Self, PpoConfigError> {
        config.validate()?;
        let policy_net = PolicyNet::new(obs_dim, config.latent_dim, n_actions, device);
        let value_net = ValueNet::new(obs_dim, config.latent_dim, device);
        Self::from_networks(config, obs_dim, n_actions, policy_net, value_net, seed, device)
    }

    /// Create an agent around existing networks.
    pub fn from_networks(
        config: PpoConfig,
        obs_dim: usize,
        n_actions: usize,
        policy_net: PolicyNet<B>,
        value_net: ValueNet<B>,
        seed: u64,
        device: &B::Device,
    ) -> Result<Self, PpoConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            obs_dim,
            n_actions,
            policy_net,
            value_net,
            policy_optim: AdamConfig::new().init(),
            value_optim: AdamConfig::new().init(),
            rng: StdRng::seed_from_u64(seed),
            device: device.clone(),
        })
    }

    /// The agent's configuration.
    pub fn config(&self) -> &PpoConfig {
        &self.config
    }

    /// Observation width this agent expects.
    pub fn obs_dim(&self) -> usize {
        self.obs_dim
    }

    /// Number of discrete actions.
    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Current policy network.
    pub fn policy_net(&self) -> &PolicyNet<B> {
        &self.policy_net
    }

    /// Current value network.
    pub fn value_net(&self) -> &ValueNet<B> {
        &self.value_net
    }

    /// Select an action for one observation.
    ///
    /// Stochastic selection samples the categorical distribution from the
    /// agent's RNG; deterministic selection returns the distribution mode.
    pub fn take_action(
        &mut self,
        observation: &[f32],
        deterministic: bool,
    ) -> Result<u32, PpoError> {
        if observation.len() != self.obs_dim {
            return Err(PpoError::ShapeMismatch {
                expected: self.obs_dim,
                got: observation.len(),
            });
        }

        let obs = Tensor::<B::InnerBackend, 1>::from_floats(observation, &self.device)
            .reshape([1, self.obs_dim]);
        let dist = Categorical::from_logits(self.policy_net.valid().forward(obs));

        let action = if deterministic {
            dist.mode()[0]
        } else {
            dist.sample(&mut self.rng)[0]
        };
        Ok(action)
    }

    /// Action probabilities for one observation, without gradient tracking.
    pub fn action_probs(&self, observation: &[f32]) -> Result<Vec<f32>, PpoError> {
        if observation.len() != self.obs_dim {
            return Err(PpoError::ShapeMismatch {
                expected: self.obs_dim,
                got: observation.len(),
            });
        }
        let obs = Tensor::<B::InnerBackend, 1>::from_floats(observation, &self.device)
            .reshape([1, self.obs_dim]);
        let probs = Categorical::from_logits(self.policy_net.valid().forward(obs)).probs();
        Ok(tensor_to_vec(probs.flatten(0, 1)))
    }

    /// Run one full update pass over the buffer.
    ///
    /// Writes `old_log_probs`, `td_deltas` and `advantages` back into the
    /// buffer as a side effect. An empty buffer returns a zeroed report
    /// without touching parameters or RNG state.
    pub fn train(&mut self, buffer: &mut RolloutBuffer) -> Result<TrainReport, PpoError> {
        buffer.validate()?;
        if buffer.is_empty() {
            return Ok(TrainReport::default());
        }
        if buffer.obs_dim() != self.obs_dim {
            return Err(PpoError::ShapeMismatch {
                expected: self.obs_dim,
                got: buffer.obs_dim(),
            });
        }

        let n = buffer.len();

        // Phase 2: freeze behavior-policy log probabilities.
        let old_log_probs = {
            let obs = Tensor::<B::InnerBackend, 1>::from_floats(
                buffer.observations.as_slice(),
                &self.device,
            )
            .reshape([n, self.obs_dim]);
            let dist = Categorical::from_logits(self.policy_net.valid().forward(obs));
            tensor_to_vec(dist.log_prob(&buffer.actions, &self.device))
        };
        if old_log_probs.iter().any(|v| !v.is_finite()) {
            return Err(PpoError::NonFinite {
                context: "behavior-policy log probability",
            });
        }

        // Phase 3: TD targets and residuals under the current value net.
        let values = self.state_values(&buffer.observations, n);
        let next_values = self.state_values(&buffer.next_observations, n);

        let mut td_targets = Vec::with_capacity(n);
        let mut td_deltas = Vec::with_capacity(n);
        for t in 0..n {
            let not_done = if buffer.dones[t] { 0.0 } else { 1.0 };
            let target = buffer.rewards[t] + self.config.gamma * next_values[t] * not_done;
            td_targets.push(target);
            td_deltas.push(target - values[t]);
        }
        if td_deltas.iter().any(|v| !v.is_finite()) {
            return Err(PpoError::NonFinite {
                context: "TD residual",
            });
        }

        let advantages =
            compute_advantages(&td_deltas, &buffer.dones, self.config.gamma, self.config.gae_lambda);

        buffer.old_log_probs = old_log_probs.clone();
        buffer.td_deltas = td_deltas;
        buffer.advantages = advantages.clone();

        // Phase 4: epoch / minibatch updates.
        let mut report = TrainReport::default();
        for _ in 0..self.config.n_epochs {
            for minibatch in
                shuffled_minibatches(n, self.config.batch_size, &mut self.rng)
            {
                let (policy_loss, value_loss) = self.update_minibatch(
                    buffer,
                    &minibatch,
                    &old_log_probs,
                    &advantages,
                    &td_targets,
                )?;
                report.minibatch_updates += 1;
                report.policy_loss += policy_loss;
                report.value_loss += value_loss;
            }
        }

        report.policy_loss /= report.minibatch_updates as f32;
        report.value_loss /= report.minibatch_updates as f32;
        Ok(report)
    }

    /// One gradient step per network on a single minibatch.
    fn update_minibatch(
        &mut self,
        buffer: &RolloutBuffer,
        indices: &[usize],
        old_log_probs: &[f32],
        advantages: &[f32],
        frozen_targets: &[f32],
    ) -> Result<(f32, f32), PpoError> {
        let m = indices.len();

        let obs_rows = buffer.observation_rows(indices);
        let actions = select(&buffer.actions, indices);

        let targets = if self.config.freeze_value_targets {
            select(frozen_targets, indices)
        } else {
            // Reference behavior: targets track the value net as it moves
            // within the pass.
            let next_rows = buffer.next_observation_rows(indices);
            let next_values = self.state_values(&next_rows, m);
            indices
                .iter()
                .zip(next_values.iter())
                .map(|(&i, &nv)| {
                    let not_done = if buffer.dones[i] { 0.0 } else { 1.0 };
                    buffer.rewards[i] + self.config.gamma * nv * not_done
                })
                .collect()
        };

        let obs = Tensor::<B, 1>::from_floats(obs_rows.as_slice(), &self.device)
            .reshape([m, self.obs_dim]);

        let dist = Categorical::from_logits(self.policy_net.forward(obs.clone()));
        let new_log_probs = dist.log_prob(&actions, &self.device);
        if tensor_to_vec(new_log_probs.clone().inner())
            .iter()
            .any(|v| !v.is_finite())
        {
            return Err(PpoError::NonFinite {
                context: "log probability",
            });
        }

        let old_lp =
            Tensor::<B, 1>::from_floats(select(old_log_probs, indices).as_slice(), &self.device);
        let adv =
            Tensor::<B, 1>::from_floats(select(advantages, indices).as_slice(), &self.device);
        let target_tensor = Tensor::<B, 1>::from_floats(targets.as_slice(), &self.device);

        let policy_loss =
            clipped_surrogate_loss(new_log_probs, old_lp, adv, self.config.clip_epsilon);
        let predicted: Tensor<B, 1> = self.value_net.forward(obs).squeeze(1);
        let critic_loss = value_loss(predicted, target_tensor);

        let policy_scalar = policy_loss.clone().into_scalar().elem::<f32>();
        let value_scalar = critic_loss.clone().into_scalar().elem::<f32>();
        if !policy_scalar.is_finite() || !value_scalar.is_finite() {
            return Err(PpoError::NonFinite { context: "loss" });
        }

        let grads = policy_loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.policy_net);
        self.policy_net =
            self.policy_optim
                .step(self.config.actor_lr, self.policy_net.clone(), grads);

        let grads = critic_loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.value_net);
        self.value_net =
            self.value_optim
                .step(self.config.critic_lr, self.value_net.clone(), grads);

        Ok((policy_scalar, value_scalar))
    }

    /// Value estimates for `rows` flattened observations, no gradients.
    fn state_values(&self, flat_observations: &[f32], rows: usize) -> Vec<f32> {
        let obs = Tensor::<B::InnerBackend, 1>::from_floats(flat_observations, &self.device)
            .reshape([rows, self.obs_dim]);
        let values: Tensor<B::InnerBackend, 1> = self.value_net.valid().forward(obs).squeeze(1);
        tensor_to_vec(values)
    }
}

/// Shuffle all step indices and split into contiguous minibatches.
///
/// Yields exactly `ceil(n / batch_size)` minibatches covering every index
/// once; only the last may be short.
fn shuffled_minibatches(n: usize, batch_size: usize, rng: &mut StdRng) -> Vec<Vec<usize>> {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.chunks(batch_size).map(|c| c.to_vec()).collect()
}

fn tensor_to_vec<Bk: Backend>(tensor: Tensor<Bk, 1>) -> Vec<f32> {
    tensor
        .into_data()
        .to_vec::<f32>()
        .expect("tensor data is not f32")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transition::Transition;
    use burn::backend::{Autodiff, NdArray};

    type TB = Autodiff<NdArray<f32>>;

    fn small_config() -> PpoConfig {
        PpoConfig::new()
            .with_latent_dim(16)
            .with_batch_size(4)
            .with_n_epochs(2)
    }

    fn agent(seed: u64) -> PpoAgent<TB> {
        let device = Default::default();
        PpoAgent::new(small_config(), 4, 2, seed, &device).unwrap()
    }

    /// A short buffer where action 0 is always taken and always rewarded.
    fn rewarding_buffer(steps: usize) -> RolloutBuffer {
        let mut buffer = RolloutBuffer::new(4);
        for i in 0..steps {
            let x = i as f32 * 0.1;
            let obs = vec![x, -x, 0.5, 1.0];
            let next = vec![x + 0.1, -x - 0.1, 0.5, 1.0];
            buffer
                .push(Transition::new(obs, 0, 1.0, next, i == steps - 1))
                .unwrap();
        }
        buffer
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let device = Default::default();
        let result = PpoAgent::<TB>::new(
            PpoConfig::new().with_batch_size(0),
            4,
            2,
            0,
            &device,
        );
        assert_eq!(result.err(), Some(PpoConfigError::InvalidBatchSize(0)));
    }

    #[test]
    fn test_take_action_bounds_and_shape_check() {
        let mut agent = agent(3);

        let action = agent.take_action(&[0.1, 0.2, 0.3, 0.4], false).unwrap();
        assert!(action < 2);

        let err = agent.take_action(&[0.1, 0.2], false).unwrap_err();
        assert_eq!(err, PpoError::ShapeMismatch { expected: 4, got: 2 });
    }

    #[test]
    fn test_deterministic_action_is_mode() {
        let mut agent = agent(3);
        let obs = [0.3, -0.2, 0.1, 0.9];

        let probs = agent.action_probs(&obs).unwrap();
        let expected = if probs[0] >= probs[1] { 0 } else { 1 };

        for _ in 0..5 {
            assert_eq!(agent.take_action(&obs, true).unwrap(), expected as u32);
        }
    }

    #[test]
    fn test_empty_buffer_is_noop() {
        let mut agent = agent(1);
        let probe = [0.1, 0.2, 0.3, 0.4];
        let before = agent.action_probs(&probe).unwrap();

        let mut buffer = RolloutBuffer::new(4);
        let report = agent.train(&mut buffer).unwrap();

        assert_eq!(report, TrainReport::default());
        assert_eq!(agent.action_probs(&probe).unwrap(), before);
        assert!(buffer.advantages.is_empty());
    }

    #[test]
    fn test_train_rejects_wrong_buffer_width() {
        let mut agent = agent(1);
        let mut buffer = RolloutBuffer::new(3);
        buffer
            .push(Transition::new(vec![0.0; 3], 0, 1.0, vec![0.0; 3], true))
            .unwrap();
        let err = agent.train(&mut buffer).unwrap_err();
        assert_eq!(err, PpoError::ShapeMismatch { expected: 4, got: 3 });
    }

    #[test]
    fn test_non_finite_observation_aborts_before_any_update() {
        let mut agent = agent(21);
        let probe = [0.1, 0.2, 0.3, 0.4];
        let before = agent.action_probs(&probe).unwrap();

        // An infinite observation drives the policy logits non-finite, so
        // the behavior-policy log probabilities cannot be snapshotted.
        let mut buffer = RolloutBuffer::new(4);
        buffer
            .push(Transition::new(
                vec![f32::INFINITY; 4],
                0,
                1.0,
                vec![0.0; 4],
                true,
            ))
            .unwrap();

        let err = agent.train(&mut buffer).unwrap_err();
        assert!(matches!(err, PpoError::NonFinite { .. }), "got {:?}", err);

        // The pass aborted before phase 3: no derived column was written
        // and no parameter moved.
        assert!(buffer.old_log_probs.is_empty());
        assert!(buffer.td_deltas.is_empty());
        assert!(buffer.advantages.is_empty());
        assert_eq!(agent.action_probs(&probe).unwrap(), before);
    }

    #[test]
    fn test_train_writes_derived_columns() {
        let mut agent = agent(5);
        let mut buffer = rewarding_buffer(6);

        let report = agent.train(&mut buffer).unwrap();

        assert_eq!(buffer.old_log_probs.len(), 6);
        assert_eq!(buffer.td_deltas.len(), 6);
        assert_eq!(buffer.advantages.len(), 6);
        // 2 epochs * ceil(6 / 4) minibatches.
        assert_eq!(report.minibatch_updates, 4);
        assert!(report.policy_loss.is_finite());
        assert!(report.value_loss.is_finite());
    }

    #[test]
    fn test_minibatch_partition_exact() {
        let mut rng = StdRng::seed_from_u64(11);
        let minibatches = shuffled_minibatches(10, 4, &mut rng);

        assert_eq!(minibatches.len(), 3);
        assert_eq!(minibatches[0].len(), 4);
        assert_eq!(minibatches[1].len(), 4);
        assert_eq!(minibatches[2].len(), 2);

        let mut all: Vec<usize> = minibatches.into_iter().flatten().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());

        // Exact division leaves no short tail.
        let minibatches = shuffled_minibatches(8, 4, &mut rng);
        assert_eq!(minibatches.len(), 2);
        assert!(minibatches.iter().all(|m| m.len() == 4));
    }

    #[test]
    fn test_fresh_permutation_each_epoch() {
        let mut rng = StdRng::seed_from_u64(11);
        let first: Vec<usize> = shuffled_minibatches(64, 64, &mut rng)
            .into_iter()
            .flatten()
            .collect();
        let second: Vec<usize> = shuffled_minibatches(64, 64, &mut rng)
            .into_iter()
            .flatten()
            .collect();
        assert_ne!(first, second);
    }

    #[test]
    fn test_training_is_deterministic_under_fixed_seeds() {
        use burn::tensor::backend::Backend as _;

        let probe = [0.1, 0.2, 0.3, 0.4];

        let run = || {
            TB::seed(42);
            let mut agent = agent(7);
            let mut buffer = rewarding_buffer(8);
            agent.train(&mut buffer).unwrap();
            (
                agent.action_probs(&probe).unwrap(),
                buffer.advantages.clone(),
            )
        };

        let (probs_a, adv_a) = run();
        let (probs_b, adv_b) = run();

        assert_eq!(probs_a, probs_b, "updated parameters must be bit-identical");
        assert_eq!(adv_a, adv_b);
    }

    #[test]
    fn test_consistently_rewarded_action_gains_probability() {
        TB::seed(9);
        let mut agent = agent(13);
        let mut buffer = rewarding_buffer(16);

        let probe = [0.3, -0.3, 0.5, 1.0];
        let before = agent.action_probs(&probe).unwrap()[0];

        for _ in 0..3 {
            agent.train(&mut buffer).unwrap();
        }

        let after = agent.action_probs(&probe).unwrap()[0];
        assert!(
            after >= before - 1e-4,
            "probability of the rewarded action fell: {} -> {}",
            before,
            after
        );
    }

    #[test]
    fn test_frozen_value_targets_pass_runs() {
        let device = Default::default();
        let config = small_config().with_freeze_value_targets(true);
        let mut agent = PpoAgent::<TB>::new(config, 4, 2, 17, &device).unwrap();
        let mut buffer = rewarding_buffer(6);

        let report = agent.train(&mut buffer).unwrap();
        assert_eq!(report.minibatch_updates, 4);
        assert!(report.value_loss.is_finite());
    }
}
