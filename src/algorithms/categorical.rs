//! Categorical action distribution over policy logits.
//!
//! Wraps a `[batch, n_actions]` logits tensor and provides the three views
//! the agent needs:
//! - host-side inverse-CDF sampling for rollout collection,
//! - host-side argmax for deterministic evaluation,
//! - a differentiable log-probability gather for the update pass.
//!
//! Log probabilities are raw `log_softmax` outputs. No epsilon is added and
//! nothing is clamped; a zero-probability action yields a non-finite log
//! probability that callers must detect and surface.

use burn::tensor::backend::Backend;
use burn::tensor::{
    activation::{log_softmax, softmax},
    Int, Tensor,
};
use rand::rngs::StdRng;
use rand::Rng;

/// Categorical distribution parameterized by unnormalized logits.
#[derive(Clone)]
pub struct Categorical<B: Backend> {
    /// Unnormalized log probabilities: [batch, n_actions]
    logits: Tensor<B, 2>,
}

impl<B: Backend> Categorical<B> {
    /// Create from a logits tensor.
    pub fn from_logits(logits: Tensor<B, 2>) -> Self {
        Self { logits }
    }

    /// Number of actions.
    pub fn n_actions(&self) -> usize {
        self.logits.dims()[1]
    }

    /// Batch size.
    pub fn batch_size(&self) -> usize {
        self.logits.dims()[0]
    }

    /// Probabilities (softmax of logits): [batch, n_actions].
    pub fn probs(&self) -> Tensor<B, 2> {
        softmax(self.logits.clone(), 1)
    }

    /// Log probabilities (log-softmax of logits): [batch, n_actions].
    pub fn log_probs(&self) -> Tensor<B, 2> {
        log_softmax(self.logits.clone(), 1)
    }

    /// Sample one action per batch row via inverse CDF on the host.
    pub fn sample(&self, rng: &mut StdRng) -> Vec<u32> {
        let probs = self.probs();
        let probs_data = probs.to_data();
        let probs_slice: &[f32] = probs_data.as_slice().expect("probs tensor is not f32");

        let batch_size = self.batch_size();
        let n_actions = self.n_actions();

        let mut actions = Vec::with_capacity(batch_size);
        for i in 0..batch_size {
            let threshold: f32 = rng.gen();
            let mut cumsum = 0.0;
            let mut selected = (n_actions - 1) as u32;

            for a in 0..n_actions {
                cumsum += probs_slice[i * n_actions + a];
                // The last-action fallback covers probabilities that sum to
                // slightly less than 1.0.
                if threshold < cumsum || a == n_actions - 1 {
                    selected = a as u32;
                    break;
                }
            }
            actions.push(selected);
        }
        actions
    }

    /// Most probable action per batch row (ties resolve to the lowest index).
    pub fn mode(&self) -> Vec<u32> {
        let logits_data = self.logits.to_data();
        let logits_slice: &[f32] = logits_data.as_slice().expect("logits tensor is not f32");

        let n_actions = self.n_actions();
        (0..self.batch_size())
            .map(|i| {
                let row = &logits_slice[i * n_actions..(i + 1) * n_actions];
                let mut best = 0usize;
                for (a, &v) in row.iter().enumerate() {
                    if v > row[best] {
                        best = a;
                    }
                }
                best as u32
            })
            .collect()
    }

    /// Log probabilities of the given actions, with gradient flow: [batch].
    pub fn log_prob(&self, actions: &[u32], device: &B::Device) -> Tensor<B, 1> {
        let batch_size = actions.len();

        let action_indices: Vec<i32> = actions.iter().map(|&a| a as i32).collect();
        let actions_tensor: Tensor<B, 1, Int> =
            Tensor::from_ints(action_indices.as_slice(), device);
        let actions_2d: Tensor<B, 2, Int> = actions_tensor.reshape([batch_size, 1]);

        self.log_probs().gather(1, actions_2d).flatten(0, 1)
    }
}
