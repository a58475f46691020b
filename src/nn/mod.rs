//! Policy and value networks.
//!
//! Both heads share the same two-layer MLP shape: a linear trunk into a
//! ReLU, then a linear head. The policy head emits unnormalized logits; the
//! value head emits one scalar per row.

use burn::module::Module;
use burn::nn::{Linear, LinearConfig, Relu};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Policy network: observations -> action logits.
#[derive(Module, Debug)]
pub struct PolicyNet<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    activation: Relu,
}

impl<B: Backend> PolicyNet<B> {
    /// Initialize with the given layer widths.
    pub fn new(obs_dim: usize, latent_dim: usize, n_actions: usize, device: &B::Device) -> Self {
        Self {
            fc1: LinearConfig::new(obs_dim, latent_dim).init(device),
            fc2: LinearConfig::new(latent_dim, n_actions).init(device),
            activation: Relu::new(),
        }
    }

    /// Forward pass: [batch, obs_dim] -> [batch, n_actions] logits.
    pub fn forward(&self, observations: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.fc1.forward(observations));
        self.fc2.forward(x)
    }
}

/// Value network: observations -> state-value estimates.
#[derive(Module, Debug)]
pub struct ValueNet<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    activation: Relu,
}

impl<B: Backend> ValueNet<B> {
    /// Initialize with the given layer widths.
    pub fn new(obs_dim: usize, latent_dim: usize, device: &B::Device) -> Self {
        Self {
            fc1: LinearConfig::new(obs_dim, latent_dim).init(device),
            fc2: LinearConfig::new(latent_dim, 1).init(device),
            activation: Relu::new(),
        }
    }

    /// Forward pass: [batch, obs_dim] -> [batch, 1] values.
    pub fn forward(&self, observations: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.fc1.forward(observations));
        self.fc2.forward(x)
    }
}
