//! PPO hyperparameter configuration.
//!
//! # Validation
//!
//! Use `validate()` to check a configuration before constructing an agent.
//! Agent construction validates automatically and refuses to build anything
//! from a rejected configuration.

use serde::{Deserialize, Serialize};

/// PPO hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PpoConfig {
    /// Discount factor γ. Must be in [0, 1].
    pub gamma: f32,
    /// Policy network learning rate. Must be > 0 and finite.
    pub actor_lr: f64,
    /// Value network learning rate. Must be > 0 and finite.
    pub critic_lr: f64,
    /// Minibatch size. Must be >= 1; the final minibatch of each epoch may
    /// be smaller.
    pub batch_size: usize,
    /// Hidden layer width of both networks. Must be >= 1.
    pub latent_dim: usize,
    /// GAE λ parameter. Must be in [0, 1].
    pub gae_lambda: f32,
    /// Clipping radius ε of the surrogate objective. Must be > 0 and finite.
    pub clip_epsilon: f32,
    /// Optimization epochs per update pass. Must be >= 1.
    pub n_epochs: usize,
    /// Reuse the pre-update value targets for every minibatch instead of
    /// recomputing them from the current value network.
    pub freeze_value_targets: bool,
}

impl Default for PpoConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            actor_lr: 3e-4,
            critic_lr: 1e-3,
            batch_size: 64,
            latent_dim: 64,
            gae_lambda: 0.95,
            clip_epsilon: 0.2,
            n_epochs: 10,
            freeze_value_targets: false,
        }
    }
}

/// Validation errors for [`PpoConfig`].
#[derive(Debug, Clone, PartialEq)]
pub enum PpoConfigError {
    /// gamma must be in [0, 1]
    InvalidGamma(f32),
    /// gae_lambda must be in [0, 1]
    InvalidGaeLambda(f32),
    /// actor_lr must be > 0 and finite
    InvalidActorLr(f64),
    /// critic_lr must be > 0 and finite
    InvalidCriticLr(f64),
    /// batch_size must be >= 1
    InvalidBatchSize(usize),
    /// latent_dim must be >= 1
    InvalidLatentDim(usize),
    /// clip_epsilon must be > 0 and finite
    InvalidClipEpsilon(f32),
    /// n_epochs must be >= 1
    InvalidNEpochs(usize),
}

impl std::fmt::Display for PpoConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidGamma(v) => write!(f, "gamma must be in [0, 1], got {}", v),
            Self::InvalidGaeLambda(v) => write!(f, "gae_lambda must be in [0, 1], got {}", v),
            Self::InvalidActorLr(v) => write!(f, "actor_lr must be > 0 and finite, got {}", v),
            Self::InvalidCriticLr(v) => write!(f, "critic_lr must be > 0 and finite, got {}", v),
            Self::InvalidBatchSize(v) => write!(f, "batch_size must be >= 1, got {}", v),
            Self::InvalidLatentDim(v) => write!(f, "latent_dim must be >= 1, got {}", v),
            Self::InvalidClipEpsilon(v) => {
                write!(f, "clip_epsilon must be > 0 and finite, got {}", v)
            }
            Self::InvalidNEpochs(v) => write!(f, "n_epochs must be >= 1, got {}", v),
        }
    }
}

impl std::error::Error for PpoConfigError {}

impl PpoConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration.
    ///
    /// Returns `Ok(())` if every parameter is valid, or the first error found.
    pub fn validate(&self) -> Result<(), PpoConfigError> {
        if self.gamma < 0.0 || self.gamma > 1.0 || !self.gamma.is_finite() {
            return Err(PpoConfigError::InvalidGamma(self.gamma));
        }
        if self.gae_lambda < 0.0 || self.gae_lambda > 1.0 || !self.gae_lambda.is_finite() {
            return Err(PpoConfigError::InvalidGaeLambda(self.gae_lambda));
        }
        if self.actor_lr <= 0.0 || !self.actor_lr.is_finite() {
            return Err(PpoConfigError::InvalidActorLr(self.actor_lr));
        }
        if self.critic_lr <= 0.0 || !self.critic_lr.is_finite() {
            return Err(PpoConfigError::InvalidCriticLr(self.critic_lr));
        }
        if self.batch_size == 0 {
            return Err(PpoConfigError::InvalidBatchSize(self.batch_size));
        }
        if self.latent_dim == 0 {
            return Err(PpoConfigError::InvalidLatentDim(self.latent_dim));
        }
        if self.clip_epsilon <= 0.0 || !self.clip_epsilon.is_finite() {
            return Err(PpoConfigError::InvalidClipEpsilon(self.clip_epsilon));
        }
        if self.n_epochs == 0 {
            return Err(PpoConfigError::InvalidNEpochs(self.n_epochs));
        }
        Ok(())
    }

    /// Set discount factor.
    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Set policy learning rate.
    pub fn with_actor_lr(mut self, actor_lr: f64) -> Self {
        self.actor_lr = actor_lr;
        self
    }

    /// Set value learning rate.
    pub fn with_critic_lr(mut self, critic_lr: f64) -> Self {
        self.critic_lr = critic_lr;
        self
    }

    /// Set minibatch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set hidden layer width.
    pub fn with_latent_dim(mut self, latent_dim: usize) -> Self {
        self.latent_dim = latent_dim;
        self
    }

    /// Set GAE lambda.
    pub fn with_gae_lambda(mut self, gae_lambda: f32) -> Self {
        self.gae_lambda = gae_lambda;
        self
    }

    /// Set clipping radius.
    pub fn with_clip_epsilon(mut self, clip_epsilon: f32) -> Self {
        self.clip_epsilon = clip_epsilon;
        self
    }

    /// Set number of epochs.
    pub fn with_n_epochs(mut self, n_epochs: usize) -> Self {
        self.n_epochs = n_epochs;
        self
    }

    /// Set value target freezing.
    pub fn with_freeze_value_targets(mut self, freeze: bool) -> Self {
        self.freeze_value_targets = freeze;
        self
    }
}
