//! # ppo_rl: Proximal Policy Optimization for discrete control
//!
//! PPO with clipped surrogate objective and Generalized Advantage
//! Estimation, built on the `burn` tensor framework with separate policy
//! and value networks.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                      run_training                       │
//! ├────────────────────────────────────────────────────────┤
//! │  Environment ──steps──► RolloutBuffer                   │
//! │       ▲                      │                          │
//! │       │ take_action          ▼ train                    │
//! │  ┌─────────────────────────────────────┐               │
//! │  │ PpoAgent                             │               │
//! │  │   PolicyNet ── Categorical ── clip   │               │
//! │  │   ValueNet  ── TD targets ─── GAE    │               │
//! │  │   Adam × 2, seeded StdRng            │               │
//! │  └─────────────────────────────────────┘               │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use burn::backend::{Autodiff, NdArray};
//! use ppo_rl::{CartPoleEnv, ConsoleLogger, PpoAgent, PpoConfig, run_training};
//!
//! type B = Autodiff<NdArray<f32>>;
//!
//! let device = Default::default();
//! let config = PpoConfig::new().with_actor_lr(3e-4).with_n_epochs(10);
//! let mut agent: PpoAgent<B> = PpoAgent::new(config, 4, 2, 0, &device)?;
//! let mut env = CartPoleEnv::new(0);
//! let mut logger = ConsoleLogger::new(1);
//! run_training(&mut agent, &mut env, 100, 10, &mut logger)?;
//! ```

pub mod algorithms;
pub mod core;
pub mod environment;
pub mod metrics;
pub mod nn;
pub mod runner;

pub use core::rollout::{select, BufferLayoutError, RolloutBuffer};
pub use core::transition::Transition;

pub use algorithms::categorical::Categorical;
pub use algorithms::gae::compute_advantages;
pub use algorithms::policy_loss::{
    clipped_surrogate_loss, clipped_surrogate_loss_scalar, value_loss, value_loss_scalar,
};
pub use algorithms::ppo::{PpoAgent, PpoConfig, PpoConfigError, PpoError, TrainReport};

pub use nn::{PolicyNet, ValueNet};

pub use environment::{CartPoleEnv, Environment, StepOutcome};

pub use metrics::logger::{ConsoleLogger, CsvLogger, MetricsLogger, MultiLogger, TrainingSnapshot};

pub use runner::{collect_rollout, evaluate, run_training, RolloutReport};
