//! Proximal Policy Optimization for discrete action spaces.
//!
//! The [`PpoAgent`] owns separate policy and value networks with one Adam
//! optimizer each, and runs the clipped-surrogate update over a
//! [`RolloutBuffer`](crate::core::rollout::RolloutBuffer) of collected
//! transitions.

pub mod agent;
pub mod config;

pub use agent::{PpoAgent, TrainReport};
pub use config::{PpoConfig, PpoConfigError};

use crate::core::rollout::BufferLayoutError;

/// Errors from agent construction and the update pass.
#[derive(Debug, Clone, PartialEq)]
pub enum PpoError {
    /// Hyperparameter validation failed.
    Config(PpoConfigError),
    /// Buffer columns are inconsistent.
    Layout(BufferLayoutError),
    /// An observation does not match the agent's observation width.
    ShapeMismatch { expected: usize, got: usize },
    /// A non-finite value appeared where a finite one is required. Nothing
    /// is clamped; the pass aborts before any further parameter change.
    NonFinite { context: &'static str },
}

impl std::fmt::Display for PpoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {}", e),
            Self::Layout(e) => write!(f, "invalid buffer layout: {}", e),
            Self::ShapeMismatch { expected, got } => {
                write!(f, "observation width mismatch: expected {}, got {}", expected, got)
            }
            Self::NonFinite { context } => {
                write!(f, "non-finite value encountered in {}", context)
            }
        }
    }
}

impl std::error::Error for PpoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Layout(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PpoConfigError> for PpoError {
    fn from(e: PpoConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<BufferLayoutError> for PpoError {
    fn from(e: BufferLayoutError) -> Self {
        Self::Layout(e)
    }
}
