//! Column-wise trajectory storage for PPO updates.
//!
//! Transitions are stored in flat parallel arrays rather than as a vector of
//! structs: observations live in a single row-major `Vec<f32>` so minibatch
//! rows can be gathered and handed to the tensor backend without per-step
//! allocation.
//!
//! The buffer also carries three derived per-step columns that the update
//! pass writes back on every call: `old_log_probs`, `td_deltas` and
//! `advantages`. They are empty until the first training pass and are
//! overwritten wholesale on each subsequent pass.

use crate::core::transition::Transition;

/// Layout errors for [`RolloutBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferLayoutError {
    /// A pushed observation does not match the buffer's observation width.
    ObservationWidth { expected: usize, got: usize },
    /// A storage column is inconsistent with the number of stored steps.
    ColumnLength {
        column: &'static str,
        expected: usize,
        got: usize,
    },
}

impl std::fmt::Display for BufferLayoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ObservationWidth { expected, got } => {
                write!(f, "observation width mismatch: expected {}, got {}", expected, got)
            }
            Self::ColumnLength {
                column,
                expected,
                got,
            } => write!(
                f,
                "column '{}' has length {}, expected {}",
                column, got, expected
            ),
        }
    }
}

impl std::error::Error for BufferLayoutError {}

/// Trajectory buffer: flat column-wise transition storage.
///
/// Growth is unbounded; on-policy callers clear the buffer between passes.
#[derive(Debug, Clone, Default)]
pub struct RolloutBuffer {
    obs_dim: usize,
    /// Observations, row-major `[len * obs_dim]`.
    pub observations: Vec<f32>,
    /// Successor observations, row-major `[len * obs_dim]`.
    pub next_observations: Vec<f32>,
    /// Action indices `[len]`.
    pub actions: Vec<u32>,
    /// Rewards `[len]`.
    pub rewards: Vec<f32>,
    /// Terminal flags `[len]`.
    pub dones: Vec<bool>,
    /// Behavior-policy log probabilities, written by the update pass.
    pub old_log_probs: Vec<f32>,
    /// TD residuals, written by the update pass.
    pub td_deltas: Vec<f32>,
    /// GAE advantages, written by the update pass.
    pub advantages: Vec<f32>,
}

impl RolloutBuffer {
    /// Create an empty buffer for observations of the given width.
    pub fn new(obs_dim: usize) -> Self {
        Self {
            obs_dim,
            ..Default::default()
        }
    }

    /// Create an empty buffer with capacity reserved for `steps` transitions.
    pub fn with_capacity(obs_dim: usize, steps: usize) -> Self {
        Self {
            obs_dim,
            observations: Vec::with_capacity(steps * obs_dim),
            next_observations: Vec::with_capacity(steps * obs_dim),
            actions: Vec::with_capacity(steps),
            rewards: Vec::with_capacity(steps),
            dones: Vec::with_capacity(steps),
            old_log_probs: Vec::new(),
            td_deltas: Vec::new(),
            advantages: Vec::new(),
        }
    }

    /// Observation width.
    pub fn obs_dim(&self) -> usize {
        self.obs_dim
    }

    /// Number of stored transitions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the buffer holds no transitions.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Append a transition.
    ///
    /// Rejects observations whose width differs from the buffer's.
    pub fn push(&mut self, transition: Transition) -> Result<(), BufferLayoutError> {
        if transition.observation.len() != self.obs_dim {
            return Err(BufferLayoutError::ObservationWidth {
                expected: self.obs_dim,
                got: transition.observation.len(),
            });
        }
        if transition.next_observation.len() != self.obs_dim {
            return Err(BufferLayoutError::ObservationWidth {
                expected: self.obs_dim,
                got: transition.next_observation.len(),
            });
        }

        self.observations.extend_from_slice(&transition.observation);
        self.next_observations
            .extend_from_slice(&transition.next_observation);
        self.actions.push(transition.action);
        self.rewards.push(transition.reward);
        self.dones.push(transition.done);
        Ok(())
    }

    /// Remove all transitions and derived columns.
    pub fn clear(&mut self) {
        self.observations.clear();
        self.next_observations.clear();
        self.actions.clear();
        self.rewards.clear();
        self.dones.clear();
        self.old_log_probs.clear();
        self.td_deltas.clear();
        self.advantages.clear();
    }

    /// Check that every column is consistent with `len` and `obs_dim`.
    ///
    /// Derived columns may be empty (before the first update pass) or full
    /// length; anything else is rejected.
    pub fn validate(&self) -> Result<(), BufferLayoutError> {
        let n = self.len();

        let check = |column: &'static str, got: usize, expected: usize| {
            if got != expected {
                Err(BufferLayoutError::ColumnLength {
                    column,
                    expected,
                    got,
                })
            } else {
                Ok(())
            }
        };

        check("observations", self.observations.len(), n * self.obs_dim)?;
        check(
            "next_observations",
            self.next_observations.len(),
            n * self.obs_dim,
        )?;
        check("rewards", self.rewards.len(), n)?;
        check("dones", self.dones.len(), n)?;

        for (column, len) in [
            ("old_log_probs", self.old_log_probs.len()),
            ("td_deltas", self.td_deltas.len()),
            ("advantages", self.advantages.len()),
        ] {
            if len != 0 {
                check(column, len, n)?;
            }
        }

        Ok(())
    }

    /// Gather observation rows for the given step indices, row-major.
    pub fn observation_rows(&self, indices: &[usize]) -> Vec<f32> {
        self.gather_rows(&self.observations, indices)
    }

    /// Gather successor observation rows for the given step indices.
    pub fn next_observation_rows(&self, indices: &[usize]) -> Vec<f32> {
        self.gather_rows(&self.next_observations, indices)
    }

    fn gather_rows(&self, flat: &[f32], indices: &[usize]) -> Vec<f32> {
        let mut out = Vec::with_capacity(indices.len() * self.obs_dim);
        for &i in indices {
            let start = i * self.obs_dim;
            out.extend_from_slice(&flat[start..start + self.obs_dim]);
        }
        out
    }
}

/// Gather scalar column entries at the given indices.
pub fn select<T: Copy>(values: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| values[i]).collect()
}
