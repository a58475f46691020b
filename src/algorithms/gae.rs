//! Generalized Advantage Estimation over precomputed TD residuals.
//!
//! The estimator consumes TD residuals δ_t = r_t + γ V(s_{t+1}) (1 - done_t)
//! - V(s_t) and folds them backward through a running accumulator. Each
//! residual is scaled by γλ exactly once as it enters the sum:
//!
//! A_t = γλ Σ_{l=0}^{T-t} δ_{t+l}
//!
//! The accumulator resets to zero at episode boundaries before the terminal
//! step is folded in, so no credit ever leaks across a `done` flag.
//!
//! ## References
//!
//! - Schulman et al., "High-Dimensional Continuous Control Using
//!   Generalized Advantage Estimation" (2016)

/// Compute advantages from TD residuals with a backward scan.
///
/// # Arguments
///
/// * `td_deltas` - TD residuals δ_t [T]
/// * `dones` - episode termination flags [T]
/// * `gamma` - discount factor
/// * `lambda` - GAE λ parameter
///
/// # Returns
///
/// Advantages [T]. Empty input yields an empty vector.
pub fn compute_advantages(
    td_deltas: &[f32],
    dones: &[bool],
    gamma: f32,
    lambda: f32,
) -> Vec<f32> {
    debug_assert_eq!(td_deltas.len(), dones.len());

    let n = td_deltas.len();
    let mut advantages = vec![0.0f32; n];
    let mut acc = 0.0f32;

    for t in (0..n).rev() {
        // Terminal step: nothing after it may contribute.
        if dones[t] {
            acc = 0.0;
        }
        acc += gamma * lambda * td_deltas[t];
        advantages[t] = acc;
    }

    advantages
}
