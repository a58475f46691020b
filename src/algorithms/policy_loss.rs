//! PPO clipped surrogate objective and value regression loss.
//!
//! Tensor versions carry gradients for training; the scalar versions mirror
//! them exactly on plain `f32` slices and exist for property checks.
//!
//! No ratio clamping happens here beyond the objective's own clip term.
//! Non-finite intermediates propagate into the loss so the caller can detect
//! and reject them.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// PPO clipped surrogate policy loss.
///
/// L = -E[ min(r_t A_t, clip(r_t, 1-ε, 1+ε) A_t) ]
/// where r_t = exp(log π(a|s) - log π_old(a|s)).
///
/// # Arguments
///
/// * `new_log_probs` - log π(a_t|s_t) under current parameters [batch]
/// * `old_log_probs` - frozen behavior-policy log probs [batch]
/// * `advantages` - advantage estimates [batch]
/// * `clip_epsilon` - clipping radius ε
pub fn clipped_surrogate_loss<B: Backend>(
    new_log_probs: Tensor<B, 1>,
    old_log_probs: Tensor<B, 1>,
    advantages: Tensor<B, 1>,
    clip_epsilon: f32,
) -> Tensor<B, 1> {
    let ratio = (new_log_probs - old_log_probs).exp();
    let surr1 = ratio.clone() * advantages.clone();
    let surr2 = ratio.clamp(1.0 - clip_epsilon, 1.0 + clip_epsilon) * advantages;
    surr1.min_pair(surr2).mean().neg()
}

/// Mean squared error between value predictions and regression targets.
pub fn value_loss<B: Backend>(values: Tensor<B, 1>, targets: Tensor<B, 1>) -> Tensor<B, 1> {
    let diff = values - targets;
    (diff.clone() * diff).mean()
}

/// Scalar mirror of [`clipped_surrogate_loss`].
pub fn clipped_surrogate_loss_scalar(
    new_log_probs: &[f32],
    old_log_probs: &[f32],
    advantages: &[f32],
    clip_epsilon: f32,
) -> f32 {
    let n = new_log_probs.len();
    debug_assert_eq!(old_log_probs.len(), n);
    debug_assert_eq!(advantages.len(), n);

    let mut total = 0.0;
    for i in 0..n {
        let ratio = (new_log_probs[i] - old_log_probs[i]).exp();
        let clipped = ratio.clamp(1.0 - clip_epsilon, 1.0 + clip_epsilon);
        total += (ratio * advantages[i]).min(clipped * advantages[i]);
    }
    -(total / n as f32)
}

/// Scalar mirror of [`value_loss`].
pub fn value_loss_scalar(values: &[f32], targets: &[f32]) -> f32 {
    debug_assert_eq!(values.len(), targets.len());
    let n = values.len() as f32;
    values
        .iter()
        .zip(targets.iter())
        .map(|(v, t)| (v - t) * (v - t))
        .sum::<f32>()
        / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray<f32>;

    const EPS: f32 = 0.2;

    /// Surrogate loss for a single sample at the given importance ratio.
    fn loss_at_ratio(ratio: f32, advantage: f32) -> f32 {
        clipped_surrogate_loss_scalar(&[ratio.ln()], &[0.0], &[advantage], EPS)
    }

    #[test]
    fn test_continuous_at_clip_boundaries() {
        for advantage in [1.0, -1.0] {
            for boundary in [1.0 - EPS, 1.0 + EPS] {
                let below = loss_at_ratio(boundary - 1e-4, advantage);
                let above = loss_at_ratio(boundary + 1e-4, advantage);
                assert!(
                    (below - above).abs() < 1e-3,
                    "discontinuity at ratio {} (adv {}): {} vs {}",
                    boundary,
                    advantage,
                    below,
                    above
                );
            }
        }
    }

    #[test]
    fn test_clip_caps_positive_advantage_gain() {
        // Beyond 1+ε the objective is flat for positive advantages.
        let at_edge = loss_at_ratio(1.0 + EPS, 2.0);
        let far_out = loss_at_ratio(3.0, 2.0);
        assert!((at_edge - far_out).abs() < 1e-6);
    }

    #[test]
    fn test_pessimistic_branch_for_negative_advantage() {
        // For negative advantages and large ratios the unclipped branch is
        // the smaller (more pessimistic) one and must win the min.
        let loss = loss_at_ratio(3.0, -1.0);
        assert!((loss - 3.0).abs() < 1e-5, "got {}", loss);
    }

    #[test]
    fn test_tensor_matches_scalar() {
        let device = Default::default();
        let new_lp = [-0.1f32, -0.9, -2.0];
        let old_lp = [-0.3f32, -0.5, -1.5];
        let adv = [1.0f32, -0.5, 0.25];

        let tensor_loss = clipped_surrogate_loss(
            Tensor::<B, 1>::from_floats(new_lp.as_slice(), &device),
            Tensor::<B, 1>::from_floats(old_lp.as_slice(), &device),
            Tensor::<B, 1>::from_floats(adv.as_slice(), &device),
            EPS,
        );
        let tensor_loss = tensor_loss.into_data().as_slice::<f32>().unwrap()[0];
        let scalar_loss = clipped_surrogate_loss_scalar(&new_lp, &old_lp, &adv, EPS);

        assert!((tensor_loss - scalar_loss).abs() < 1e-5);
    }

    #[test]
    fn test_value_loss() {
        let device = Default::default();
        let values = [1.0f32, 2.0, 3.0];
        let targets = [1.0f32, 0.0, 3.0];

        let loss = value_loss(
            Tensor::<B, 1>::from_floats(values.as_slice(), &device),
            Tensor::<B, 1>::from_floats(targets.as_slice(), &device),
        );
        let loss = loss.into_data().as_slice::<f32>().unwrap()[0];

        assert!((loss - value_loss_scalar(&values, &targets)).abs() < 1e-6);
        assert!((loss - 4.0 / 3.0).abs() < 1e-5);
    }
}
