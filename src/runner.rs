//! Episode-wise rollout collection and the collect/update training loop.

use burn::tensor::backend::AutodiffBackend;

use crate::algorithms::ppo::{PpoAgent, PpoError};
use crate::core::rollout::RolloutBuffer;
use crate::core::transition::Transition;
use crate::environment::Environment;
use crate::metrics::logger::{MetricsLogger, TrainingSnapshot};

/// Summary of one collection phase.
#[derive(Debug, Clone, Default)]
pub struct RolloutReport {
    /// Environment steps collected.
    pub steps: usize,
    /// Episodes completed.
    pub episodes: usize,
    /// Mean episode return.
    pub mean_return: f32,
}

/// Collect complete episodes into the buffer with the stochastic policy.
pub fn collect_rollout<B: AutodiffBackend, E: Environment>(
    agent: &mut PpoAgent<B>,
    env: &mut E,
    buffer: &mut RolloutBuffer,
    episodes: usize,
) -> Result<RolloutReport, PpoError> {
    let mut report = RolloutReport::default();
    let mut total_return = 0.0;

    for _ in 0..episodes {
        let mut observation = env.reset();
        let mut episode_return = 0.0;

        loop {
            let action = agent.take_action(&observation, false)?;
            let outcome = env.step(action);

            buffer.push(Transition::new(
                observation,
                action,
                outcome.reward,
                outcome.observation.clone(),
                outcome.done,
            ))?;

            episode_return += outcome.reward;
            report.steps += 1;
            observation = outcome.observation;

            if outcome.done {
                break;
            }
        }

        report.episodes += 1;
        total_return += episode_return;
    }

    if report.episodes > 0 {
        report.mean_return = total_return / report.episodes as f32;
    }
    Ok(report)
}

/// Mean episode return of the deterministic (mode) policy.
pub fn evaluate<B: AutodiffBackend, E: Environment>(
    agent: &mut PpoAgent<B>,
    env: &mut E,
    episodes: usize,
) -> Result<f32, PpoError> {
    if episodes == 0 {
        return Ok(0.0);
    }

    let mut total_return = 0.0;

    for _ in 0..episodes {
        let mut observation = env.reset();
        loop {
            let action = agent.take_action(&observation, true)?;
            let outcome = env.step(action);
            total_return += outcome.reward;
            observation = outcome.observation;
            if outcome.done {
                break;
            }
        }
    }

    Ok(total_return / episodes as f32)
}

/// Alternate rollout collection and update passes.
///
/// Each round collects `episodes_per_round` fresh episodes, runs one update
/// pass over them, and emits a [`TrainingSnapshot`] through the logger.
/// Returns every snapshot produced.
pub fn run_training<B: AutodiffBackend, E: Environment>(
    agent: &mut PpoAgent<B>,
    env: &mut E,
    rounds: usize,
    episodes_per_round: usize,
    logger: &mut dyn MetricsLogger,
) -> Result<Vec<TrainingSnapshot>, PpoError> {
    let mut buffer = RolloutBuffer::new(env.obs_dim());
    let mut snapshots = Vec::with_capacity(rounds);
    let mut env_steps = 0;
    let mut episodes = 0;

    for round in 1..=rounds {
        buffer.clear();
        let rollout = collect_rollout(agent, env, &mut buffer, episodes_per_round)?;
        let train = agent.train(&mut buffer)?;

        env_steps += rollout.steps;
        episodes += rollout.episodes;

        let snapshot = TrainingSnapshot::new(round, env_steps, episodes, rollout.mean_return)
            .with_losses(train.policy_loss, train.value_loss);
        logger.log(&snapshot);
        snapshots.push(snapshot);
    }

    logger.flush();
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::ppo::PpoConfig;
    use crate::environment::CartPoleEnv;
    use burn::backend::{Autodiff, NdArray};

    type TB = Autodiff<NdArray<f32>>;

    fn tiny_agent(seed: u64) -> PpoAgent<TB> {
        let device = Default::default();
        let config = PpoConfig::new()
            .with_latent_dim(8)
            .with_batch_size(32)
            .with_n_epochs(1);
        PpoAgent::new(config, 4, 2, seed, &device).unwrap()
    }

    #[test]
    fn test_collect_rollout_fills_buffer() {
        let mut agent = tiny_agent(0);
        let mut env = CartPoleEnv::new(0);
        let mut buffer = RolloutBuffer::new(4);

        let report = collect_rollout(&mut agent, &mut env, &mut buffer, 2).unwrap();

        assert_eq!(report.episodes, 2);
        assert_eq!(buffer.len(), report.steps);
        assert!(report.mean_return >= 1.0);
        assert_eq!(buffer.dones.iter().filter(|&&d| d).count(), 2);
        buffer.validate().unwrap();
    }

    #[test]
    fn test_evaluate_runs_full_episodes() {
        let mut agent = tiny_agent(1);
        let mut env = CartPoleEnv::new(1);
        let mean_return = evaluate(&mut agent, &mut env, 2).unwrap();
        assert!(mean_return >= 1.0);
    }

    #[test]
    fn test_evaluate_zero_episodes() {
        let mut agent = tiny_agent(1);
        let mut env = CartPoleEnv::new(1);
        let mean_return = evaluate(&mut agent, &mut env, 0).unwrap();
        assert_eq!(mean_return, 0.0);
    }

    #[test]
    fn test_run_training_smoke() {
        let mut agent = tiny_agent(2);
        let mut env = CartPoleEnv::new(2);
        let mut logger = crate::metrics::logger::MultiLogger::new();

        let snapshots = run_training(&mut agent, &mut env, 2, 2, &mut logger).unwrap();

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].round, 1);
        assert!(snapshots[1].env_steps > snapshots[0].env_steps);
        assert!(snapshots[1].policy_loss.is_finite());
    }
}
