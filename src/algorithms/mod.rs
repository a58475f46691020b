//! Algorithm building blocks: distribution, advantage estimation, losses,
//! and the PPO agent itself.

pub mod categorical;
pub mod gae;
pub mod policy_loss;
pub mod ppo;
