//! Environment abstraction and a built-in cart-pole task.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Result of a single environment step.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// Observation after the step.
    pub observation: Vec<f32>,
    /// Reward for the step.
    pub reward: f32,
    /// Episode ended at this step.
    pub done: bool,
}

/// A single discrete-action environment.
pub trait Environment {
    /// Observation width.
    fn obs_dim(&self) -> usize;

    /// Number of discrete actions.
    fn n_actions(&self) -> usize;

    /// Start a new episode and return the initial observation.
    fn reset(&mut self) -> Vec<f32>;

    /// Apply an action and advance one step.
    fn step(&mut self, action: u32) -> StepOutcome;
}

// Classic control cart-pole constants.
const GRAVITY: f32 = 9.8;
const CART_MASS: f32 = 1.0;
const POLE_MASS: f32 = 0.1;
const TOTAL_MASS: f32 = CART_MASS + POLE_MASS;
const POLE_HALF_LENGTH: f32 = 0.5;
const POLE_MASS_LENGTH: f32 = POLE_MASS * POLE_HALF_LENGTH;
const FORCE_MAG: f32 = 10.0;
const TAU: f32 = 0.02;
const THETA_THRESHOLD: f32 = 12.0 * 2.0 * std::f32::consts::PI / 360.0;
const X_THRESHOLD: f32 = 2.4;
const MAX_EPISODE_STEPS: usize = 200;

/// Cart-pole balancing task.
///
/// State is `[x, x_dot, theta, theta_dot]`. Action 0 pushes the cart left,
/// action 1 pushes right. Reward is 1.0 per step; the episode ends when the
/// pole tips past 12 degrees, the cart leaves the track, or the step limit
/// is reached. Reset states are drawn uniformly from [-0.05, 0.05] using
/// the environment's own seeded RNG.
pub struct CartPoleEnv {
    state: [f32; 4],
    steps: usize,
    rng: StdRng,
}

impl CartPoleEnv {
    /// Create a cart-pole environment with a seeded reset RNG.
    pub fn new(seed: u64) -> Self {
        Self {
            state: [0.0; 4],
            steps: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn observation(&self) -> Vec<f32> {
        self.state.to_vec()
    }

    fn failed(&self) -> bool {
        let [x, _, theta, _] = self.state;
        x.abs() > X_THRESHOLD || theta.abs() > THETA_THRESHOLD
    }
}

impl Environment for CartPoleEnv {
    fn obs_dim(&self) -> usize {
        4
    }

    fn n_actions(&self) -> usize {
        2
    }

    fn reset(&mut self) -> Vec<f32> {
        for v in self.state.iter_mut() {
            *v = self.rng.gen_range(-0.05..0.05);
        }
        self.steps = 0;
        self.observation()
    }

    fn step(&mut self, action: u32) -> StepOutcome {
        let [x, x_dot, theta, theta_dot] = self.state;

        let force = if action == 1 { FORCE_MAG } else { -FORCE_MAG };
        let cos_theta = theta.cos();
        let sin_theta = theta.sin();

        // Euler integration of the cart-pole dynamics.
        let temp =
            (force + POLE_MASS_LENGTH * theta_dot * theta_dot * sin_theta) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (POLE_HALF_LENGTH
                * (4.0 / 3.0 - POLE_MASS * cos_theta * cos_theta / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc * cos_theta / TOTAL_MASS;

        self.state = [
            x + TAU * x_dot,
            x_dot + TAU * x_acc,
            theta + TAU * theta_dot,
            theta_dot + TAU * theta_acc,
        ];
        self.steps += 1;

        let done = self.failed() || self.steps >= MAX_EPISODE_STEPS;
        StepOutcome {
            observation: self.observation(),
            reward: 1.0,
            done,
        }
    }
}
