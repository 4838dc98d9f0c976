use {
    super::AlgorithmConfig,
    serde::{
        Deserialize,
        Serialize,
    },
};

#[allow(non_camel_case_types)]
#[derive(Clone, Serialize, Deserialize)]
pub struct TD3_Config {
    // The learning rates for the Actor and Critic networks.
    pub actor_learning_rate: f64,
    pub critic_learning_rate: f64,
    // The impact of the q value of the next state on the current state's q value.
    pub gamma: f64,
    // The weight for updating the target networks.
    pub tau: f64,
    // The number of neurons in the hidden layers of the Actor and Critic networks.
    pub hidden_1_size: usize,
    pub hidden_2_size: usize,
    // The capacity of the replay buffer used for sampling training data.
    pub replay_buffer_capacity: usize,
    // The training batch size for each training iteration.
    pub training_batch_size: usize,
    // Number of initial environment steps with randomly sampled actions.
    pub explore_steps: usize,
    // Update the actor and the target networks every `policy_update` critic updates.
    pub policy_update: usize,
    // Stddev of the Gaussian smoothing noise added to target-policy actions.
    pub policy_noise: f64,
    // Stddev of the Gaussian exploration noise added during action selection.
    pub explore_noise: f64,
    // Clip range for the target-policy smoothing noise.
    pub noise_clip: f64,
}
impl TD3_Config {
    pub fn pendulum() -> Self {
        Self {
            actor_learning_rate: 1e-4,
            critic_learning_rate: 1e-3,
            gamma: 0.99,
            tau: 0.005,
            hidden_1_size: 400,
            hidden_2_size: 300,
            replay_buffer_capacity: 100_000,
            training_batch_size: 64,
            explore_steps: 1000,
            policy_update: 2,
            policy_noise: 0.2,
            explore_noise: 0.1,
            noise_clip: 0.5,
        }
    }

    pub fn humanoid() -> Self {
        Self {
            actor_learning_rate: 1e-3,
            critic_learning_rate: 1e-3,
            gamma: 0.99,
            tau: 0.005,
            hidden_1_size: 400,
            hidden_2_size: 300,
            replay_buffer_capacity: 1_000_000,
            training_batch_size: 64,
            explore_steps: 1000,
            policy_update: 2,
            policy_noise: 0.2,
            explore_noise: 0.1,
            noise_clip: 0.5,
        }
    }
}

impl AlgorithmConfig for TD3_Config {
    fn explore_steps(&self) -> usize {
        self.explore_steps
    }
    fn set_explore_steps(&mut self, explore_steps: usize) {
        self.explore_steps = explore_steps;
    }
}
