mod td3;
mod train;

pub use td3::TD3_Config;
pub use train::TrainConfig;
pub use test::TestConfig;

/// Configuration shared by every algorithm the engines can drive.
pub trait AlgorithmConfig {
    /// Number of initial environment steps during which actions are sampled
    /// randomly from the action domain instead of from the policy. Training
    /// starts once this many steps have been taken.
    fn explore_steps(&self) -> usize;
    fn set_explore_steps(&mut self, explore_steps: usize);
}
