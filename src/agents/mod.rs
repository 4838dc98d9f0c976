mod td3;

pub use td3::TD3;

use {
    crate::{
        components::ReplayBuffer,
        error::Result,
    },
    candle_core::{
        Device,
        Tensor,
    },
    std::{
        fmt::Display,
        ops::RangeInclusive,
        path::Path,
    },
};

/// The execution mode of an agent is either training or testing.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Train,
    Test,
}

impl Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Train => write!(f, "Train"),
            RunMode::Test => write!(f, "Test"),
        }
    }
}

pub trait Algorithm {
    type Config;

    fn config(&self) -> &Self::Config;
    fn from_config(
        device: &Device,
        config: &Self::Config,
        size_state: usize,
        action_domain: &[RangeInclusive<f64>],
    ) -> Result<Box<Self>>;

    /// Select an action for the given state.
    ///
    /// In [`RunMode::Train`] this adds exploration noise and clips the
    /// result into the action bounds; in [`RunMode::Test`] it returns the
    /// raw policy output.
    fn actions(
        &mut self,
        state: &Tensor,
        mode: RunMode,
    ) -> Result<Tensor>;

    /// Run one update step on a sampled minibatch.
    fn train(&mut self) -> Result<()>;

    /// The number of environment steps taken so far. Advanced by the caller
    /// via [`Algorithm::register_env_step`], never by action selection.
    fn total_env_steps(&self) -> usize;
    fn register_env_step(&mut self);
}

pub trait OffPolicyAlgorithm: Algorithm {
    fn remember(
        &mut self,
        state: &Tensor,
        action: &Tensor,
        reward: &Tensor,
        next_state: &Tensor,
        done: &Tensor,
    );

    fn replay_buffer(&self) -> &ReplayBuffer;
}

pub trait SaveableAlgorithm: Algorithm {
    fn save<P: AsRef<Path> + ?Sized>(
        &self,
        path: &P,
        name: &str,
    ) -> Result<()>;

    fn load<P: AsRef<Path> + ?Sized>(
        &mut self,
        path: &P,
        name: &str,
    ) -> Result<()>;
}
