//! # Components
//!
//! This module contains the components that can be used to build an agent.
//!
//! ## Replay Buffer
//!
//! The [`ReplayBuffer`] struct implements a fixed-capacity FIFO store of
//! transitions, which is sampled uniformly at random by off-policy
//! algorithms such as [`crate::agents::TD3`].
//!
//! ## Action Bounds
//!
//! The [`ActionBound`] struct holds the per-dimension `[low, high]` range
//! of the action space. It defines both the actor's output scaling and the
//! hard clip applied everywhere an action is produced or consumed.
//!
//! ## Noise
//!
//! The [`GaussianNoise`] component draws tensor-shaped Gaussian noise. It
//! is used twice in TD3: unclipped for exploration during action selection,
//! and clipped for target-policy smoothing inside the update step.

mod bounds;
mod noise;
mod replay_buffer;

pub use bounds::ActionBound;
pub use noise::GaussianNoise;
pub use replay_buffer::{
    ReplayBuffer,
    Transition,
};
