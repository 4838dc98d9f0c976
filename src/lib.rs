pub mod logging;
pub mod error;
pub mod util;

pub mod envs;
pub mod components;
pub mod agents;
pub mod configs;
pub mod engines;

pub use agents::RunMode;
