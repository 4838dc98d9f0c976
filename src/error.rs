use {
    std::path::PathBuf,
    thiserror::Error,
};

/// Failure modes of the agent and its components.
///
/// Everything here is surfaced to the calling loop rather than swallowed,
/// and nothing is retried automatically.
#[derive(Debug, Error)]
pub enum Td3Error {
    /// The replay buffer holds fewer transitions than a batch needs.
    #[error("insufficient data in the replay buffer: requested {requested}, have {available}")]
    InsufficientData { requested: usize, available: usize },

    /// A state or action vector of unexpected dimensionality reached a
    /// network or the clip function.
    #[error("shape mismatch for {what}: expected dimension {expected}, got {got}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// A named parameter file was requested but is absent. Fatal for
    /// evaluation mode, which cannot run on random parameters.
    #[error("missing checkpoint file: {0}")]
    MissingCheckpoint(PathBuf),

    #[error(transparent)]
    Candle(#[from] candle_core::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Td3Error>;
