use serde::{
    Deserialize,
    Serialize,
};

#[derive(Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    // The total environment-step budget for the run.
    max_steps: usize,
}
impl TrainConfig {
    pub fn new(max_steps: usize) -> Self {
        Self { max_steps }
    }

    pub fn pendulum() -> Self {
        Self { max_steps: 30_000 }
    }

    pub fn humanoid() -> Self {
        Self { max_steps: 500_000 }
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }
    pub fn set_max_steps(&mut self, max_steps: usize) {
        self.max_steps = max_steps;
    }
}
