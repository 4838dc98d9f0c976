mod eval;
mod train;

pub use eval::evaluation_loop_off_policy;
pub use train::training_loop_off_policy;
