pub mod batch;
pub mod log;
pub mod loop_fn;

pub use batch::{Batch, BatchMode};
pub use log::{ConfusionMatrix, IterationStats, TrainingLog};
