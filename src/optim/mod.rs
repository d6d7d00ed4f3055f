pub mod decay;

pub use decay::{Optimizer, Rate};
