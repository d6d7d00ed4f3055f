//! A from-scratch feedforward neural network engine.
//!
//! Dense matrices, layered forward inference, backpropagation with
//! mean/sum mini-batches, dropout, regularization, learning-rate decay, and
//! genetic-style mutation and merging of networks.
//!
//! ```rust
//! use ferrite_evo::{NetworkBuilder, Rectifier};
//!
//! # fn main() -> ferrite_evo::Result<()> {
//! let mut network = NetworkBuilder::new(&[2, 4, 1])
//!     .rectifier(Rectifier::Sigmoid)
//!     .learning_rate(0.5)
//!     .seed(1)
//!     .build()?;
//! network.fit(&[1.0, 0.0], &[1.0])?;
//! assert_eq!(network.node_values().len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod math;
pub mod activation;
pub mod init;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod train;

// Convenience re-exports
pub use error::{Error, Result};
pub use math::matrix::Matrix;
pub use activation::rectifier::Rectifier;
pub use init::initializer::Initializer;
pub use layers::dense::Layer;
pub use network::{Network, NetworkBuilder, NetworkConfig, NetworkEvent};
pub use loss::{CostFunction, Regularizer};
pub use optim::decay::{Optimizer, Rate};
pub use train::batch::{Batch, BatchMode};
pub use train::log::{ConfusionMatrix, IterationStats, TrainingLog};
