pub mod mse;
pub mod cross_entropy;
pub mod bce;
pub mod mae;
pub mod huber;
pub mod cost_function;
pub mod regularizer;

pub use mse::MseLoss;
pub use cross_entropy::CrossEntropyLoss;
pub use bce::BceLoss;
pub use mae::MaeLoss;
pub use huber::HuberLoss;
pub use cost_function::CostFunction;
pub use regularizer::Regularizer;
