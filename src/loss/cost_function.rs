use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::loss::{BceLoss, CrossEntropyLoss, HuberLoss, MaeLoss, MseLoss};
use crate::math::matrix::Matrix;

/// Selects the cost the network minimizes.
///
/// - `Mse`                — Mean-squared error; pair with Identity or Sigmoid output.
/// - `CrossEntropy`       — Categorical cross-entropy; pair with Softmax output.
/// - `BinaryCrossEntropy` — Binary cross-entropy; pair with Sigmoid output.
/// - `Mae`                — Mean absolute error; pair with Identity output.
/// - `Huber`              — Huber loss (δ=1.0); pair with Identity output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostFunction {
    #[default]
    Mse,
    CrossEntropy,
    BinaryCrossEntropy,
    Mae,
    Huber,
}

impl CostFunction {
    pub fn cost(&self, predicted: &Matrix, expected: &Matrix) -> Result<f64> {
        match self {
            CostFunction::Mse                => MseLoss::loss(predicted, expected),
            CostFunction::CrossEntropy       => CrossEntropyLoss::loss(predicted, expected),
            CostFunction::BinaryCrossEntropy => BceLoss::loss(predicted, expected),
            CostFunction::Mae                => MaeLoss::loss(predicted, expected),
            CostFunction::Huber              => HuberLoss::loss(predicted, expected),
        }
    }

    /// ∂C/∂a for the output activation `predicted`.
    pub fn gradient(&self, predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        match self {
            CostFunction::Mse                => MseLoss::derivative(predicted, expected),
            CostFunction::CrossEntropy       => CrossEntropyLoss::derivative(predicted, expected),
            CostFunction::BinaryCrossEntropy => BceLoss::derivative(predicted, expected),
            CostFunction::Mae                => MaeLoss::derivative(predicted, expected),
            CostFunction::Huber              => HuberLoss::derivative(predicted, expected),
        }
    }
}
