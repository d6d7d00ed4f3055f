use crate::error::Result;
use crate::math::matrix::Matrix;

pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE: mean((predicted - expected)²)
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> Result<f64> {
        let n = (predicted.rows * predicted.cols) as f64;
        Ok(predicted.apply_with(expected, |a, b| (a - b).powi(2))?.sum() / n)
    }

    /// Per-output gradient: predicted - expected
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        predicted.subtract(expected)
    }
}
