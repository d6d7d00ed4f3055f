use crate::error::Result;
use crate::math::matrix::Matrix;

pub struct MaeLoss;

impl MaeLoss {
    /// Scalar MAE: mean(|predicted - expected|)
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> Result<f64> {
        let n = (predicted.rows * predicted.cols) as f64;
        Ok(predicted.apply_with(expected, |p, y| (p - y).abs())?.sum() / n)
    }

    /// Per-output subgradient: sign(p - y) / n  (0 when equal)
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        let n = (predicted.rows * predicted.cols) as f64;
        predicted.apply_with(expected, |p, y| {
            let diff = p - y;
            if diff > 0.0 { 1.0 / n } else if diff < 0.0 { -1.0 / n } else { 0.0 }
        })
    }
}
