use crate::error::Result;
use crate::math::matrix::Matrix;

pub struct BceLoss;

const EPS: f64 = 1e-12;

impl BceLoss {
    /// Scalar BCE: -mean(y·log(p+ε) + (1-y)·log(1-p+ε))
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> Result<f64> {
        let n = (predicted.rows * predicted.cols) as f64;
        let terms = predicted.apply_with(expected, |p, y| {
            -(y * (p + EPS).ln() + (1.0 - y) * (1.0 - p + EPS).ln())
        })?;
        Ok(terms.sum() / n)
    }

    /// Per-output gradient: (p - y) / ((p + ε) · (1 - p + ε))
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        predicted.apply_with(expected, |p, y| (p - y) / ((p + EPS) * (1.0 - p + EPS)))
    }
}
