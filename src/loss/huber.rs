use crate::error::Result;
use crate::math::matrix::Matrix;

pub struct HuberLoss;

// Transition point between the quadratic and linear regions.
const DELTA: f64 = 1.0;

impl HuberLoss {
    /// Scalar Huber: mean(h(predicted − expected))
    /// where h(x) = 0.5·x²  if |x| ≤ δ
    ///              δ·(|x| − 0.5·δ)  otherwise
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> Result<f64> {
        let n = (predicted.rows * predicted.cols) as f64;
        let terms = predicted.apply_with(expected, |p, y| {
            let x = p - y;
            if x.abs() <= DELTA {
                0.5 * x * x
            } else {
                DELTA * (x.abs() - 0.5 * DELTA)
            }
        })?;
        Ok(terms.sum() / n)
    }

    /// Per-output gradient: x  if |x| ≤ δ,  else δ·sign(x)
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        predicted.apply_with(expected, |p, y| {
            let x = p - y;
            if x.abs() <= DELTA { x } else { DELTA * x.signum() }
        })
    }
}
