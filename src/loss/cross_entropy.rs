use crate::error::Result;
use crate::math::matrix::Matrix;

/// Categorical cross-entropy loss, usually paired with a Softmax output layer.
pub struct CrossEntropyLoss;

/// Small epsilon added inside log() to prevent log(0) = -inf.
const EPS: f64 = 1e-12;

impl CrossEntropyLoss {
    /// Computes the scalar cross-entropy loss:
    ///   L = -sum(expected[i] * log(predicted[i] + eps))
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> Result<f64> {
        Ok(predicted.apply_with(expected, |p, e| -e * (p + EPS).ln())?.sum())
    }

    /// Gradient with respect to the predicted probabilities:
    ///   ∂L/∂p_i = -expected[i] / (predicted[i] + eps)
    ///
    /// The output rectifier's derivative is applied on top of this by the
    /// backward pass, so this is *not* the fused softmax + CE shortcut.
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Result<Matrix> {
        predicted.apply_with(expected, |p, e| -e / (p + EPS))
    }
}
