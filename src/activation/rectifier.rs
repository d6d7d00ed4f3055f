use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Activation strategy applied to every cell of a layer's pre-activation.
///
/// Derivatives are expressed in terms of the *activated* value `y`, because
/// the backward pass only keeps each layer's activated output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rectifier {
    Identity,
    Sigmoid,
    Tanh,
    #[serde(rename = "relu")]
    ReLU,
    #[serde(rename = "leaky_relu")]
    LeakyReLU { alpha: f64 },
    Elu { alpha: f64 },
    Softplus,
    /// Needs the log-sum-exp of the whole matrix, see [`Rectifier::normalization`].
    /// Its derivative is the diagonal of the Jacobian, `y·(1 - y)`.
    Softmax,
}

impl Default for Rectifier {
    fn default() -> Self {
        Rectifier::Sigmoid
    }
}

impl Rectifier {
    pub fn validate(&self) -> Result<()> {
        match *self {
            Rectifier::LeakyReLU { alpha } | Rectifier::Elu { alpha } => {
                if !(alpha.is_finite() && alpha >= 0.0) {
                    return Err(Error::InvalidArgument(format!(
                        "rectifier alpha must be finite and >= 0, got {alpha}"
                    )));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Whole-matrix term that has to be computed once before activating any
    /// cell. `None` for element-wise rectifiers.
    pub fn normalization(&self, values: &Matrix) -> Option<f64> {
        match self {
            Rectifier::Softmax => {
                let max = values.data.iter()
                    .flatten()
                    .fold(f64::NEG_INFINITY, |acc, &x| acc.max(x));
                let sum: f64 = values.data.iter()
                    .flatten()
                    .map(|x| (x - max).exp())
                    .sum();
                Some(max + sum.ln())
            }
            _ => None,
        }
    }

    pub fn activate(&self, x: f64, normalization: Option<f64>) -> f64 {
        match *self {
            Rectifier::Identity => x,
            Rectifier::Sigmoid => sigmoid(x),
            Rectifier::Tanh => x.tanh(),
            Rectifier::ReLU => if x > 0.0 { x } else { 0.0 },
            Rectifier::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
            Rectifier::Elu { alpha } => if x > 0.0 { x } else { alpha * (x.exp() - 1.0) },
            // ln(1 + e^x) without overflowing for large x.
            Rectifier::Softplus => x.max(0.0) + (-x.abs()).exp().ln_1p(),
            Rectifier::Softmax => (x - normalization.unwrap_or(0.0)).exp(),
        }
    }

    /// Derivative at the point whose activated value is `y`.
    pub fn derive(&self, y: f64) -> f64 {
        match *self {
            Rectifier::Identity => 1.0,
            Rectifier::Sigmoid | Rectifier::Softmax => y * (1.0 - y),
            Rectifier::Tanh => 1.0 - y * y,
            Rectifier::ReLU => if y > 0.0 { 1.0 } else { 0.0 },
            Rectifier::LeakyReLU { alpha } => if y > 0.0 { 1.0 } else { alpha },
            Rectifier::Elu { alpha } => if y > 0.0 { 1.0 } else { y + alpha },
            Rectifier::Softplus => 1.0 - (-y).exp(),
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}
