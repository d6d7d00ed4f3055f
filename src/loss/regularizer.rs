use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Penalty added to the cost, with its gradient, scaled by λ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regularizer {
    #[default]
    None,
    /// λ·Σ|x|
    L1,
    /// λ/2·Σx²
    L2,
    /// Even mix of `L1` and `L2`.
    ElasticNet,
}

impl Regularizer {
    /// Penalty for `values`. A total that overflows saturates to `f64::MAX`.
    pub fn cost(&self, values: &Matrix, lambda: f64) -> Result<f64> {
        let total = match self {
            Regularizer::None => return Ok(0.0),
            Regularizer::L1 => lambda * values.apply(f64::abs).sum(),
            Regularizer::L2 => 0.5 * lambda * values.multiply(values)?.sum(),
            Regularizer::ElasticNet => {
                0.5 * (Regularizer::L1.cost(values, lambda)? + Regularizer::L2.cost(values, lambda)?)
            }
        };
        if total.is_nan() {
            return Err(Error::NumericFault(format!("{self:?} penalty is NaN")));
        }
        Ok(total.clamp(f64::MIN, f64::MAX))
    }

    pub fn gradient(&self, values: &Matrix, lambda: f64) -> Result<Matrix> {
        match self {
            Regularizer::None => Ok(Matrix::zeros(values.rows, values.cols)),
            Regularizer::L1 => values.apply(sign).scale(lambda),
            Regularizer::L2 => values.scale(lambda),
            Regularizer::ElasticNet => values.apply(sign).add(values)?.scale(0.5 * lambda),
        }
    }
}

fn sign(x: f64) -> f64 {
    if x > 0.0 { 1.0 } else if x < 0.0 { -1.0 } else { 0.0 }
}
