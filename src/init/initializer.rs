use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

/// Weight and bias seeding strategy.
///
/// `fan_out` is `0` for the output layer; every variant tolerates that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Initializer {
    Zero,
    /// Uniform on (-1, 1) for weights and biases alike.
    Random,
    /// Glorot uniform: U(-√(6 / (fan_in + fan_out)), +√(...)); zero biases.
    Xavier,
    /// He normal: N(0, √(2 / fan_in)); zero biases. Recommended before ReLU.
    He,
    /// LeCun normal: N(0, √(1 / fan_in)); zero biases.
    LeCun,
}

impl Default for Initializer {
    fn default() -> Self {
        Initializer::Xavier
    }
}

impl Initializer {
    pub fn initialize<R: Rng + ?Sized>(
        &self,
        fan_in: usize,
        fan_out: usize,
        is_bias: bool,
        rng: &mut R,
    ) -> f64 {
        match self {
            Initializer::Zero => 0.0,
            Initializer::Random => uniform(rng),
            _ if is_bias => 0.0,
            Initializer::Xavier => {
                let limit = (6.0 / (fan_in + fan_out).max(1) as f64).sqrt();
                uniform(rng) * limit
            }
            Initializer::He => sample_standard_normal(rng) * (2.0 / fan_in.max(1) as f64).sqrt(),
            Initializer::LeCun => sample_standard_normal(rng) * (1.0 / fan_in.max(1) as f64).sqrt(),
        }
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen::<f64>() * 2.0 - 1.0
}

/// Samples a single value from N(0, 1) using the Box-Muller transform.
fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // Draw two independent uniform samples in (0, 1] to avoid log(0).
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = 1.0 - rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}
