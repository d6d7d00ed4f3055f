use serde::{Serialize, Deserialize};

/// Decay schedule mapping `(initial, momentum, step)` to the current rate.
///
/// Every variant is non-increasing in `step` for `momentum >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Optimizer {
    #[default]
    Constant,
    /// Time-based decay: `initial / (1 + momentum·t)`.
    Sgd,
    /// `initial · e^(−momentum·t)`
    Exponential,
    /// `initial / √(1 + momentum·t)`
    InverseSqrt,
}

impl Optimizer {
    pub fn rate(&self, initial: f64, momentum: f64, step: u64) -> f64 {
        let t = step as f64;
        match self {
            Optimizer::Constant => initial,
            Optimizer::Sgd => initial / (1.0 + momentum * t),
            Optimizer::Exponential => initial * (-momentum * t).exp(),
            Optimizer::InverseSqrt => initial / (1.0 + momentum * t).sqrt(),
        }
    }
}

/// A decaying rate: learning rate or mutation rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub initial: f64,
    pub current: f64,
    pub momentum: f64,
    pub optimizer: Optimizer,
    step: u64,
}

impl Rate {
    pub fn new(initial: f64, momentum: f64, optimizer: Optimizer) -> Rate {
        Rate {
            initial,
            current: initial,
            momentum,
            optimizer,
            step: 0,
        }
    }

    /// Number of decay steps taken since construction or the last reset.
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn advance(&mut self) {
        self.step += 1;
        self.current = self.optimizer.rate(self.initial, self.momentum, self.step);
    }

    pub fn reset(&mut self) {
        self.step = 0;
        self.current = self.initial;
    }
}
