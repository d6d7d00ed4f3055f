use serde::{Serialize, Deserialize};
use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// How accumulated deltas are reduced when a batch is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    /// Divide the summed deltas by the number of recorded samples.
    #[default]
    Mean,
    Sum,
}

/// Per-layer weight and bias deltas gathered across training steps.
///
/// Slots count from the output layer: slot `0` is the last layer, slot `1`
/// the one before it, and so on. A batch is filled by
/// [`Network::fit_into`](crate::Network::fit_into) and consumed by
/// [`Network::apply_batch`](crate::Network::apply_batch).
#[derive(Debug, Clone)]
pub struct Batch {
    mode: BatchMode,
    weights: Vec<Matrix>,
    biases: Vec<Matrix>,
    samples: usize,
}

impl Batch {
    pub fn new(mode: BatchMode) -> Batch {
        Batch {
            mode,
            weights: Vec::new(),
            biases: Vec::new(),
            samples: 0,
        }
    }

    pub fn mode(&self) -> BatchMode {
        self.mode
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    /// Number of slots holding a weight delta.
    pub fn slots(&self) -> usize {
        self.weights.len()
    }

    pub fn record_sample(&mut self) {
        self.samples += 1;
    }

    pub fn add_weight(&mut self, delta: Matrix, slot: usize) -> Result<()> {
        accumulate(&mut self.weights, delta, slot)
    }

    pub fn add_bias(&mut self, delta: Matrix, slot: usize) -> Result<()> {
        accumulate(&mut self.biases, delta, slot)
    }

    /// Reduced copy of the weight delta at `slot`.
    pub fn weight(&self, slot: usize) -> Result<Matrix> {
        self.reduce(self.weights.get(slot), slot)
    }

    /// Reduced copy of the bias delta at `slot`.
    pub fn bias(&self, slot: usize) -> Result<Matrix> {
        self.reduce(self.biases.get(slot), slot)
    }

    fn reduce(&self, delta: Option<&Matrix>, slot: usize) -> Result<Matrix> {
        let delta = delta.ok_or_else(|| {
            Error::InvalidArgument(format!("batch has no delta at slot {slot}"))
        })?;
        match self.mode {
            BatchMode::Mean => delta.divide_scalar(self.samples.max(1) as f64),
            BatchMode::Sum => Ok(delta.clone()),
        }
    }
}

fn accumulate(acc: &mut Vec<Matrix>, delta: Matrix, slot: usize) -> Result<()> {
    match slot.cmp(&acc.len()) {
        Ordering::Less => acc[slot].add_assign_checked(&delta),
        Ordering::Equal => {
            acc.push(delta);
            Ok(())
        }
        Ordering::Greater => Err(Error::InvalidArgument(format!(
            "batch slot {slot} skips past {} filled slots",
            acc.len()
        ))),
    }
}
