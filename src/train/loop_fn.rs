use rand::Rng;
use std::time::Instant;
use tracing::info;

use crate::error::{Error, Result};
use crate::network::network::Network;

impl Network {
    /// Stochastic mini-batch training over a dataset and returns the mean
    /// cost over all steps.
    ///
    /// Each of the `epochs` steps samples one example uniformly at random,
    /// with replacement. The accumulated batch is applied every `batch_size`
    /// steps; a final partial batch of `epochs % batch_size` steps is applied
    /// at the end.
    ///
    /// # Errors
    /// Empty or unequal-length example arrays and `batch_size == 0` are
    /// `InvalidArgument`; any example of the wrong width is `ShapeMismatch`.
    /// All of these are checked before the first step.
    pub fn fit_all(
        &mut self,
        inputs: &[Vec<f64>],
        targets: &[Vec<f64>],
        epochs: usize,
        batch_size: usize,
    ) -> Result<f64> {
        if inputs.is_empty() {
            return Err(Error::InvalidArgument("inputs must not be empty".to_owned()));
        }
        if inputs.len() != targets.len() {
            return Err(Error::InvalidArgument(format!(
                "{} inputs but {} targets",
                inputs.len(),
                targets.len()
            )));
        }
        if batch_size == 0 {
            return Err(Error::InvalidArgument("batch_size must be at least 1".to_owned()));
        }
        for (input, target) in inputs.iter().zip(targets) {
            self.check_input(input)?;
            self.check_target(target)?;
        }

        info!(epochs, batch_size, examples = inputs.len(), "training started");
        let t_start = Instant::now();

        let mut batch = self.new_batch();
        let mut total_cost = 0.0;
        for epoch in 1..=epochs {
            let idx = self.rng.gen_range(0..inputs.len());
            total_cost += self.step(&inputs[idx], &targets[idx], &mut batch)?.cost;

            if epoch % batch_size == 0 {
                let full = std::mem::replace(&mut batch, self.new_batch());
                self.apply_batch(full)?;
            }
        }
        // Remainder of `epochs % batch_size` steps.
        self.apply_batch(batch)?;

        let mean_cost = if epochs == 0 { 0.0 } else { total_cost / epochs as f64 };
        info!(
            mean_cost,
            iterations = self.iteration_count,
            elapsed_ms = t_start.elapsed().as_millis() as u64,
            "training finished"
        );
        Ok(mean_cost)
    }
}
