use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Serialize, Deserialize};
use std::sync::mpsc::Sender;
use tracing::{debug, trace, warn};

use crate::{
    activation::rectifier::Rectifier,
    error::{Error, Result},
    init::initializer::Initializer,
    layers::dense::Layer,
    loss::{CostFunction, Regularizer},
    math::matrix::Matrix,
    network::config::unit_interval,
    network::event::NetworkEvent,
    optim::decay::Rate,
    train::batch::{Batch, BatchMode},
    train::log::TrainingLog,
};

/// Feedforward network: an ordered list of dense layers plus every
/// hyperparameter needed to train it.
///
/// Built through [`NetworkBuilder`](crate::NetworkBuilder). Layer `i` maps
/// `configuration[i]` units onto `configuration[i + 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub(crate) configuration: Vec<usize>,
    pub(crate) layers: Vec<Layer>,
    pub(crate) initializer: Initializer,
    pub(crate) cost_function: CostFunction,
    pub(crate) regularizer: Regularizer,
    pub(crate) regularizer_param: f64,
    pub(crate) dropout_factor: f64,
    pub(crate) batch_mode: BatchMode,
    pub(crate) learning_rate: Rate,
    pub(crate) mutation_rate: Rate,
    pub(crate) iteration_count: u64,
    pub(crate) log_capacity: usize,
    #[serde(skip)]
    pub(crate) node_values: Vec<Vec<f64>>,
    #[serde(skip)]
    pub(crate) log: TrainingLog,
    #[serde(skip, default = "entropy_rng")]
    pub(crate) rng: StdRng,
    #[serde(skip)]
    pub(crate) events: Option<Sender<NetworkEvent>>,
}

fn entropy_rng() -> StdRng {
    StdRng::from_entropy()
}

/// Result of one single-example step before it is folded into a batch.
pub(crate) struct Step {
    pub output: Vec<f64>,
    pub cost: f64,
}

impl Network {
    /// Forward pass. Caches the node values of every layer (input first) and
    /// emits [`NetworkEvent::Predicted`].
    ///
    /// With a dropout factor configured, the output is divided by it.
    pub fn predict(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        self.check_input(input)?;

        let outputs = self.forward(input, None)?;
        let mut output = outputs[outputs.len() - 1].clone();
        if self.dropout_factor > 0.0 {
            output = output.divide_scalar(self.dropout_factor)?;
        }

        self.node_values = outputs.iter().map(Matrix::to_vec).collect();
        self.notify(NetworkEvent::Predicted);
        Ok(output.to_vec())
    }

    /// Trains on a single example and applies the update immediately.
    pub fn fit(&mut self, input: &[f64], target: &[f64]) -> Result<Vec<f64>> {
        let mut batch = self.new_batch();
        let output = self.fit_into(input, target, &mut batch)?;
        self.apply_batch(batch)?;
        Ok(output)
    }

    /// Runs one training step and accumulates its deltas into `batch`
    /// without touching the weights. Apply them with [`Network::apply_batch`].
    pub fn fit_into(&mut self, input: &[f64], target: &[f64], batch: &mut Batch) -> Result<Vec<f64>> {
        Ok(self.step(input, target, batch)?.output)
    }

    pub(crate) fn step(&mut self, input: &[f64], target: &[f64], batch: &mut Batch) -> Result<Step> {
        self.check_input(input)?;
        self.check_target(target)?;

        let last = self.layers.len() - 1;
        let dropped = if self.dropout_factor > 0.0 {
            Some(self.layers[last].weight.dropout(self.dropout_factor, &mut self.rng))
        } else {
            None
        };

        let mut outputs = self.forward(input, dropped.as_ref())?;
        if dropped.is_some() {
            outputs[last + 1] = outputs[last + 1].scale(self.dropout_factor)?;
        }

        let output = &outputs[last + 1];
        let expected = Matrix::column(target);
        let cost = (self.cost_function.cost(output, &expected)?
            + self.regularizer.cost(output, self.regularizer_param)?)
            .clamp(f64::MIN, f64::MAX);

        let mut loss = self.cost_function
            .gradient(output, &expected)?
            .add(&self.regularizer.gradient(output, self.regularizer_param)?)?;

        // Deltas in slot order: slot 0 is the output layer.
        let learning_rate = self.learning_rate.current;
        let mut deltas = Vec::with_capacity(self.layers.len());
        for (i, layer) in self.layers.iter().enumerate().rev() {
            let gradient = outputs[i + 1].derive(layer.rectifier)?.multiply(&loss)?;
            // Chain rule through the pre-update weights.
            loss = layer.weight.transpose().matmul(&gradient)?;

            let bias_delta = gradient.scale(learning_rate)?;
            let weight_delta = bias_delta.matmul(&outputs[i].transpose())?;
            deltas.push((weight_delta, bias_delta));
        }

        for (slot, (weight_delta, bias_delta)) in deltas.into_iter().enumerate() {
            batch.add_weight(weight_delta, slot)?;
            batch.add_bias(bias_delta, slot)?;
        }
        batch.record_sample();

        let output = outputs[last + 1].to_vec();
        let stats = self.log.append(self.iteration_count, cost, &output, target);
        trace!(iteration = self.iteration_count, cost, "training step");

        self.node_values = outputs.iter().map(Matrix::to_vec).collect();
        self.notify(NetworkEvent::Fitted(stats));
        self.decrease_rate();

        Ok(Step { output, cost })
    }

    /// Subtracts the reduced deltas of `batch` from every layer and consumes it.
    /// An empty batch is a no-op.
    pub fn apply_batch(&mut self, batch: Batch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        if batch.slots() != self.layers.len() {
            return Err(Error::ShapeMismatch(format!(
                "batch holds {} slots, network has {} layers",
                batch.slots(),
                self.layers.len()
            )));
        }

        let last = self.layers.len() - 1;
        let mut updates = Vec::with_capacity(self.layers.len());
        for slot in 0..self.layers.len() {
            let (weight, bias) = (batch.weight(slot)?, batch.bias(slot)?);
            let layer = &self.layers[last - slot];
            if !layer.weight.same_shape(&weight) || !layer.bias.same_shape(&bias) {
                return Err(Error::ShapeMismatch(format!(
                    "batch slot {slot} does not fit layer {}",
                    last - slot
                )));
            }
            updates.push((weight, bias));
        }

        for (slot, (weight, bias)) in updates.iter().enumerate() {
            self.layers[last - slot].apply_delta(weight, bias)?;
        }
        debug!(samples = batch.samples(), mode = ?batch.mode(), "applied batch");
        Ok(())
    }

    /// Fresh accumulator using this network's batch mode.
    pub fn new_batch(&self) -> Batch {
        Batch::new(self.batch_mode)
    }

    /// Activated output of every layer, starting with the input column.
    /// `last_weight` substitutes the output layer's weights for this pass.
    fn forward(&self, input: &[f64], last_weight: Option<&Matrix>) -> Result<Vec<Matrix>> {
        let last = self.layers.len() - 1;
        let mut outputs = Vec::with_capacity(self.configuration.len());
        outputs.push(Matrix::column(input));

        for (i, layer) in self.layers.iter().enumerate() {
            let a = &outputs[i];
            let next = match last_weight {
                Some(weight) if i == last => layer.feed_with(weight, a)?,
                _ => layer.feed(a)?,
            };
            outputs.push(next);
        }

        Ok(outputs)
    }

    pub(crate) fn check_input(&self, input: &[f64]) -> Result<()> {
        if input.len() != self.configuration[0] {
            return Err(Error::ShapeMismatch(format!(
                "input has {} values, network expects {}",
                input.len(),
                self.configuration[0]
            )));
        }
        Ok(())
    }

    pub(crate) fn check_target(&self, target: &[f64]) -> Result<()> {
        let outputs = self.configuration[self.configuration.len() - 1];
        if target.len() != outputs {
            return Err(Error::ShapeMismatch(format!(
                "target has {} values, network produces {outputs}",
                target.len()
            )));
        }
        Ok(())
    }

    /// Re-checks everything the builder guarantees: architecture, layer and
    /// matrix shapes, rectifier parameters and every rate range.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.configuration.len() < 2 || self.configuration.contains(&0) {
            return Err(Error::InvalidArgument(format!(
                "configuration {:?} needs at least two non-empty layers",
                self.configuration
            )));
        }
        if self.layers.len() != self.configuration.len() - 1 {
            return Err(Error::ShapeMismatch(format!(
                "{} layers for configuration {:?}",
                self.layers.len(),
                self.configuration
            )));
        }
        for (i, layer) in self.layers.iter().enumerate() {
            layer.weight.check_layout()?;
            layer.bias.check_layout()?;
            let (inputs, units) = (self.configuration[i], self.configuration[i + 1]);
            if layer.weight.rows != units || layer.weight.cols != inputs
                || layer.bias.rows != units || layer.bias.cols != 1
            {
                return Err(Error::ShapeMismatch(format!(
                    "layer {i} is {}x{} with a {}x{} bias, expected {units}x{inputs}",
                    layer.weight.rows, layer.weight.cols, layer.bias.rows, layer.bias.cols
                )));
            }
            layer.rectifier.validate()?;
        }

        for (name, value) in [
            ("regularizer_param", self.regularizer_param),
            ("dropout_factor", self.dropout_factor),
            ("learning_rate", self.learning_rate.initial),
            ("learning_rate.current", self.learning_rate.current),
            ("learning_rate_momentum", self.learning_rate.momentum),
            ("mutation_rate", self.mutation_rate.initial),
            ("mutation_rate.current", self.mutation_rate.current),
            ("mutation_rate_momentum", self.mutation_rate.momentum),
        ] {
            unit_interval(name, value)?;
        }
        Ok(())
    }

    fn notify(&mut self, event: NetworkEvent) {
        let detached = match &self.events {
            Some(tx) => tx.send(event).is_err(),
            None => false,
        };
        if detached {
            warn!("network event receiver dropped; detaching sender");
            self.events = None;
        }
    }

    // -----------------------------------------------------------------------
    // Rate bookkeeping
    // -----------------------------------------------------------------------

    /// Advances the iteration counter and both decay schedules.
    pub fn decrease_rate(&mut self) {
        self.iteration_count += 1;
        self.learning_rate.advance();
        self.mutation_rate.advance();
    }

    pub fn reset_learning_rate(&mut self) {
        self.learning_rate.reset();
    }

    pub fn reset_mutation_rate(&mut self) {
        self.mutation_rate.reset();
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    pub fn configuration(&self) -> &[usize] {
        &self.configuration
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn rectifiers(&self) -> Vec<Rectifier> {
        self.layers.iter().map(|l| l.rectifier).collect()
    }

    /// Node values of the most recent forward pass, input first; empty
    /// before the first pass.
    pub fn node_values(&self) -> &[Vec<f64>] {
        &self.node_values
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate.current
    }

    pub fn mutation_rate(&self) -> f64 {
        self.mutation_rate.current
    }

    pub fn learning_rate_schedule(&self) -> &Rate {
        &self.learning_rate
    }

    pub fn mutation_rate_schedule(&self) -> &Rate {
        &self.mutation_rate
    }

    pub fn iteration_count(&self) -> u64 {
        self.iteration_count
    }

    pub fn initializer(&self) -> Initializer {
        self.initializer
    }

    pub fn cost_function(&self) -> CostFunction {
        self.cost_function
    }

    pub fn regularizer(&self) -> (Regularizer, f64) {
        (self.regularizer, self.regularizer_param)
    }

    pub fn dropout_factor(&self) -> f64 {
        self.dropout_factor
    }

    pub fn batch_mode(&self) -> BatchMode {
        self.batch_mode
    }

    pub fn log(&self) -> &TrainingLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut TrainingLog {
        &mut self.log
    }

    /// Routes [`NetworkEvent`]s to `sender`; `None` stops them.
    pub fn set_event_sender(&mut self, sender: Option<Sender<NetworkEvent>>) {
        self.events = sender;
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Serializes the network to a pretty-printed JSON file.
    ///
    /// The node-value cache, training log, RNG and event sender are not saved.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    ///
    /// A snapshot that parses but breaks a network invariant (wrong layer
    /// shapes, rates outside [0, 1]) fails with `ErrorKind::InvalidData`.
    pub fn load_json(path: &str) -> std::io::Result<Network> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let mut network: Network = serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        network.validate()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        network.log = TrainingLog::new(network.log_capacity);
        Ok(network)
    }
}
