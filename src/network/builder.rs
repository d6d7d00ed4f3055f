use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::{
    activation::rectifier::Rectifier,
    error::{Error, Result},
    init::initializer::Initializer,
    layers::dense::Layer,
    loss::{CostFunction, Regularizer},
    network::config::NetworkConfig,
    network::network::Network,
    optim::decay::{Optimizer, Rate},
    train::batch::BatchMode,
    train::log::TrainingLog,
};

/// Builder for a [`Network`].
///
/// Setters never fail; every range is checked once in [`NetworkBuilder::build`].
///
/// ```rust
/// use ferrite_evo::{NetworkBuilder, Rectifier};
///
/// # fn main() -> ferrite_evo::Result<()> {
/// let mut network = NetworkBuilder::new(&[2, 3, 1])
///     .rectifier(Rectifier::Tanh)
///     .last_rectifier(Rectifier::Sigmoid)
///     .learning_rate(0.5)
///     .seed(7)
///     .build()?;
/// let output = network.predict(&[1.0, 0.0])?;
/// assert_eq!(output.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct NetworkBuilder {
    configuration: Vec<usize>,
    config: NetworkConfig,
    seed: Option<u64>,
}

impl NetworkBuilder {
    /// `configuration` lists the unit count of every layer, input first.
    pub fn new(configuration: &[usize]) -> NetworkBuilder {
        NetworkBuilder {
            configuration: configuration.to_vec(),
            config: NetworkConfig::default(),
            seed: None,
        }
    }

    /// Replaces every hyperparameter at once.
    pub fn config(mut self, config: NetworkConfig) -> Self {
        self.config = config;
        self
    }

    pub fn initializer(mut self, initializer: Initializer) -> Self {
        self.config.initializer = initializer;
        self
    }

    pub fn rectifier(mut self, rectifier: Rectifier) -> Self {
        self.config.rectifier = rectifier;
        self
    }

    pub fn layer_rectifier(mut self, layer: usize, rectifier: Rectifier) -> Self {
        self.config.layer_rectifiers.insert(layer, rectifier);
        self
    }

    pub fn last_rectifier(mut self, rectifier: Rectifier) -> Self {
        self.config.last_rectifier = Some(rectifier);
        self
    }

    pub fn cost_function(mut self, cost_function: CostFunction) -> Self {
        self.config.cost_function = cost_function;
        self
    }

    pub fn regularizer(mut self, regularizer: Regularizer, lambda: f64) -> Self {
        self.config.regularizer = regularizer;
        self.config.regularizer_param = lambda;
        self
    }

    pub fn dropout_factor(mut self, factor: f64) -> Self {
        self.config.dropout_factor = factor;
        self
    }

    pub fn batch_mode(mut self, mode: BatchMode) -> Self {
        self.config.batch_mode = mode;
        self
    }

    pub fn learning_rate(mut self, rate: f64) -> Self {
        self.config.learning_rate = rate;
        self
    }

    pub fn learning_rate_decay(mut self, optimizer: Optimizer, momentum: f64) -> Self {
        self.config.learning_rate_optimizer = optimizer;
        self.config.learning_rate_momentum = momentum;
        self
    }

    pub fn mutation_rate(mut self, rate: f64) -> Self {
        self.config.mutation_rate = rate;
        self
    }

    pub fn mutation_rate_decay(mut self, optimizer: Optimizer, momentum: f64) -> Self {
        self.config.mutation_rate_optimizer = optimizer;
        self.config.mutation_rate_momentum = momentum;
        self
    }

    pub fn log_capacity(mut self, capacity: usize) -> Self {
        self.config.log_capacity = capacity;
        self
    }

    /// Seeds the network's RNG (initialization, dropout, mutation, sampling).
    /// Without a seed the RNG is seeded from system entropy.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates everything and returns an initialized network.
    pub fn build(self) -> Result<Network> {
        if self.configuration.len() < 2 {
            return Err(Error::InvalidArgument(format!(
                "configuration needs at least an input and an output layer, got {:?}",
                self.configuration
            )));
        }
        if self.configuration.contains(&0) {
            return Err(Error::InvalidArgument(format!(
                "every layer needs at least one unit, got {:?}",
                self.configuration
            )));
        }

        let depth = self.configuration.len() - 1;
        let config = self.config;
        config.validate(depth)?;

        let layers = self.configuration
            .windows(2)
            .enumerate()
            .map(|(i, pair)| Layer::new(pair[1], pair[0], config.rectifier_for(i, depth)))
            .collect();

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut network = Network {
            configuration: self.configuration,
            layers,
            initializer: config.initializer,
            cost_function: config.cost_function,
            regularizer: config.regularizer,
            regularizer_param: config.regularizer_param,
            dropout_factor: config.dropout_factor,
            batch_mode: config.batch_mode,
            learning_rate: Rate::new(
                config.learning_rate,
                config.learning_rate_momentum,
                config.learning_rate_optimizer,
            ),
            mutation_rate: Rate::new(
                config.mutation_rate,
                config.mutation_rate_momentum,
                config.mutation_rate_optimizer,
            ),
            iteration_count: 0,
            log_capacity: config.log_capacity,
            node_values: Vec::new(),
            log: TrainingLog::new(config.log_capacity),
            rng,
            events: None,
        };
        network.initialize_layers();

        debug!(configuration = ?network.configuration, "built network");
        Ok(network)
    }
}
