use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;

use crate::activation::rectifier::Rectifier;
use crate::error::{Error, Result};
use crate::init::initializer::Initializer;
use crate::loss::{CostFunction, Regularizer};
use crate::optim::decay::Optimizer;
use crate::train::batch::BatchMode;

/// Every hyperparameter a [`Network`](crate::Network) is built with.
///
/// Missing fields fall back to [`NetworkConfig::default`] when deserializing,
/// so a JSON file only needs the options it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub initializer: Initializer,
    /// Rectifier for every layer without an override.
    pub rectifier: Rectifier,
    /// Per-layer overrides keyed by layer index (0 = first weight layer).
    pub layer_rectifiers: BTreeMap<usize, Rectifier>,
    /// Override for the output layer; a `layer_rectifiers` entry wins over it.
    pub last_rectifier: Option<Rectifier>,
    pub cost_function: CostFunction,
    pub regularizer: Regularizer,
    /// λ, in [0, 1].
    pub regularizer_param: f64,
    /// Probability of zeroing an output-layer weight during training, in [0, 1].
    /// `0` disables dropout.
    pub dropout_factor: f64,
    pub batch_mode: BatchMode,
    pub learning_rate: f64,
    pub learning_rate_optimizer: Optimizer,
    pub learning_rate_momentum: f64,
    pub mutation_rate: f64,
    pub mutation_rate_optimizer: Optimizer,
    pub mutation_rate_momentum: f64,
    /// Number of steps the training log retains.
    pub log_capacity: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            initializer: Initializer::Xavier,
            rectifier: Rectifier::Sigmoid,
            layer_rectifiers: BTreeMap::new(),
            last_rectifier: None,
            cost_function: CostFunction::Mse,
            regularizer: Regularizer::None,
            regularizer_param: 0.0,
            dropout_factor: 0.0,
            batch_mode: BatchMode::Mean,
            learning_rate: 0.1,
            learning_rate_optimizer: Optimizer::Constant,
            learning_rate_momentum: 0.0,
            mutation_rate: 0.1,
            mutation_rate_optimizer: Optimizer::Constant,
            mutation_rate_momentum: 0.0,
            log_capacity: 1000,
        }
    }
}

impl NetworkConfig {
    /// Checks every range for a network with `layers` weight layers.
    pub fn validate(&self, layers: usize) -> Result<()> {
        unit_interval("regularizer_param", self.regularizer_param)?;
        unit_interval("dropout_factor", self.dropout_factor)?;
        unit_interval("learning_rate", self.learning_rate)?;
        unit_interval("learning_rate_momentum", self.learning_rate_momentum)?;
        unit_interval("mutation_rate", self.mutation_rate)?;
        unit_interval("mutation_rate_momentum", self.mutation_rate_momentum)?;

        self.rectifier.validate()?;
        if let Some(last) = &self.last_rectifier {
            last.validate()?;
        }
        for (&index, rectifier) in &self.layer_rectifiers {
            if index >= layers {
                return Err(Error::InvalidArgument(format!(
                    "rectifier override for layer {index}, but the network has {layers} layers"
                )));
            }
            rectifier.validate()?;
        }
        Ok(())
    }

    /// Rectifier for layer `index` out of `layers`.
    pub fn rectifier_for(&self, index: usize, layers: usize) -> Rectifier {
        if let Some(&rectifier) = self.layer_rectifiers.get(&index) {
            return rectifier;
        }
        match self.last_rectifier {
            Some(last) if index + 1 == layers => last,
            _ => self.rectifier,
        }
    }

    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }

    /// Deserializes a `NetworkConfig` from a JSON file.
    pub fn load_json(path: &str) -> std::io::Result<NetworkConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
    }
}

pub(crate) fn unit_interval(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::InvalidArgument(format!(
            "{name} must be within [0, 1], got {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(NetworkConfig::default().validate(2).is_ok());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let cases: [fn(&mut NetworkConfig); 7] = [
            |c| c.learning_rate = 1.5,
            |c| c.learning_rate_momentum = -0.1,
            |c| c.mutation_rate = f64::NAN,
            |c| c.mutation_rate_momentum = 2.0,
            |c| c.dropout_factor = 1.01,
            |c| c.regularizer_param = -1.0,
            |c| c.rectifier = Rectifier::LeakyReLU { alpha: -1.0 },
        ];
        for set in cases {
            let mut config = NetworkConfig::default();
            set(&mut config);
            assert!(matches!(config.validate(2), Err(Error::InvalidArgument(_))));
        }
    }

    #[test]
    fn override_index_must_exist() {
        let mut config = NetworkConfig::default();
        config.layer_rectifiers.insert(2, Rectifier::ReLU);
        assert!(config.validate(2).is_err());
        assert!(config.validate(3).is_ok());
    }

    #[test]
    fn rectifier_precedence() {
        let mut config = NetworkConfig {
            rectifier: Rectifier::Tanh,
            last_rectifier: Some(Rectifier::Softmax),
            ..NetworkConfig::default()
        };
        assert_eq!(config.rectifier_for(0, 3), Rectifier::Tanh);
        assert_eq!(config.rectifier_for(2, 3), Rectifier::Softmax);

        config.layer_rectifiers.insert(2, Rectifier::Identity);
        config.layer_rectifiers.insert(1, Rectifier::ReLU);
        assert_eq!(config.rectifier_for(1, 3), Rectifier::ReLU);
        assert_eq!(config.rectifier_for(2, 3), Rectifier::Identity);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: NetworkConfig = serde_json::from_str(
            r#"{ "learning_rate": 0.8, "batch_mode": "sum", "layer_rectifiers": { "0": "relu" } }"#,
        ).unwrap();
        assert_eq!(config.learning_rate, 0.8);
        assert_eq!(config.batch_mode, BatchMode::Sum);
        assert_eq!(config.layer_rectifiers.get(&0), Some(&Rectifier::ReLU));
        assert_eq!(config.cost_function, CostFunction::Mse);
        assert_eq!(config.log_capacity, 1000);
    }
}
