use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::{
    error::{Error, Result},
    math::matrix::Matrix,
    network::network::Network,
};

impl Network {
    /// Deep copy that does not inherit the event sender.
    pub fn copy(&self) -> Network {
        let mut copy = self.clone();
        copy.events = None;
        copy
    }

    /// Deep copy whose RNG is reseeded from this network's stream, so the
    /// two do not replay the same random numbers.
    fn fork(&mut self) -> Network {
        let mut copy = self.copy();
        copy.rng = StdRng::seed_from_u64(self.rng.gen());
        copy
    }

    /// Genetic mutation: a copy whose cells are each perturbed, with
    /// probability equal to the current mutation rate, by up to the current
    /// learning rate.
    pub fn mutate(&mut self) -> Network {
        let factor = self.learning_rate.current;
        let probability = self.mutation_rate.current;
        let mut copy = self.fork();
        for layer in copy.layers.iter_mut() {
            layer.weight.randomize(factor, probability, &mut self.rng);
            layer.bias.randomize(factor, probability, &mut self.rng);
        }
        copy
    }

    /// A copy with freshly initialized weights and biases.
    pub fn initialize(&mut self) -> Network {
        let mut copy = self.fork();
        copy.initialize_layers();
        copy
    }

    /// Re-seeds every layer in place. Fan-out is the next layer's unit count,
    /// or `0` for the output layer.
    pub(crate) fn initialize_layers(&mut self) {
        for (i, layer) in self.layers.iter_mut().enumerate() {
            let fan_in = self.configuration[i];
            let fan_out = self.configuration.get(i + 2).copied().unwrap_or(0);
            layer.initialize(self.initializer, fan_in, fan_out, &mut self.rng);
        }
    }

    /// Cell-wise mean of two or more networks with identical configurations.
    /// Hyperparameters are taken from the first network.
    pub fn merge(networks: &[&Network]) -> Result<Network> {
        let first = match networks {
            [first, _, ..] => *first,
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "merge needs at least 2 networks, got {}",
                    networks.len()
                )))
            }
        };
        if let Some(other) = networks.iter().find(|n| n.configuration != first.configuration) {
            return Err(Error::ShapeMismatch(format!(
                "cannot merge {:?} with {:?}",
                first.configuration, other.configuration
            )));
        }

        let mut merged = first.copy();
        for (i, layer) in merged.layers.iter_mut().enumerate() {
            let weights: Vec<&Matrix> = networks.iter().map(|n| &n.layers[i].weight).collect();
            let biases: Vec<&Matrix> = networks.iter().map(|n| &n.layers[i].bias).collect();
            layer.weight = Matrix::merge(&weights)?;
            layer.bias = Matrix::merge(&biases)?;
        }

        debug!(count = networks.len(), "merged networks");
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use crate::{NetworkBuilder, Rectifier, Error};

    #[test]
    fn merge_averages_every_layer() {
        let a = NetworkBuilder::new(&[2, 3, 1]).seed(1).build().unwrap();
        let b = NetworkBuilder::new(&[2, 3, 1]).seed(2).build().unwrap();
        let merged = crate::Network::merge(&[&a, &b]).unwrap();

        for ((la, lb), lm) in a.layers().iter().zip(b.layers()).zip(merged.layers()) {
            let expected = la.weight.add(&lb.weight).unwrap().divide_scalar(2.0).unwrap();
            assert_eq!(lm.weight, expected);
            let expected = la.bias.add(&lb.bias).unwrap().divide_scalar(2.0).unwrap();
            assert_eq!(lm.bias, expected);
        }
    }

    #[test]
    fn merge_needs_two_matching_networks() {
        let a = NetworkBuilder::new(&[2, 3, 1]).seed(1).build().unwrap();
        let c = NetworkBuilder::new(&[2, 4, 1]).seed(1).build().unwrap();
        assert!(matches!(crate::Network::merge(&[&a]), Err(Error::InvalidArgument(_))));
        assert!(matches!(crate::Network::merge(&[&a, &c]), Err(Error::ShapeMismatch(_))));
    }

    #[test]
    fn mutate_perturbs_a_copy_only() {
        let mut net = NetworkBuilder::new(&[2, 4, 1])
            .learning_rate(0.5)
            .mutation_rate(1.0)
            .seed(3)
            .build()
            .unwrap();
        let before = net.copy();
        let mutant = net.mutate();

        for (orig, now) in before.layers().iter().zip(net.layers()) {
            assert_eq!(orig.weight, now.weight);
        }
        let changed = mutant.layers().iter().zip(before.layers())
            .any(|(m, o)| m.weight != o.weight);
        assert!(changed);
        for (m, o) in mutant.layers().iter().zip(before.layers()) {
            let diff = m.weight.subtract(&o.weight).unwrap();
            assert!(diff.data.iter().flatten().all(|d| d.abs() <= 0.5 + 1e-12));
        }
    }

    #[test]
    fn zero_mutation_rate_leaves_weights_alone() {
        let mut net = NetworkBuilder::new(&[2, 2, 1]).mutation_rate(0.0).seed(4).build().unwrap();
        let mutant = net.mutate();
        for (m, o) in mutant.layers().iter().zip(net.layers()) {
            assert_eq!(m.weight, o.weight);
            assert_eq!(m.bias, o.bias);
        }
    }

    #[test]
    fn initialize_returns_fresh_weights_with_same_shape() {
        let mut net = NetworkBuilder::new(&[3, 5, 2])
            .rectifier(Rectifier::Tanh)
            .seed(5)
            .build()
            .unwrap();
        let fresh = net.initialize();
        assert_eq!(fresh.configuration(), net.configuration());
        assert_eq!(fresh.rectifiers(), net.rectifiers());
        assert!(fresh.layers().iter().zip(net.layers()).any(|(f, o)| f.weight != o.weight));
    }

    #[test]
    fn copies_never_alias() {
        let mut net = NetworkBuilder::new(&[2, 2, 1]).learning_rate(0.5).seed(6).build().unwrap();
        let copy = net.copy();
        net.fit(&[1.0, 0.0], &[1.0]).unwrap();
        assert!(copy.layers().iter().zip(net.layers()).any(|(c, n)| c.weight != n.weight));
        assert_eq!(copy.iteration_count(), 0);
    }
}
