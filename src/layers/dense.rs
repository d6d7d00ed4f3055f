use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{
    activation::rectifier::Rectifier,
    error::Result,
    init::initializer::Initializer,
    math::matrix::Matrix,
};

/// One dense layer: `rectify(weight × a + bias)`.
///
/// `weight` is `units × inputs` and `bias` is `units × 1`; activations flow
/// through the network as column vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer{
    pub weight: Matrix,
    pub bias: Matrix,
    pub rectifier: Rectifier
}

impl Layer {
    /// Zero-filled layer; call [`Layer::initialize`] before use.
    pub fn new(units: usize, inputs: usize, rectifier: Rectifier) -> Layer {
        Layer {
            weight: Matrix::zeros(units, inputs),
            bias: Matrix::zeros(units, 1),
            rectifier
        }
    }

    pub fn units(&self) -> usize {
        self.weight.rows
    }

    pub fn inputs(&self) -> usize {
        self.weight.cols
    }

    /// Rewrites every weight and bias cell. `fan_out` is `0` for the output layer.
    pub fn initialize<R: Rng + ?Sized>(
        &mut self,
        initializer: Initializer,
        fan_in: usize,
        fan_out: usize,
        rng: &mut R,
    ) {
        for cell in self.weight.data.iter_mut().flatten() {
            *cell = initializer.initialize(fan_in, fan_out, false, rng);
        }
        for cell in self.bias.data.iter_mut().flatten() {
            *cell = initializer.initialize(fan_in, fan_out, true, rng);
        }
    }

    pub fn feed(&self, input: &Matrix) -> Result<Matrix> {
        self.feed_with(&self.weight, input)
    }

    /// Same as [`Layer::feed`] but with a substitute weight matrix, used for
    /// the dropped-out output weights during training.
    pub(crate) fn feed_with(&self, weight: &Matrix, input: &Matrix) -> Result<Matrix> {
        let mut z = weight.matmul(input)?.add(&self.bias)?;
        z.activate(self.rectifier)?;
        Ok(z)
    }

    /// Subtracts the deltas. The layer is left untouched if either fails.
    pub fn apply_delta(&mut self, weight_delta: &Matrix, bias_delta: &Matrix) -> Result<()> {
        let weight = self.weight.subtract(weight_delta)?;
        let bias = self.bias.subtract(bias_delta)?;
        self.weight = weight;
        self.bias = bias;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn shapes_follow_units_and_inputs() {
        let layer = Layer::new(3, 2, Rectifier::ReLU);
        assert_eq!((layer.weight.rows, layer.weight.cols), (3, 2));
        assert_eq!((layer.bias.rows, layer.bias.cols), (3, 1));
        assert_eq!(layer.units(), 3);
        assert_eq!(layer.inputs(), 2);
    }

    #[test]
    fn feed_applies_weights_bias_and_rectifier() {
        let mut layer = Layer::new(2, 2, Rectifier::ReLU);
        layer.weight = Matrix::from_data(vec![vec![1.0, -1.0], vec![2.0, 0.0]]).unwrap();
        layer.bias = Matrix::column(&[0.5, -5.0]);
        let out = layer.feed(&Matrix::column(&[1.0, 3.0])).unwrap();
        assert_eq!(out, Matrix::column(&[0.0, 0.0]));

        let out = layer.feed(&Matrix::column(&[3.0, 1.0])).unwrap();
        assert_eq!(out, Matrix::column(&[2.5, 1.0]));
    }

    #[test]
    fn initialize_uses_bias_flag() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut layer = Layer::new(4, 3, Rectifier::Tanh);
        layer.initialize(Initializer::Xavier, 3, 0, &mut rng);
        assert!(layer.weight.data.iter().flatten().any(|&w| w != 0.0));
        assert_eq!(layer.bias, Matrix::zeros(4, 1));
    }

    #[test]
    fn clone_does_not_alias() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut layer = Layer::new(2, 2, Rectifier::Sigmoid);
        layer.initialize(Initializer::Random, 2, 1, &mut rng);
        let copy = layer.clone();
        layer.weight.data[0][0] += 1.0;
        assert_ne!(copy.weight, layer.weight);
    }

    #[test]
    fn apply_delta_is_all_or_nothing() {
        let mut layer = Layer::new(2, 2, Rectifier::Identity);
        let bad = layer.apply_delta(&Matrix::zeros(2, 2), &Matrix::zeros(3, 1));
        assert!(matches!(bad, Err(Error::ShapeMismatch(_))));
        assert_eq!(layer.weight, Matrix::zeros(2, 2));

        layer.apply_delta(&Matrix::from_data(vec![vec![1.0, 1.0], vec![1.0, 1.0]]).unwrap(), &Matrix::column(&[2.0, 2.0]))
            .unwrap();
        assert_eq!(layer.bias, Matrix::column(&[-2.0, -2.0]));
    }
}
