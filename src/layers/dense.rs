//! Dense (affine) block: linear transform, optional batch normalization,
//! activation.

use crate::layers::Activation;
use burn::{
    module::Module,
    nn::{BatchNorm, BatchNormConfig, Linear, LinearConfig},
    tensor::{Tensor, backend::Backend},
};

/// Configuration for a dense block.
#[derive(Debug, Clone)]
pub struct DenseConfig {
    /// Number of input features.
    pub input_size: usize,
    /// Number of output features.
    pub output_size: usize,
    /// Activation applied after the transform (and normalization, if any).
    pub activation: Activation,
    /// Whether the affine transform carries a bias term.
    pub bias: bool,
    /// Insert batch normalization between the transform and the activation.
    pub batch_norm: bool,
}

impl DenseConfig {
    /// Creates a new DenseConfig with identity activation and a bias term.
    pub fn new(input_size: usize, output_size: usize) -> Self {
        Self {
            input_size,
            output_size,
            activation: Activation::Linear,
            bias: true,
            batch_norm: false,
        }
    }

    /// Sets the activation function.
    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Toggles the bias term; bottleneck layers and normalized blocks drop it.
    pub fn with_bias(mut self, bias: bool) -> Self {
        self.bias = bias;
        self
    }

    /// Toggles batch normalization.
    pub fn with_batch_norm(mut self, batch_norm: bool) -> Self {
        self.batch_norm = batch_norm;
        self
    }

    /// Initializes the block with the given device.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Dense<B> {
        let linear = LinearConfig::new(self.input_size, self.output_size)
            .with_bias(self.bias)
            .init(device);
        let norm = self
            .batch_norm
            .then(|| BatchNormConfig::new(self.output_size).init(device));

        Dense {
            linear,
            norm,
            input_size: self.input_size,
            output_size: self.output_size,
            activation_id: self.activation.to_id(),
        }
    }
}

/// An affine transform with optional batch normalization and activation.
#[derive(Module, Debug)]
pub struct Dense<B: Backend> {
    linear: Linear<B>,
    norm: Option<BatchNorm<B, 1>>,
    /// Input size (constant metadata).
    input_size: usize,
    /// Output size (constant metadata).
    output_size: usize,
    /// Activation function ID; enums are not Burn modules.
    activation_id: u8,
}

impl<B: Backend> Dense<B> {
    /// Performs the forward pass.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = self.linear.forward(input);
        if let Some(norm) = &self.norm {
            // BatchNorm<B, 1> expects [batch, channels, length]
            let [batch, features] = x.dims();
            x = norm
                .forward(x.reshape([batch, features, 1]))
                .reshape([batch, features]);
        }
        self.activation().apply(x)
    }

    /// Returns the input size of this block.
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Returns the output size of this block.
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Returns the activation function.
    pub fn activation(&self) -> Activation {
        Activation::from_id(self.activation_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_dense_config_creation() {
        let config = DenseConfig::new(10, 5)
            .with_activation(Activation::Relu)
            .with_bias(false)
            .with_batch_norm(true);

        assert_eq!(config.input_size, 10);
        assert_eq!(config.output_size, 5);
        assert_eq!(config.activation, Activation::Relu);
        assert!(!config.bias);
        assert!(config.batch_norm);
    }

    #[test]
    fn test_dense_forward_shape() {
        let device = <TestBackend as Backend>::Device::default();
        let dense: Dense<TestBackend> = DenseConfig::new(4, 2).init(&device);

        let input = Tensor::<TestBackend, 2>::zeros([3, 4], &device);
        let output = dense.forward(input);

        assert_eq!(output.dims(), [3, 2]);
    }

    #[test]
    fn test_dense_forward_with_batch_norm() {
        let device = <TestBackend as Backend>::Device::default();
        let dense: Dense<TestBackend> = DenseConfig::new(4, 3)
            .with_activation(Activation::Tanh)
            .with_bias(false)
            .with_batch_norm(true)
            .init(&device);

        let input = Tensor::<TestBackend, 2>::ones([5, 4], &device);
        let output = dense.forward(input);

        assert_eq!(output.dims(), [5, 3]);
    }

    #[test]
    fn test_dense_metadata() {
        let device = <TestBackend as Backend>::Device::default();
        let dense: Dense<TestBackend> = DenseConfig::new(4, 2)
            .with_activation(Activation::Sigmoid)
            .init(&device);

        assert_eq!(dense.input_size(), 4);
        assert_eq!(dense.output_size(), 2);
        assert_eq!(dense.activation(), Activation::Sigmoid);
    }
}
