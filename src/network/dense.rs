//! Dense (feed-forward) network family.

use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig};
use burn::tensor::{Tensor, backend::Backend};

use crate::errors::BuildError;
use crate::layers::{Activation, Dense, DenseConfig};

/// Everything the dense family needs, already resolved by the translator.
#[derive(Debug, Clone)]
pub struct DenseSpec {
    pub feature_width: usize,
    /// One width per hidden block (`layers - 1` entries; may be empty).
    pub hidden_widths: Vec<usize>,
    pub hidden_activation: Activation,
    pub output_width: usize,
    pub output_activation: Activation,
    pub dropout_rate: f64,
    pub use_batch_norm: bool,
    /// Index of the hidden block rendered as a linear no-bias bottleneck.
    pub bottleneck: Option<usize>,
}

impl DenseSpec {
    /// Initializes the network with the given device.
    pub fn init<B: Backend>(&self, device: &B::Device) -> DenseNetwork<B> {
        let mut hidden = Vec::with_capacity(self.hidden_widths.len());
        let mut input = self.feature_width;

        for (i, &width) in self.hidden_widths.iter().enumerate() {
            let block = if self.bottleneck == Some(i) {
                // compressed representation: linear, no bias
                DenseConfig::new(input, width).with_bias(false)
            } else {
                DenseConfig::new(input, width)
                    .with_activation(self.hidden_activation)
                    .with_bias(!self.use_batch_norm)
                    .with_batch_norm(self.use_batch_norm)
            };
            hidden.push(block.init(device));
            input = width;
        }

        let dropout = (self.dropout_rate > 0.0).then(|| DropoutConfig::new(self.dropout_rate).init());
        let output = DenseConfig::new(input, self.output_width)
            .with_activation(self.output_activation)
            .init(device);

        DenseNetwork {
            hidden,
            dropout,
            output,
            feature_width: self.feature_width,
        }
    }
}

/// Feed-forward network: a chain of hidden blocks then an affine output
/// layer. Dropout, when configured, follows every hidden block.
#[derive(Module, Debug)]
pub struct DenseNetwork<B: Backend> {
    hidden: Vec<Dense<B>>,
    dropout: Option<Dropout>,
    output: Dense<B>,
    feature_width: usize,
}

impl<B: Backend> DenseNetwork<B> {
    /// Performs a forward pass through all blocks.
    pub fn forward(&self, input: Tensor<B, 2>) -> Result<Tensor<B, 2>, BuildError> {
        let [_, width] = input.dims();
        if width != self.feature_width {
            return Err(BuildError::ShapeMismatch {
                expected: format!("{} features", self.feature_width),
                actual: format!("{width} features"),
            });
        }

        let mut x = input;
        for layer in &self.hidden {
            x = layer.forward(x);
            if let Some(dropout) = &self.dropout {
                x = dropout.forward(x);
            }
        }
        Ok(self.output.forward(x))
    }

    /// Number of hidden blocks (excludes the output layer).
    pub fn num_hidden(&self) -> usize {
        self.hidden.len()
    }

    /// Width of the output layer.
    pub fn output_width(&self) -> usize {
        self.output.output_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn device() -> <TestBackend as Backend>::Device {
        Default::default()
    }

    #[test]
    fn test_forward_shape() {
        let spec = DenseSpec {
            feature_width: 6,
            hidden_widths: vec![8, 4],
            hidden_activation: Activation::Tanh,
            output_width: 2,
            output_activation: Activation::Linear,
            dropout_rate: 0.0,
            use_batch_norm: false,
            bottleneck: None,
        };
        let net: DenseNetwork<TestBackend> = spec.init(&device());

        let input = Tensor::<TestBackend, 2>::zeros([3, 6], &device());
        assert_eq!(net.forward(input).unwrap().dims(), [3, 2]);
        assert_eq!(net.num_hidden(), 2);
        assert_eq!(net.output_width(), 2);
    }

    #[test]
    fn test_no_hidden_layers() {
        // single affine output layer, the `layers = 1` case
        let spec = DenseSpec {
            feature_width: 784,
            hidden_widths: vec![],
            hidden_activation: Activation::Tanh,
            output_width: 1,
            output_activation: Activation::Tanh,
            dropout_rate: 0.0,
            use_batch_norm: false,
            bottleneck: None,
        };
        let net: DenseNetwork<TestBackend> = spec.init(&device());

        assert_eq!(net.num_hidden(), 0);
        let input = Tensor::<TestBackend, 2>::zeros([2, 784], &device());
        assert_eq!(net.forward(input).unwrap().dims(), [2, 1]);
    }

    #[test]
    fn test_mismatched_feature_width_rejected() {
        let spec = DenseSpec {
            feature_width: 4,
            hidden_widths: vec![],
            hidden_activation: Activation::Tanh,
            output_width: 1,
            output_activation: Activation::Tanh,
            dropout_rate: 0.0,
            use_batch_norm: false,
            bottleneck: None,
        };
        let net: DenseNetwork<TestBackend> = spec.init(&device());

        let wide = Tensor::<TestBackend, 2>::zeros([2, 6], &device());
        assert!(matches!(
            net.forward(wide),
            Err(BuildError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_bottleneck_forward() {
        let spec = DenseSpec {
            feature_width: 8,
            hidden_widths: vec![8, 2, 8],
            hidden_activation: Activation::Relu,
            output_width: 8,
            output_activation: Activation::Linear,
            dropout_rate: 0.1,
            use_batch_norm: false,
            bottleneck: Some(1),
        };
        let net: DenseNetwork<TestBackend> = spec.init(&device());

        let input = Tensor::<TestBackend, 2>::ones([4, 8], &device());
        assert_eq!(net.forward(input).unwrap().dims(), [4, 8]);
    }
}
