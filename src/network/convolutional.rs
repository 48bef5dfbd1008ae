//! Convolutional network family.

use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{MaxPool2d, MaxPool2dConfig};
use burn::nn::{Dropout, DropoutConfig};
use burn::tensor::activation::relu;
use burn::tensor::{Tensor, backend::Backend};

use crate::errors::BuildError;
use crate::layers::{Activation, Dense, DenseConfig};

/// Convolution kernel for both blocks; valid padding, stride 1.
pub const KERNEL: [usize; 2] = [2, 2];
/// Pooling window (and stride) between the two blocks.
pub const POOL: [usize; 2] = [2, 2];
/// Filter count of the first block; the second block doubles it.
pub const BASE_FILTERS: usize = 5;

/// Everything the convolutional family needs, already resolved by the
/// translator.
#[derive(Debug, Clone)]
pub struct ConvSpec {
    pub rows: usize,
    pub cols: usize,
    pub channels: usize,
    pub output_width: usize,
    pub output_activation: Activation,
    pub dropout_rate: f64,
}

impl ConvSpec {
    /// Spatial extent after one valid convolution, or a geometry error once
    /// the extent is exhausted.
    fn convolved(extent: (usize, usize), stage: &str) -> Result<(usize, usize), BuildError> {
        if extent.0 < KERNEL[0] || extent.1 < KERNEL[1] {
            return Err(BuildError::geometry(format!(
                "{}x{} extent too small for the {} {}x{} convolution",
                extent.0, extent.1, stage, KERNEL[0], KERNEL[1]
            )));
        }
        Ok((extent.0 - KERNEL[0] + 1, extent.1 - KERNEL[1] + 1))
    }

    /// Width of the dense hidden layer after flattening.
    pub fn hidden_width(&self) -> usize {
        self.rows.max(self.cols).max(self.channels)
    }

    /// Flattened width after both convolution blocks, or a geometry error.
    pub fn flat_width(&self) -> Result<usize, BuildError> {
        let mut extent = (self.rows, self.cols);
        extent = Self::convolved(extent, "first-block")?;
        extent = Self::convolved(extent, "first-block")?;

        if extent.0 < POOL[0] || extent.1 < POOL[1] {
            return Err(BuildError::geometry(format!(
                "{}x{} extent too small for {}x{} pooling",
                extent.0, extent.1, POOL[0], POOL[1]
            )));
        }
        extent = (extent.0 / POOL[0], extent.1 / POOL[1]);

        extent = Self::convolved(extent, "second-block")?;
        extent = Self::convolved(extent, "second-block")?;

        Ok(BASE_FILTERS * 2 * extent.0 * extent.1)
    }

    /// Initializes the network with the given device.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<ConvNetwork<B>, BuildError> {
        let flat_width = self.flat_width()?;
        let hidden_width = self.hidden_width();

        let dropout =
            (self.dropout_rate > 0.0).then(|| DropoutConfig::new(self.dropout_rate).init());
        // the dense head doubles the dropout rate, as the configuration
        // validation guarantees it stays below 1
        let head_dropout =
            (self.dropout_rate > 0.0).then(|| DropoutConfig::new(self.dropout_rate * 2.0).init());

        Ok(ConvNetwork {
            conv1a: Conv2dConfig::new([self.channels, BASE_FILTERS], KERNEL).init(device),
            conv1b: Conv2dConfig::new([BASE_FILTERS, BASE_FILTERS], KERNEL).init(device),
            pool: MaxPool2dConfig::new(POOL).with_strides(POOL).init(),
            conv2a: Conv2dConfig::new([BASE_FILTERS, BASE_FILTERS * 2], KERNEL).init(device),
            conv2b: Conv2dConfig::new([BASE_FILTERS * 2, BASE_FILTERS * 2], KERNEL).init(device),
            dropout,
            head_dropout,
            hidden: DenseConfig::new(flat_width, hidden_width)
                .with_activation(Activation::Relu)
                .init(device),
            output: DenseConfig::new(hidden_width, self.output_width)
                .with_activation(self.output_activation)
                .init(device),
            flat_width,
            rows: self.rows,
            cols: self.cols,
            channels: self.channels,
        })
    }
}

/// Two convolution blocks with a pooling stage between them, then a dense
/// head.
///
/// Accepts channels-last input `(samples, rows, cols, channels)` and
/// permutes to Burn's channels-first layout internally.
#[derive(Module, Debug)]
pub struct ConvNetwork<B: Backend> {
    conv1a: Conv2d<B>,
    conv1b: Conv2d<B>,
    pool: MaxPool2d,
    conv2a: Conv2d<B>,
    conv2b: Conv2d<B>,
    dropout: Option<Dropout>,
    head_dropout: Option<Dropout>,
    hidden: Dense<B>,
    output: Dense<B>,
    flat_width: usize,
    rows: usize,
    cols: usize,
    channels: usize,
}

impl<B: Backend> ConvNetwork<B> {
    /// Performs a forward pass.
    pub fn forward(&self, input: Tensor<B, 4>) -> Result<Tensor<B, 2>, BuildError> {
        let [_, rows, cols, channels] = input.dims();
        if (rows, cols, channels) != (self.rows, self.cols, self.channels) {
            return Err(BuildError::ShapeMismatch {
                expected: format!("{}x{}x{} images", self.rows, self.cols, self.channels),
                actual: format!("{rows}x{cols}x{channels} images"),
            });
        }

        let x = input.permute([0, 3, 1, 2]);
        let x = relu(self.conv1a.forward(x));
        let x = relu(self.conv1b.forward(x));
        let mut x = self.pool.forward(x);
        if let Some(dropout) = &self.dropout {
            x = dropout.forward(x);
        }
        let x = relu(self.conv2a.forward(x));
        let mut x = relu(self.conv2b.forward(x));
        if let Some(dropout) = &self.dropout {
            x = dropout.forward(x);
        }

        let [batch, channels, rows, cols] = x.dims();
        let mut x = self.hidden.forward(x.reshape([batch, channels * rows * cols]));
        if let Some(dropout) = &self.head_dropout {
            x = dropout.forward(x);
        }
        Ok(self.output.forward(x))
    }

    /// Flattened width between the convolution stack and the dense head.
    pub fn flat_width(&self) -> usize {
        self.flat_width
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
    fn test_flat_width_geometry() {
        // 12x10: conv -> 11x9 -> 10x8, pool -> 5x4, conv -> 4x3 -> 3x2
        let spec = ConvSpec {
            rows: 12,
            cols: 10,
            channels: 3,
            output_width: 4,
            output_activation: Activation::Softmax,
            dropout_rate: 0.0,
        };
        assert_eq!(spec.flat_width().unwrap(), BASE_FILTERS * 2 * 3 * 2);
        assert_eq!(spec.hidden_width(), 12);
    }

    #[test]
    fn test_forward_shape() {
        let spec = ConvSpec {
            rows: 12,
            cols: 10,
            channels: 3,
            output_width: 4,
            output_activation: Activation::Softmax,
            dropout_rate: 0.2,
        };
        let net: ConvNetwork<TestBackend> = spec.init(&device()).unwrap();

        let input = Tensor::<TestBackend, 4>::zeros([2, 12, 10, 3], &device());
        let output = net.forward(input).unwrap();
        assert_eq!(output.dims(), [2, 4]);
    }

    #[test]
    fn test_mismatched_image_shape_rejected() {
        let spec = ConvSpec {
            rows: 12,
            cols: 10,
            channels: 3,
            output_width: 4,
            output_activation: Activation::Softmax,
            dropout_rate: 0.0,
        };
        let net: ConvNetwork<TestBackend> = spec.init(&device()).unwrap();

        let wrong_extent = Tensor::<TestBackend, 4>::zeros([2, 10, 10, 3], &device());
        assert!(matches!(
            net.forward(wrong_extent),
            Err(BuildError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_too_small_image_rejected() {
        let spec = ConvSpec {
            rows: 3,
            cols: 3,
            channels: 1,
            output_width: 1,
            output_activation: Activation::Sigmoid,
            dropout_rate: 0.0,
        };
        // 3x3 -> 2x2 -> 1x1, then pooling has nothing left to take
        assert!(matches!(
            spec.init::<TestBackend>(&device()),
            Err(BuildError::Geometry { .. })
        ));
    }
}
