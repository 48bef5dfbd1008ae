//! Assembled network families.

mod convolutional;
mod dense;
mod recurrent;

pub use convolutional::{BASE_FILTERS, ConvNetwork, ConvSpec, KERNEL, POOL};
pub use dense::{DenseNetwork, DenseSpec};
pub use recurrent::{RecurrentNetwork, RecurrentSpec};

use burn::module::Module;
use burn::tensor::{Tensor, backend::Backend};
use serde::Serialize;

use crate::errors::BuildError;
use crate::shape::{FeatureBatch, FeatureShape};

/// Architecture family, fixed once when the feature shape is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Dense,
    Recurrent,
    Convolutional,
}

impl Family {
    /// The family a feature shape selects.
    pub fn from_shape(shape: &FeatureShape) -> Self {
        match shape {
            FeatureShape::Flat { .. } => Family::Dense,
            FeatureShape::Sequence { .. } => Family::Recurrent,
            FeatureShape::Image { .. } => Family::Convolutional,
        }
    }
}

/// A fully assembled network of one of the three families.
#[derive(Module, Debug)]
pub enum Network<B: Backend> {
    Dense(DenseNetwork<B>),
    Recurrent(RecurrentNetwork<B>),
    Convolutional(ConvNetwork<B>),
}

impl<B: Backend> Network<B> {
    /// The family this network was assembled as.
    pub fn family(&self) -> Family {
        match self {
            Network::Dense(_) => Family::Dense,
            Network::Recurrent(_) => Family::Recurrent,
            Network::Convolutional(_) => Family::Convolutional,
        }
    }

    /// Runs a forward pass, checking that the batch rank matches the family
    /// and that its trailing dimensions match the assembled input shape.
    pub fn forward(&self, batch: FeatureBatch<B>) -> Result<Tensor<B, 2>, BuildError> {
        match (self, batch) {
            (Network::Dense(net), FeatureBatch::Flat(input)) => net.forward(input),
            (Network::Recurrent(net), FeatureBatch::Sequence(input)) => net.forward(input),
            (Network::Convolutional(net), FeatureBatch::Image(input)) => net.forward(input),
            (net, batch) => Err(BuildError::ShapeMismatch {
                expected: format!("{:?} family input", net.family()),
                actual: format!("rank-{} batch", batch.rank()),
            }),
        }
    }

    /// Width of the output layer.
    pub fn output_width(&self) -> usize {
        match self {
            Network::Dense(net) => net.output_width(),
            Network::Recurrent(net) => net.output_width(),
            Network::Convolutional(net) => net.output_width(),
        }
    }
}
