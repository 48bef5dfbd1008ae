//! Shape descriptors that carry the architecture family decision.
//!
//! The family is decided once, from the rank of the feature tensor, and then
//! travels through assembly as a tagged variant instead of being re-derived
//! at every branch.

use burn::tensor::{Tensor, backend::Backend};
use serde::Serialize;

use crate::errors::BuildError;

/// Feature tensor shape, tagged with the architecture family it selects.
///
/// The leading axis is always the sample count and is not recorded here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeatureShape {
    /// Rank-2 input `(samples, features)`; selects a dense network.
    Flat { features: usize },
    /// Rank-3 input `(samples, timesteps, features)`; selects a recurrent
    /// network.
    Sequence { timesteps: usize, features: usize },
    /// Rank-4 input `(samples, rows, cols, channels)`; selects a
    /// convolutional network.
    Image {
        rows: usize,
        cols: usize,
        channels: usize,
    },
}

impl FeatureShape {
    /// Derives the shape from raw tensor dimensions.
    ///
    /// Ranks outside 2..=4 have no architecture family and are rejected.
    pub fn from_dims(dims: &[usize]) -> Result<Self, BuildError> {
        match *dims {
            [_, features] => Ok(Self::Flat { features }),
            [_, timesteps, features] => Ok(Self::Sequence {
                timesteps,
                features,
            }),
            [_, rows, cols, channels] => Ok(Self::Image {
                rows,
                cols,
                channels,
            }),
            _ => Err(BuildError::UnsupportedRank { rank: dims.len() }),
        }
    }

    /// Size of the trailing axis; the default hidden width.
    pub fn feature_width(&self) -> usize {
        match self {
            Self::Flat { features } | Self::Sequence { features, .. } => *features,
            Self::Image { channels, .. } => *channels,
        }
    }
}

/// How target values should be interpreted when selecting the loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TargetKind {
    /// Boolean labels; binary cross-entropy.
    Boolean,
    /// Categorical labels (e.g. one-hot columns); categorical cross-entropy.
    Categorical,
    /// Continuous values; mean squared error.
    Continuous,
}

/// Target tensor description: output width plus value interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetSpec {
    /// Width of the network's output layer.
    pub width: usize,
    /// Value interpretation driving loss selection.
    pub kind: TargetKind,
}

impl TargetSpec {
    pub fn new(width: usize, kind: TargetKind) -> Self {
        Self { width, kind }
    }

    /// Derives the spec from raw target dimensions.
    ///
    /// Rank-1 targets collapse to a single output per sample; rank 2 and
    /// above use the trailing axis (one-hot columns or steps ahead).
    pub fn from_dims(dims: &[usize], kind: TargetKind) -> Result<Self, BuildError> {
        match *dims {
            [] => Err(BuildError::UnsupportedRank { rank: 0 }),
            [_] => Ok(Self::new(1, kind)),
            [.., width] => Ok(Self::new(width, kind)),
        }
    }
}

/// A batch of feature data at the rank its family expects.
#[derive(Debug, Clone)]
pub enum FeatureBatch<B: Backend> {
    Flat(Tensor<B, 2>),
    Sequence(Tensor<B, 3>),
    Image(Tensor<B, 4>),
}

impl<B: Backend> FeatureBatch<B> {
    /// Number of samples in the batch.
    pub fn len(&self) -> usize {
        match self {
            Self::Flat(t) => t.dims()[0],
            Self::Sequence(t) => t.dims()[0],
            Self::Image(t) => t.dims()[0],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tensor rank of the batch.
    pub fn rank(&self) -> usize {
        match self {
            Self::Flat(_) => 2,
            Self::Sequence(_) => 3,
            Self::Image(_) => 4,
        }
    }

    /// The shape descriptor this batch conforms to.
    pub fn shape(&self) -> FeatureShape {
        match self {
            Self::Flat(t) => FeatureShape::Flat {
                features: t.dims()[1],
            },
            Self::Sequence(t) => {
                let [_, timesteps, features] = t.dims();
                FeatureShape::Sequence {
                    timesteps,
                    features,
                }
            }
            Self::Image(t) => {
                let [_, rows, cols, channels] = t.dims();
                FeatureShape::Image {
                    rows,
                    cols,
                    channels,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_shape_rank_dispatch() {
        assert_eq!(
            FeatureShape::from_dims(&[100, 8]).unwrap(),
            FeatureShape::Flat { features: 8 }
        );
        assert_eq!(
            FeatureShape::from_dims(&[100, 20, 5]).unwrap(),
            FeatureShape::Sequence {
                timesteps: 20,
                features: 5
            }
        );
        assert_eq!(
            FeatureShape::from_dims(&[100, 28, 28, 3]).unwrap(),
            FeatureShape::Image {
                rows: 28,
                cols: 28,
                channels: 3
            }
        );
    }

    #[test]
    fn test_feature_shape_rejects_other_ranks() {
        assert!(matches!(
            FeatureShape::from_dims(&[100]),
            Err(BuildError::UnsupportedRank { rank: 1 })
        ));
        assert!(matches!(
            FeatureShape::from_dims(&[2, 3, 4, 5, 6]),
            Err(BuildError::UnsupportedRank { rank: 5 })
        ));
    }

    #[test]
    fn test_feature_width_is_trailing_axis() {
        assert_eq!(FeatureShape::Flat { features: 784 }.feature_width(), 784);
        assert_eq!(
            FeatureShape::Sequence {
                timesteps: 20,
                features: 5
            }
            .feature_width(),
            5
        );
        assert_eq!(
            FeatureShape::Image {
                rows: 28,
                cols: 28,
                channels: 3
            }
            .feature_width(),
            3
        );
    }

    #[test]
    fn test_target_width_resolution() {
        let scalar = TargetSpec::from_dims(&[100], TargetKind::Continuous).unwrap();
        assert_eq!(scalar.width, 1);

        let one_hot = TargetSpec::from_dims(&[100, 10], TargetKind::Categorical).unwrap();
        assert_eq!(one_hot.width, 10);

        assert!(TargetSpec::from_dims(&[], TargetKind::Continuous).is_err());
    }
}
