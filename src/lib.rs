//! Declarative neural network assembly on top of Burn.
//!
//! A [`NetworkConfig`] plus the shapes of the feature and target tensors are
//! translated into a compiled, untrained model: the rank of the feature
//! tensor selects the architecture family (flat inputs become dense stacks,
//! sequences become LSTM stacks, images become a small convolutional net),
//! the target kind selects loss, output activation and metric, and the
//! optimizer is resolved deterministically from the same inputs.
//!
//! ```rust
//! use netforge::prelude::*;
//!
//! type B = burn::backend::NdArray;
//! let device = Default::default();
//!
//! let config = NetworkConfig::new().layers(2).node_width(16);
//! let model = assemble::<B>(
//!     FeatureShape::Flat { features: 8 },
//!     TargetSpec::new(1, TargetKind::Boolean),
//!     &config,
//!     &device,
//! )
//! .unwrap();
//!
//! assert_eq!(model.loss(), Loss::BinaryCrossEntropy);
//! ```

pub mod config;
pub mod errors;
pub mod layers;
pub mod network;
pub mod shape;
pub mod training;
pub mod translate;

pub use config::NetworkConfig;
pub use errors::BuildError;
pub use layers::Activation;
pub use network::{Family, Network};
pub use shape::{FeatureBatch, FeatureShape, TargetKind, TargetSpec};
pub use training::{Loss, Metric, OptimizerChoice, TrainingConfig, TrainingHistory};
pub use translate::{ArchitectureSummary, AssembledNetwork, LayerDesc, Score, assemble};

/// Autodiff-enabled CPU backend for training.
pub type TrainingBackend = burn::backend::Autodiff<burn::backend::NdArray>;
/// Plain CPU backend for inference-only use.
pub type InferenceBackend = burn::backend::NdArray;

pub mod prelude {
    pub use crate::config::NetworkConfig;
    pub use crate::errors::BuildError;
    pub use crate::layers::Activation;
    pub use crate::network::{Family, Network};
    pub use crate::shape::{FeatureBatch, FeatureShape, TargetKind, TargetSpec};
    pub use crate::training::{
        Loss, Metric, OptimizerChoice, TrainingConfig, TrainingHistory,
    };
    pub use crate::translate::{
        ArchitectureSummary, AssembledNetwork, LayerDesc, Score, assemble,
    };
    pub use crate::{InferenceBackend, TrainingBackend};
}
