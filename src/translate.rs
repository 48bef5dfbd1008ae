//! The configuration translator.
//!
//! Maps a declarative [`NetworkConfig`] plus feature/target shape
//! descriptors onto an assembled, compiled, untrained model: the layered
//! network itself, the loss/metric pair the target selects, and a
//! deterministic optimizer choice. Assembly is a pure function of its
//! inputs apart from weight initialization.

use burn::tensor::{
    ElementConversion, Tensor,
    backend::{AutodiffBackend, Backend},
};
use serde::Serialize;

use crate::config::NetworkConfig;
use crate::errors::BuildError;
use crate::layers::Activation;
use crate::network::{
    BASE_FILTERS, ConvSpec, DenseSpec, Family, KERNEL, Network, POOL, RecurrentSpec,
};
use crate::shape::{FeatureBatch, FeatureShape, TargetKind, TargetSpec};
use crate::training::{
    self, Loss, Metric, OptimizerChoice, TrainingConfig, TrainingHistory,
};

/// Resolves the hidden widths.
///
/// Empty (or the `[0]` marker) defaults to the feature width; a scalar is
/// broadcast; a short sequence is right-padded with its final value; surplus
/// entries are truncated. The result always has exactly `layers` entries.
pub fn resolve_nodes(nodes: &[usize], layers: usize, feature_width: usize) -> Vec<usize> {
    let mut resolved: Vec<usize> = match nodes {
        [] | [0] => vec![feature_width],
        _ => nodes.to_vec(),
    };
    resolved.truncate(layers);
    if let Some(&last) = resolved.last() {
        while resolved.len() < layers {
            resolved.push(last);
        }
    }
    resolved
}

/// Selects loss, output activation and auxiliary metric for a target.
///
/// Priority order, first match wins: boolean targets take binary
/// cross-entropy even when `one_hot` is also set; categorical or one-hot
/// targets take categorical cross-entropy; everything else is regression
/// with mean squared error, where the configured output activation override
/// (or the family default) applies.
pub fn select_loss(
    kind: TargetKind,
    one_hot: bool,
    family: Family,
    override_activation: Option<Activation>,
) -> (Loss, Activation, Option<Metric>) {
    match kind {
        TargetKind::Boolean => (
            Loss::BinaryCrossEntropy,
            Activation::Sigmoid,
            Some(Metric::Accuracy),
        ),
        TargetKind::Categorical => (
            Loss::CategoricalCrossEntropy,
            Activation::Softmax,
            Some(Metric::Accuracy),
        ),
        TargetKind::Continuous if one_hot => (
            Loss::CategoricalCrossEntropy,
            Activation::Softmax,
            Some(Metric::Accuracy),
        ),
        TargetKind::Continuous => {
            let activation = override_activation.unwrap_or(match family {
                Family::Dense | Family::Recurrent => Activation::Tanh,
                Family::Convolutional => Activation::Linear,
            });
            (Loss::Mse, activation, Some(Metric::RSquared))
        }
    }
}

/// One layer of an assembled architecture, as data.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "layer", rename_all = "snake_case")]
pub enum LayerDesc {
    Dense {
        input: usize,
        output: usize,
        activation: Activation,
        bias: bool,
        batch_norm: bool,
    },
    /// Linear no-bias compression layer of an autoencoder-style model.
    Bottleneck { input: usize, output: usize },
    BatchNorm { features: usize },
    Dropout { rate: f64 },
    Lstm {
        input: usize,
        hidden: usize,
        return_sequences: bool,
    },
    Conv2d {
        in_channels: usize,
        filters: usize,
        kernel: [usize; 2],
    },
    MaxPool2d { pool: [usize; 2] },
    Flatten { width: usize },
}

/// Deterministic description of an assembled network.
///
/// Two assemblies from the same configuration and shapes produce equal
/// summaries even though their weights are initialized independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchitectureSummary {
    pub family: Family,
    pub input: FeatureShape,
    pub output_width: usize,
    pub loss: Loss,
    pub metric: Option<Metric>,
    pub optimizer: OptimizerChoice,
    /// Fixed batch size of a stateful recurrent model.
    pub fixed_batch: Option<usize>,
    pub layers: Vec<LayerDesc>,
}

impl ArchitectureSummary {
    /// Serializes the summary for logging or storage.
    pub fn to_json(&self) -> Result<String, BuildError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Loss and optional auxiliary metric from `evaluate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub loss: f32,
    pub metric: Option<f32>,
}

/// An assembled, compiled, untrained model.
///
/// Owns the network plus its resolved loss, metric and optimizer choice;
/// `predict`, `fit` and `evaluate` are the whole contract surface a training
/// driver relies on.
#[derive(Debug)]
pub struct AssembledNetwork<B: Backend> {
    network: Network<B>,
    summary: ArchitectureSummary,
}

impl<B: Backend> AssembledNetwork<B> {
    pub fn network(&self) -> &Network<B> {
        &self.network
    }

    /// Consumes the model, yielding the bare network module.
    pub fn into_network(self) -> Network<B> {
        self.network
    }

    pub fn summary(&self) -> &ArchitectureSummary {
        &self.summary
    }

    pub fn loss(&self) -> Loss {
        self.summary.loss
    }

    pub fn metric(&self) -> Option<Metric> {
        self.summary.metric
    }

    pub fn optimizer(&self) -> OptimizerChoice {
        self.summary.optimizer
    }

    /// Runs inference on a batch.
    pub fn predict(&self, batch: FeatureBatch<B>) -> Result<Tensor<B, 2>, BuildError> {
        self.network.forward(batch)
    }

    /// Rejects target tensors whose shape does not pair with the batch;
    /// tensor broadcasting would otherwise compute a silently wrong loss.
    fn check_targets(
        &self,
        batch: &FeatureBatch<B>,
        targets: &Tensor<B, 2>,
    ) -> Result<(), BuildError> {
        let [rows, width] = targets.dims();
        if rows != batch.len() || width != self.summary.output_width {
            return Err(BuildError::ShapeMismatch {
                expected: format!("[{}, {}] targets", batch.len(), self.summary.output_width),
                actual: format!("[{rows}, {width}] targets"),
            });
        }
        Ok(())
    }

    /// Computes the loss (and auxiliary metric) on a batch without training.
    pub fn evaluate(
        &self,
        batch: FeatureBatch<B>,
        targets: Tensor<B, 2>,
    ) -> Result<Score, BuildError> {
        self.check_targets(&batch, &targets)?;
        let predictions = self.network.forward(batch)?;
        let loss: f32 = self
            .summary
            .loss
            .compute(predictions.clone(), targets.clone())
            .into_scalar()
            .elem();
        let metric = self
            .summary
            .metric
            .map(|metric| metric.compute(predictions, targets));
        Ok(Score { loss, metric })
    }
}

impl<B: AutodiffBackend> AssembledNetwork<B> {
    /// Trains with the resolved loss and optimizer, returning the updated
    /// model and its history.
    pub fn fit(
        mut self,
        batch: FeatureBatch<B>,
        targets: Tensor<B, 2>,
        config: &TrainingConfig,
    ) -> Result<(Self, TrainingHistory), BuildError> {
        self.check_targets(&batch, &targets)?;
        let outcome = training::train(
            self.network,
            batch,
            targets,
            self.summary.loss,
            self.summary.metric,
            self.summary.optimizer,
            config,
        )?;
        self.network = outcome.network;
        Ok((self, outcome.history))
    }
}

/// Translates a configuration and data shapes into an assembled model.
///
/// Validation runs first; no partial model escapes on failure.
pub fn assemble<B: Backend>(
    features: FeatureShape,
    target: TargetSpec,
    config: &NetworkConfig,
    device: &B::Device,
) -> Result<AssembledNetwork<B>, BuildError> {
    config.validate()?;

    let family = Family::from_shape(&features);
    let nodes = resolve_nodes(&config.nodes, config.layers, features.feature_width());
    let (loss, output_activation, metric) = select_loss(
        target.kind,
        config.one_hot_output,
        family,
        config.activation_output,
    );
    let optimizer = OptimizerChoice::resolve(config.optimizer, config.learning_rate, family);

    let (network, layers, fixed_batch) = match features {
        FeatureShape::Flat { features: width } => {
            let (network, layers) =
                assemble_dense(width, &nodes, target.width, output_activation, config, device)?;
            (network, layers, None)
        }
        FeatureShape::Sequence { features: width, .. } => assemble_recurrent(
            width,
            &nodes,
            target.width,
            output_activation,
            config,
            device,
        )?,
        FeatureShape::Image {
            rows,
            cols,
            channels,
        } => {
            let (network, layers) = assemble_convolutional(
                rows,
                cols,
                channels,
                target.width,
                output_activation,
                config,
                device,
            )?;
            (network, layers, None)
        }
    };

    Ok(AssembledNetwork {
        network,
        summary: ArchitectureSummary {
            family,
            input: features,
            output_width: target.width,
            loss,
            metric,
            optimizer,
            fixed_batch,
            layers,
        },
    })
}

fn assemble_dense<B: Backend>(
    feature_width: usize,
    nodes: &[usize],
    output_width: usize,
    output_activation: Activation,
    config: &NetworkConfig,
    device: &B::Device,
) -> Result<(Network<B>, Vec<LayerDesc>), BuildError> {
    // the final node entry pads the invariant; hidden blocks use the rest
    let hidden_widths = &nodes[..nodes.len() - 1];
    let bottleneck = config
        .autoencoder
        .then(|| {
            hidden_widths
                .iter()
                .copied()
                .min()
                .and_then(|narrowest| hidden_widths.iter().position(|&w| w == narrowest))
        })
        .flatten();

    let spec = DenseSpec {
        feature_width,
        hidden_widths: hidden_widths.to_vec(),
        hidden_activation: config.activation_hidden,
        output_width,
        output_activation,
        dropout_rate: config.dropout_rate,
        use_batch_norm: config.use_batch_norm,
        bottleneck,
    };

    let mut layers = Vec::new();
    let mut input = feature_width;
    for (i, &width) in hidden_widths.iter().enumerate() {
        if bottleneck == Some(i) {
            layers.push(LayerDesc::Bottleneck {
                input,
                output: width,
            });
        } else {
            layers.push(LayerDesc::Dense {
                input,
                output: width,
                activation: config.activation_hidden,
                bias: !config.use_batch_norm,
                batch_norm: config.use_batch_norm,
            });
        }
        if config.dropout_rate > 0.0 {
            layers.push(LayerDesc::Dropout {
                rate: config.dropout_rate,
            });
        }
        input = width;
    }
    layers.push(LayerDesc::Dense {
        input,
        output: output_width,
        activation: output_activation,
        bias: true,
        batch_norm: false,
    });

    Ok((Network::Dense(spec.init(device)), layers))
}

#[allow(clippy::type_complexity)]
fn assemble_recurrent<B: Backend>(
    feature_width: usize,
    nodes: &[usize],
    output_width: usize,
    output_activation: Activation,
    config: &NetworkConfig,
    device: &B::Device,
) -> Result<(Network<B>, Vec<LayerDesc>, Option<usize>), BuildError> {
    if config.activation_hidden != Activation::Tanh {
        log::warn!(
            "tanh is recommended for recurrent hidden layers; the LSTM cell ignores {:?}",
            config.activation_hidden
        );
    }

    let fixed_batch = if config.stateful { config.batch_size } else { None };
    let spec = RecurrentSpec {
        feature_width,
        widths: nodes.to_vec(),
        output_width,
        output_activation,
        dropout_rate: config.dropout_rate,
        use_batch_norm: config.use_batch_norm,
        fixed_batch,
    };

    let mut layers = Vec::new();
    let mut input = feature_width;
    let last = nodes.len() - 1;
    for (i, &width) in nodes.iter().enumerate() {
        layers.push(LayerDesc::Lstm {
            input,
            hidden: width,
            return_sequences: i < last,
        });
        if i < last {
            if config.use_batch_norm {
                layers.push(LayerDesc::BatchNorm { features: width });
            }
            if config.dropout_rate > 0.0 {
                layers.push(LayerDesc::Dropout {
                    rate: config.dropout_rate,
                });
            }
        }
        input = width;
    }
    layers.push(LayerDesc::Dense {
        input,
        output: output_width,
        activation: output_activation,
        bias: true,
        batch_norm: false,
    });

    Ok((
        Network::Recurrent(spec.init(device)?),
        layers,
        fixed_batch,
    ))
}

fn assemble_convolutional<B: Backend>(
    rows: usize,
    cols: usize,
    channels: usize,
    output_width: usize,
    output_activation: Activation,
    config: &NetworkConfig,
    device: &B::Device,
) -> Result<(Network<B>, Vec<LayerDesc>), BuildError> {
    // the dense head doubles the dropout rate
    if config.dropout_rate * 2.0 >= 1.0 {
        return Err(BuildError::config(format!(
            "convolutional head doubles the dropout rate; {} would reach 1",
            config.dropout_rate
        )));
    }

    let spec = ConvSpec {
        rows,
        cols,
        channels,
        output_width,
        output_activation,
        dropout_rate: config.dropout_rate,
    };
    let flat_width = spec.flat_width()?;
    let hidden_width = spec.hidden_width();
    let network = spec.init(device)?;

    let mut layers = vec![
        LayerDesc::Conv2d {
            in_channels: channels,
            filters: BASE_FILTERS,
            kernel: KERNEL,
        },
        LayerDesc::Conv2d {
            in_channels: BASE_FILTERS,
            filters: BASE_FILTERS,
            kernel: KERNEL,
        },
        LayerDesc::MaxPool2d { pool: POOL },
    ];
    if config.dropout_rate > 0.0 {
        layers.push(LayerDesc::Dropout {
            rate: config.dropout_rate,
        });
    }
    layers.push(LayerDesc::Conv2d {
        in_channels: BASE_FILTERS,
        filters: BASE_FILTERS * 2,
        kernel: KERNEL,
    });
    layers.push(LayerDesc::Conv2d {
        in_channels: BASE_FILTERS * 2,
        filters: BASE_FILTERS * 2,
        kernel: KERNEL,
    });
    if config.dropout_rate > 0.0 {
        layers.push(LayerDesc::Dropout {
            rate: config.dropout_rate,
        });
    }
    layers.push(LayerDesc::Flatten { width: flat_width });
    layers.push(LayerDesc::Dense {
        input: flat_width,
        output: hidden_width,
        activation: Activation::Relu,
        bias: true,
        batch_norm: false,
    });
    if config.dropout_rate > 0.0 {
        layers.push(LayerDesc::Dropout {
            rate: config.dropout_rate * 2.0,
        });
    }
    layers.push(LayerDesc::Dense {
        input: hidden_width,
        output: output_width,
        activation: output_activation,
        bias: true,
        batch_norm: false,
    });

    Ok((Network::Convolutional(network), layers))
}
