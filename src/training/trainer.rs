//! Training loop shared by the three architecture families.

use burn::optim::momentum::MomentumConfig;
use burn::optim::{AdamConfig, GradientsParams, Optimizer, SgdConfig};
use burn::tensor::{ElementConversion, Tensor, backend::AutodiffBackend};

use super::{Loss, Metric, OptimizerChoice, TrainingConfig};
use crate::errors::BuildError;
use crate::network::Network;
use crate::shape::FeatureBatch;

/// Loss (and optional metric) trajectory over the epochs of one `fit` call.
#[derive(Debug, Clone, Default)]
pub struct TrainingHistory {
    /// Loss value per epoch.
    pub loss: Vec<f32>,
    /// Auxiliary metric per epoch; empty when the model carries no metric.
    pub metric: Vec<f32>,
}

/// Result of training: the updated network plus its history.
#[derive(Debug)]
pub struct TrainingOutcome<B: AutodiffBackend> {
    pub network: Network<B>,
    pub history: TrainingHistory,
}

/// Runs the full-batch training loop with the resolved optimizer choice.
pub fn train<B: AutodiffBackend>(
    network: Network<B>,
    inputs: FeatureBatch<B>,
    targets: Tensor<B, 2>,
    loss: Loss,
    metric: Option<Metric>,
    optimizer: OptimizerChoice,
    config: &TrainingConfig,
) -> Result<TrainingOutcome<B>, BuildError> {
    let learning_rate = optimizer.learning_rate();
    match optimizer {
        OptimizerChoice::Adam {
            beta_1,
            beta_2,
            epsilon,
            ..
        } => {
            let optim = AdamConfig::new()
                .with_beta_1(beta_1)
                .with_beta_2(beta_2)
                .with_epsilon(epsilon)
                .init();
            run_epochs(
                network,
                optim,
                learning_rate,
                inputs,
                targets,
                loss,
                metric,
                config,
            )
        }
        OptimizerChoice::Sgd {
            momentum, nesterov, ..
        } => {
            let momentum = (momentum > 0.0).then(|| {
                MomentumConfig::new()
                    .with_momentum(momentum)
                    .with_nesterov(nesterov)
            });
            let optim = SgdConfig::new().with_momentum(momentum).init();
            run_epochs(
                network,
                optim,
                learning_rate,
                inputs,
                targets,
                loss,
                metric,
                config,
            )
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_epochs<B, O>(
    mut network: Network<B>,
    mut optimizer: O,
    learning_rate: f64,
    inputs: FeatureBatch<B>,
    targets: Tensor<B, 2>,
    loss: Loss,
    metric: Option<Metric>,
    config: &TrainingConfig,
) -> Result<TrainingOutcome<B>, BuildError>
where
    B: AutodiffBackend,
    O: Optimizer<Network<B>, B>,
{
    let mut history = TrainingHistory::default();

    for epoch in 0..config.epochs {
        let predictions = network.forward(inputs.clone())?;

        if let Some(metric) = metric {
            history
                .metric
                .push(metric.compute(predictions.clone(), targets.clone()));
        }

        let loss_tensor = loss.compute(predictions, targets.clone());
        let loss_value: f32 = loss_tensor.clone().into_scalar().elem();
        history.loss.push(loss_value);

        if config.verbose && (epoch % 10 == 0 || epoch == config.epochs - 1) {
            log::info!(
                "Epoch {}/{}: loss = {:.6}",
                epoch + 1,
                config.epochs,
                loss_value
            );
        }

        let grads = loss_tensor.backward();
        let grads = GradientsParams::from_grads(grads, &network);
        network = optimizer.step(learning_rate, network, grads);
    }

    Ok(TrainingOutcome { network, history })
}
