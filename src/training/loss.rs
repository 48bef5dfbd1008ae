//! Loss functions and evaluation metrics.

use burn::tensor::{ElementConversion, Tensor, backend::Backend};
use serde::Serialize;

/// Numerical stability floor for the cross-entropy logs.
const EPSILON: f32 = 1e-7;

/// Supported loss functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Loss {
    /// Mean Squared Error loss.
    Mse,
    /// Binary Cross Entropy loss.
    BinaryCrossEntropy,
    /// Categorical Cross Entropy loss over one-hot targets.
    CategoricalCrossEntropy,
}

impl Loss {
    /// Computes the scalar loss between predictions and targets.
    pub fn compute<B: Backend>(
        &self,
        predictions: Tensor<B, 2>,
        targets: Tensor<B, 2>,
    ) -> Tensor<B, 1> {
        match self {
            Loss::Mse => {
                let diff = predictions - targets;
                let squared = diff.clone() * diff;
                squared.mean()
            }
            Loss::BinaryCrossEntropy => {
                // BCE = -mean(y * log(p) + (1-y) * log(1-p))
                let ones = Tensor::ones_like(&predictions);
                let p_clipped = predictions.clamp(EPSILON, 1.0 - EPSILON);
                let log_p = p_clipped.clone().log();
                let log_1_minus_p = (ones.clone() - p_clipped).log();
                let bce = targets.clone() * log_p + (ones - targets) * log_1_minus_p;
                bce.neg().mean()
            }
            Loss::CategoricalCrossEntropy => {
                // CCE = -mean over samples of sum(y * log(p))
                let p_clipped = predictions.clamp(EPSILON, 1.0);
                (targets * p_clipped.log()).sum_dim(1).neg().mean()
            }
        }
    }
}

/// Auxiliary evaluation metric reported next to the loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Coefficient of determination `1 - SS_res / SS_tot`.
    ///
    /// Deliberately carries no epsilon guard: a constant target has zero
    /// `SS_tot` and yields a non-finite score, which callers should read as
    /// "degenerate target" rather than a value to silence.
    RSquared,
    /// Fraction of samples whose predicted class matches the target (argmax,
    /// or a 0.5 threshold for single-column outputs).
    Accuracy,
}

impl Metric {
    /// Computes the metric over a batch of predictions.
    pub fn compute<B: Backend>(&self, predictions: Tensor<B, 2>, targets: Tensor<B, 2>) -> f32 {
        match self {
            Metric::RSquared => {
                let mean = targets.clone().mean().reshape([1, 1]);
                let ss_res: f32 = (targets.clone() - predictions)
                    .powf_scalar(2.0)
                    .sum()
                    .into_scalar()
                    .elem();
                let ss_tot: f32 = (targets - mean).powf_scalar(2.0).sum().into_scalar().elem();
                1.0 - ss_res / ss_tot
            }
            Metric::Accuracy => {
                let [_, width] = predictions.dims();
                let agreement = if width == 1 {
                    predictions
                        .greater_elem(0.5)
                        .equal(targets.greater_elem(0.5))
                } else {
                    predictions.argmax(1).equal(targets.argmax(1))
                };
                agreement.float().mean().into_scalar().elem()
            }
        }
    }
}
