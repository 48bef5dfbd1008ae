//! Optimizer selection.
//!
//! Burn optimizers take the learning rate at `step` time, so the decision is
//! recorded as plain parameters and initialized into a concrete optimizer
//! when training starts. This keeps the choice deterministic, cloneable and
//! serializable alongside the rest of the architecture summary.

use serde::Serialize;

use crate::network::Family;

/// A concrete optimizer decision, deterministic given the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerChoice {
    /// Adam with explicit betas and epsilon.
    Adam {
        learning_rate: f64,
        beta_1: f32,
        beta_2: f32,
        epsilon: f32,
    },
    /// Stochastic gradient descent with optional Nesterov momentum.
    Sgd {
        learning_rate: f64,
        momentum: f64,
        nesterov: bool,
    },
}

impl OptimizerChoice {
    /// Adam with the standard betas.
    pub fn adam(learning_rate: f64) -> Self {
        Self::Adam {
            learning_rate,
            beta_1: 0.9,
            beta_2: 0.999,
            epsilon: 1e-8,
        }
    }

    /// Plain or momentum SGD.
    pub fn sgd(learning_rate: f64, momentum: f64, nesterov: bool) -> Self {
        Self::Sgd {
            learning_rate,
            momentum,
            nesterov,
        }
    }

    /// Default choice when the configuration names neither an optimizer nor
    /// a learning rate. Fixed per family.
    pub fn default_for(family: Family) -> Self {
        match family {
            Family::Dense => Self::Adam {
                learning_rate: 0.005,
                beta_1: 0.9,
                beta_2: 0.990,
                epsilon: 1e-8,
            },
            Family::Recurrent => Self::Adam {
                learning_rate: 0.002,
                beta_1: 0.9,
                beta_2: 0.999,
                epsilon: 1e-8,
            },
            Family::Convolutional => Self::Sgd {
                learning_rate: 0.01,
                momentum: 0.0,
                nesterov: false,
            },
        }
    }

    /// Choice when only a learning rate is supplied: a momentum-based
    /// adaptive optimizer for the dense and recurrent families, Nesterov
    /// momentum SGD for the convolutional family.
    pub fn with_rate(family: Family, learning_rate: f64) -> Self {
        match family {
            Family::Dense | Family::Recurrent => Self::adam(learning_rate),
            Family::Convolutional => Self::sgd(learning_rate, 0.01, true),
        }
    }

    /// Resolution order: explicit choice, then learning rate, then the
    /// per-family default.
    pub fn resolve(
        explicit: Option<Self>,
        learning_rate: Option<f64>,
        family: Family,
    ) -> Self {
        explicit
            .or_else(|| learning_rate.map(|rate| Self::with_rate(family, rate)))
            .unwrap_or_else(|| Self::default_for(family))
    }

    /// The learning rate this choice steps with.
    pub fn learning_rate(&self) -> f64 {
        match self {
            Self::Adam { learning_rate, .. } | Self::Sgd { learning_rate, .. } => *learning_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_choice_wins() {
        let explicit = OptimizerChoice::sgd(0.5, 0.9, false);
        let resolved = OptimizerChoice::resolve(Some(explicit), Some(0.001), Family::Dense);
        assert_eq!(resolved, explicit);
    }

    #[test]
    fn test_learning_rate_selects_adaptive_optimizer() {
        let resolved = OptimizerChoice::resolve(None, Some(0.01), Family::Dense);
        assert_eq!(resolved, OptimizerChoice::adam(0.01));

        let resolved = OptimizerChoice::resolve(None, Some(0.01), Family::Convolutional);
        assert_eq!(resolved, OptimizerChoice::sgd(0.01, 0.01, true));
    }

    #[test]
    fn test_family_defaults_are_deterministic() {
        for family in [Family::Dense, Family::Recurrent, Family::Convolutional] {
            assert_eq!(
                OptimizerChoice::resolve(None, None, family),
                OptimizerChoice::default_for(family)
            );
        }
        assert_eq!(
            OptimizerChoice::default_for(Family::Convolutional).learning_rate(),
            0.01
        );
    }
}
