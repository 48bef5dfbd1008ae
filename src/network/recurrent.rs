//! Recurrent (LSTM) network family.

use burn::module::Module;
use burn::nn::{
    BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Lstm, LstmConfig, LstmState,
};
use burn::tensor::{Tensor, backend::Backend};

use crate::errors::BuildError;
use crate::layers::{Activation, Dense, DenseConfig};

/// Everything the recurrent family needs, already resolved by the
/// translator.
#[derive(Debug, Clone)]
pub struct RecurrentSpec {
    pub feature_width: usize,
    /// One width per recurrent layer (`layers` entries, at least one).
    pub widths: Vec<usize>,
    pub output_width: usize,
    pub output_activation: Activation,
    pub dropout_rate: f64,
    pub use_batch_norm: bool,
    /// Fixed batch size for stateful operation.
    pub fixed_batch: Option<usize>,
}

impl RecurrentSpec {
    /// Initializes the network with the given device.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<RecurrentNetwork<B>, BuildError> {
        let (&collapse_width, hidden_widths) = self
            .widths
            .split_last()
            .ok_or_else(|| BuildError::config("recurrent network needs at least one layer"))?;

        let mut hidden = Vec::with_capacity(hidden_widths.len());
        let mut norms = Vec::new();
        let mut input = self.feature_width;
        for &width in hidden_widths {
            hidden.push(LstmConfig::new(input, width, true).init(device));
            if self.use_batch_norm {
                norms.push(BatchNormConfig::new(width).init(device));
            }
            input = width;
        }

        let collapse = LstmConfig::new(input, collapse_width, true).init(device);
        let dropout = (self.dropout_rate > 0.0).then(|| DropoutConfig::new(self.dropout_rate).init());
        let output = DenseConfig::new(collapse_width, self.output_width)
            .with_activation(self.output_activation)
            .init(device);

        Ok(RecurrentNetwork {
            hidden,
            norms,
            dropout,
            collapse,
            output,
            feature_width: self.feature_width,
            fixed_batch: self.fixed_batch.unwrap_or(0),
        })
    }
}

/// Stacked LSTM network.
///
/// Every layer but the last feeds its full output sequence onward so the
/// next recurrent layer still sees a sequence; the last layer collapses to
/// the final timestep vector before the dense output transform.
#[derive(Module, Debug)]
pub struct RecurrentNetwork<B: Backend> {
    hidden: Vec<Lstm<B>>,
    norms: Vec<BatchNorm<B, 1>>,
    dropout: Option<Dropout>,
    collapse: Lstm<B>,
    output: Dense<B>,
    feature_width: usize,
    /// Fixed batch size for stateful operation; 0 when not stateful.
    fixed_batch: usize,
}

impl<B: Backend> RecurrentNetwork<B> {
    /// Forward pass with fresh cell state.
    pub fn forward(&self, input: Tensor<B, 3>) -> Result<Tensor<B, 2>, BuildError> {
        let (output, _) = self.forward_with_state(input, None)?;
        Ok(output)
    }

    /// Forward pass threading cell state across calls.
    ///
    /// Stateful callers hold the returned states and pass them back with the
    /// next batch. Every batch presented to a stateful network must have the
    /// batch size fixed at assembly time.
    pub fn forward_with_state(
        &self,
        input: Tensor<B, 3>,
        states: Option<Vec<LstmState<B, 2>>>,
    ) -> Result<(Tensor<B, 2>, Vec<LstmState<B, 2>>), BuildError> {
        let [batch, _, features] = input.dims();
        if features != self.feature_width {
            return Err(BuildError::ShapeMismatch {
                expected: format!("{} input features", self.feature_width),
                actual: format!("{features} input features"),
            });
        }
        if self.fixed_batch != 0 && batch != self.fixed_batch {
            return Err(BuildError::ShapeMismatch {
                expected: format!("fixed batch size {}", self.fixed_batch),
                actual: format!("batch size {batch}"),
            });
        }

        let num_layers = self.hidden.len() + 1;
        let mut incoming: Vec<Option<LstmState<B, 2>>> = match states {
            Some(states) if states.len() == num_layers => {
                states.into_iter().map(Some).collect()
            }
            Some(states) => {
                return Err(BuildError::ShapeMismatch {
                    expected: format!("{num_layers} layer states"),
                    actual: format!("{} layer states", states.len()),
                });
            }
            None => std::iter::repeat_with(|| None).take(num_layers).collect(),
        };

        let mut outgoing = Vec::with_capacity(num_layers);
        let mut sequence = input;
        for (i, cell) in self.hidden.iter().enumerate() {
            let (mut out, state) = cell.forward(sequence, incoming[i].take());
            outgoing.push(state);
            if let Some(norm) = self.norms.get(i) {
                // normalize over the feature axis: [batch, steps, h] -> [batch, h, steps]
                out = norm.forward(out.swap_dims(1, 2)).swap_dims(1, 2);
            }
            if let Some(dropout) = &self.dropout {
                out = dropout.forward(out);
            }
            sequence = out;
        }

        let (out, state) = self
            .collapse
            .forward(sequence, incoming[self.hidden.len()].take());
        outgoing.push(state);

        let [batch, steps, width] = out.dims();
        let last = out.narrow(1, steps - 1, 1).reshape([batch, width]);

        Ok((self.output.forward(last), outgoing))
    }

    /// Total number of recurrent layers, including the collapsing one.
    pub fn num_recurrent_layers(&self) -> usize {
        self.hidden.len() + 1
    }

    /// Width of the output layer.
    pub fn output_width(&self) -> usize {
        self.output.output_size()
    }

    /// Whether every batch must have the fixed assembly-time size.
    pub fn is_stateful(&self) -> bool {
        self.fixed_batch != 0
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

    fn spec(widths: Vec<usize>, fixed_batch: Option<usize>) -> RecurrentSpec {
        RecurrentSpec {
            feature_width: 5,
            widths,
            output_width: 1,
            output_activation: Activation::Sigmoid,
            dropout_rate: 0.0,
            use_batch_norm: false,
            fixed_batch,
        }
    }

    #[test]
    fn test_forward_collapses_sequence() {
        let net = spec(vec![8, 8, 8], None)
            .init::<TestBackend>(&device())
            .unwrap();

        assert_eq!(net.num_recurrent_layers(), 3);
        let input = Tensor::<TestBackend, 3>::zeros([2, 6, 5], &device());
        let output = net.forward(input).unwrap();
        assert_eq!(output.dims(), [2, 1]);
    }

    #[test]
    fn test_stateful_batch_enforced() {
        let net = spec(vec![4], Some(3)).init::<TestBackend>(&device()).unwrap();
        assert!(net.is_stateful());

        let ok = Tensor::<TestBackend, 3>::zeros([3, 6, 5], &device());
        assert!(net.forward(ok).is_ok());

        let wrong = Tensor::<TestBackend, 3>::zeros([2, 6, 5], &device());
        assert!(matches!(
            net.forward(wrong),
            Err(BuildError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_feature_width_enforced() {
        let net = spec(vec![4], None).init::<TestBackend>(&device()).unwrap();
        let wrong = Tensor::<TestBackend, 3>::zeros([2, 6, 7], &device());
        assert!(matches!(
            net.forward(wrong),
            Err(BuildError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_state_threads_across_calls() {
        let net = spec(vec![4, 4], Some(2))
            .init::<TestBackend>(&device())
            .unwrap();

        let batch = Tensor::<TestBackend, 3>::ones([2, 3, 5], &device());
        let (_, states) = net.forward_with_state(batch.clone(), None).unwrap();
        assert_eq!(states.len(), 2);

        // feeding the states back must be accepted and produce new states
        let (output, states) = net.forward_with_state(batch, Some(states)).unwrap();
        assert_eq!(output.dims(), [2, 1]);
        assert_eq!(states.len(), 2);
    }

    #[test]
    fn test_state_count_mismatch_rejected() {
        let net = spec(vec![4, 4], None).init::<TestBackend>(&device()).unwrap();
        let batch = Tensor::<TestBackend, 3>::ones([2, 3, 5], &device());
        let (_, mut states) = net.forward_with_state(batch.clone(), None).unwrap();
        states.pop();

        assert!(matches!(
            net.forward_with_state(batch, Some(states)),
            Err(BuildError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_widths_rejected() {
        let result = spec(vec![], None).init::<TestBackend>(&device());
        assert!(matches!(result, Err(BuildError::Config { .. })));
    }
}
