//! Declarative network configuration.

use crate::errors::BuildError;
use crate::layers::Activation;
use crate::training::OptimizerChoice;

/// Every option the translator recognizes, typed and defaulted.
///
/// Validation runs once, before any layer is constructed; assembly can then
/// rely on the invariants without re-checking them at every branch.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Number of layers before the final output transform.
    pub layers: usize,
    /// Hidden widths, one per layer; empty means "match the feature width".
    /// A single entry is broadcast and right-padded with its last value.
    pub nodes: Vec<usize>,
    /// Activation for hidden blocks.
    pub activation_hidden: Activation,
    /// Output activation override; ignored for boolean and categorical
    /// targets, whose loss selection fixes the activation.
    pub activation_output: Option<Activation>,
    /// Dropout fraction in `[0, 1)` applied after each hidden block;
    /// 0 disables dropout.
    pub dropout_rate: f64,
    /// Insert batch normalization after each hidden affine transform; the
    /// transform then drops its bias term.
    pub use_batch_norm: bool,
    /// Learning rate; absence selects the per-family default optimizer.
    pub learning_rate: Option<f64>,
    /// Recurrent only: carry cell state across batches of one fixed size.
    pub stateful: bool,
    /// Fixed batch size; required when `stateful` is set.
    pub batch_size: Option<usize>,
    /// Treat the target as one-hot encoded regardless of its declared kind.
    pub one_hot_output: bool,
    /// Dense only: render the narrowest hidden layer as a linear no-bias
    /// bottleneck.
    pub autoencoder: bool,
    /// Explicit optimizer; used verbatim when supplied.
    pub optimizer: Option<OptimizerChoice>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            layers: 1,
            nodes: Vec::new(),
            activation_hidden: Activation::Tanh,
            activation_output: None,
            dropout_rate: 0.0,
            use_batch_norm: false,
            learning_rate: None,
            stateful: false,
            batch_size: None,
            one_hot_output: false,
            autoencoder: false,
            optimizer: None,
        }
    }
}

impl NetworkConfig {
    /// Creates a new NetworkConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of non-output layers.
    pub fn layers(mut self, layers: usize) -> Self {
        self.layers = layers;
        self
    }

    /// Sets the per-layer hidden widths.
    pub fn nodes(mut self, nodes: Vec<usize>) -> Self {
        self.nodes = nodes;
        self
    }

    /// Broadcasts a single width across all layers.
    pub fn node_width(mut self, width: usize) -> Self {
        self.nodes = vec![width];
        self
    }

    /// Sets the hidden activation.
    pub fn activation_hidden(mut self, activation: Activation) -> Self {
        self.activation_hidden = activation;
        self
    }

    /// Overrides the output activation for regression targets.
    pub fn activation_output(mut self, activation: Activation) -> Self {
        self.activation_output = Some(activation);
        self
    }

    /// Sets the dropout rate.
    pub fn dropout_rate(mut self, rate: f64) -> Self {
        self.dropout_rate = rate;
        self
    }

    /// Enables batch normalization on hidden blocks.
    pub fn use_batch_norm(mut self, enabled: bool) -> Self {
        self.use_batch_norm = enabled;
        self
    }

    /// Sets the learning rate.
    pub fn learning_rate(mut self, rate: f64) -> Self {
        self.learning_rate = Some(rate);
        self
    }

    /// Marks the model stateful with the fixed batch size every batch must
    /// then have.
    pub fn stateful(mut self, batch_size: usize) -> Self {
        self.stateful = true;
        self.batch_size = Some(batch_size);
        self
    }

    /// Declares the target one-hot encoded.
    pub fn one_hot_output(mut self, enabled: bool) -> Self {
        self.one_hot_output = enabled;
        self
    }

    /// Marks the architecture autoencoder-style (dense bottleneck).
    pub fn autoencoder(mut self, enabled: bool) -> Self {
        self.autoencoder = enabled;
        self
    }

    /// Supplies an explicit optimizer, bypassing the default selection.
    pub fn optimizer(mut self, choice: OptimizerChoice) -> Self {
        self.optimizer = Some(choice);
        self
    }

    /// Checks every invariant the assembly step relies on.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.layers < 1 {
            return Err(BuildError::config("`layers` must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.dropout_rate) {
            return Err(BuildError::config(format!(
                "`dropout_rate` must be in [0, 1), got {}",
                self.dropout_rate
            )));
        }
        if let Some(rate) = self.learning_rate {
            if rate <= 0.0 || !rate.is_finite() {
                return Err(BuildError::config(format!(
                    "`learning_rate` must be a positive finite number, got {rate}"
                )));
            }
        }
        if self.stateful {
            match self.batch_size {
                Some(batch) if batch > 0 => {}
                _ => {
                    return Err(BuildError::config(
                        "stateful models require a positive fixed `batch_size`",
                    ));
                }
            }
        }
        // nodes == [0] is the "match feature width" marker; any other zero
        // width is an error
        if self.nodes.len() > 1 && self.nodes.contains(&0) {
            return Err(BuildError::config("`nodes` entries must be positive"));
        }
        Ok(())
    }
}
