//! Training loop configuration.
//!
//! Loss and optimizer are fixed at assembly time; this only controls the
//! epoch loop itself.

/// Configuration for a `fit` call.
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Number of training epochs.
    pub epochs: usize,
    /// Whether to log progress during training.
    pub verbose: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            verbose: true,
        }
    }
}

impl TrainingConfig {
    /// Creates a new TrainingConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of epochs.
    pub fn epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Sets whether to log progress.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrainingConfig::default();
        assert_eq!(config.epochs, 100);
        assert!(config.verbose);
    }

    #[test]
    fn test_config_builder() {
        let config = TrainingConfig::new().epochs(50).verbose(false);
        assert_eq!(config.epochs, 50);
        assert!(!config.verbose);
    }
}
