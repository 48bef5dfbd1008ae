//! Training utilities: loss functions, metrics, optimizer selection and the
//! epoch loop shared by all three architecture families.

mod config;
mod loss;
mod optimizer;
mod trainer;

pub use config::TrainingConfig;
pub use loss::{Loss, Metric};
pub use optimizer::OptimizerChoice;
pub use trainer::{TrainingHistory, TrainingOutcome, train};
