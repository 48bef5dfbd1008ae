//! Building blocks shared by the three architecture families.

pub mod activation;
pub mod dense;

pub use activation::Activation;
pub use dense::{Dense, DenseConfig};
