//! Error types for network assembly and training.

mod build_error;

pub use build_error::BuildError;
