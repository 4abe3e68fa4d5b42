//! Fitted-model registry for the carbonation prediction engine
//!
//! Holds one entry per model family (calibrated kernel + validated
//! performance metadata). Loaded once at process start, read-only afterwards,
//! safe to share across concurrent requests without locking.

pub mod kernel;
pub mod registry;

pub use kernel::{KernelCoefficients, KernelModel};
pub use registry::{ModelEntry, ModelRegistry, RegistryArtifact};
