//! Uncertainty quantification for carbonation predictions
//!
//! Decomposes a prediction's uncertainty into three independent
//! contributions (model correction, experimental stability, environmental
//! extrapolation) and turns the combined relative uncertainty into a bounded
//! interval at the requested confidence level.

pub mod decompose;
pub mod interval;

pub use decompose::{DecomposerWeights, UncertaintyDecomposer};
pub use interval::{IntervalConstructor, PredictionInterval};
