use crate::{CarbonationInputs, EngineError};

/// Capability of a fitted model artifact: 13 inputs in, one depth out.
///
/// Implementations must be pure and deterministic - identical inputs always
/// yield the identical estimate, with no state carried between calls. The
/// uncertainty decomposer re-invokes the same handle for its perturbation
/// probes, so anything stateful would corrupt the breakdown.
pub trait CarbonationModel: Send + Sync {
    /// Point estimate of carbonation depth in mm
    fn predict(&self, inputs: &CarbonationInputs) -> Result<f64, EngineError>;
}
