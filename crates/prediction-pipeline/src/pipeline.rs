use crate::validate::{validate, PredictRequest};
use carbonation_core::{EngineError, PredictionResult, Reliability};
use model_registry::ModelRegistry;
use std::sync::Arc;
use uncertainty_engine::{IntervalConstructor, UncertaintyDecomposer};

/// The per-request decision pipeline
///
/// Holds the shared read-only registry plus the stateless uncertainty
/// stages; `run` is pure computation and safe to call from any number of
/// threads concurrently.
pub struct PredictionPipeline {
    registry: Arc<ModelRegistry>,
    decomposer: UncertaintyDecomposer,
    intervals: IntervalConstructor,
}

impl PredictionPipeline {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            registry,
            decomposer: UncertaintyDecomposer::default(),
            intervals: IntervalConstructor,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Validate → select model → predict → decompose uncertainty →
    /// construct interval → classify reliability. Fails fast at the first
    /// offending stage; no stage is retried.
    pub fn run(&self, request: &PredictRequest) -> Result<PredictionResult, EngineError> {
        let validated = validate(request)?;
        let entry = self.registry.lookup(&validated.model)?;

        let prediction = entry.model().predict(&validated.inputs)?;
        tracing::debug!(model = %entry.id, prediction, "point estimate");

        let breakdown = self.decomposer.decompose(
            &validated.inputs,
            entry.model(),
            &entry.metadata,
            prediction,
        )?;

        let interval = self.intervals.construct(
            prediction,
            breakdown.final_uncertainty / 100.0,
            validated.confidence_level,
        )?;

        let reliability = Reliability::from_uncertainty(breakdown.final_uncertainty / 100.0);

        tracing::info!(
            model = %entry.id,
            prediction,
            relative_uncertainty = interval.relative_uncertainty,
            reliability = reliability.as_str(),
            "prediction complete"
        );

        Ok(PredictionResult {
            prediction,
            relative_uncertainty: interval.relative_uncertainty,
            lower_bound: interval.lower_bound,
            upper_bound: interval.upper_bound,
            interval_width: interval.interval_width,
            confidence_level: validated.confidence_level,
            model: entry.id,
            method: interval.method,
            performance: entry.performance(),
            breakdown,
            reliability,
        })
    }
}
