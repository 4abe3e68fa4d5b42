//! Wire response contract
//!
//! The engine returns raw `PredictionResult` values; rounding to the
//! documented precision (depths 2 dp, percentages 1 dp, factors 2 dp,
//! r² 3 dp) happens only here, at the presentation edge.

use carbonation_core::{EngineError, IntervalMethod, ModelId, PredictionResult};
use serde::{Deserialize, Serialize};

/// Successful response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictSuccess {
    pub success: bool,
    pub prediction: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub confidence_level: f64,
    pub model: ModelId,
    pub method: IntervalMethod,
    pub interval_width: f64,
    pub relative_uncertainty: f64,
    pub ml_analysis: MlAnalysis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlAnalysis {
    pub ml_performance: WirePerformance,
    pub uncertainty_breakdown: WireBreakdown,
    pub prediction_reliability: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WirePerformance {
    pub selected_model: ModelId,
    pub expected_r2: f64,
    pub model_rmse: f64,
    pub uncertainty_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireBreakdown {
    pub final_uncertainty: f64,
    pub model_correction: f64,
    pub experimental_stability: f64,
    pub environmental_factor: f64,
}

/// Failure envelope; the transport maps client-error kinds to 4xx and the
/// rest to 5xx
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictFailure {
    pub success: bool,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictResponse {
    Success(PredictSuccess),
    Failure(PredictFailure),
}

impl PredictResponse {
    pub fn from_result(result: &PredictionResult) -> Self {
        PredictResponse::Success(PredictSuccess {
            success: true,
            prediction: round2(result.prediction),
            lower_bound: round2(result.lower_bound),
            upper_bound: round2(result.upper_bound),
            confidence_level: result.confidence_level,
            model: result.model,
            method: result.method,
            interval_width: round2(result.interval_width),
            relative_uncertainty: round1(result.relative_uncertainty),
            ml_analysis: MlAnalysis {
                ml_performance: WirePerformance {
                    selected_model: result.performance.selected_model,
                    expected_r2: round3(result.performance.expected_r2),
                    model_rmse: result.performance.model_rmse,
                    uncertainty_factor: round2(result.performance.uncertainty_factor),
                },
                uncertainty_breakdown: WireBreakdown {
                    final_uncertainty: round1(result.breakdown.final_uncertainty),
                    model_correction: round2(result.breakdown.model_correction),
                    experimental_stability: round2(result.breakdown.experimental_stability),
                    environmental_factor: round2(result.breakdown.environmental_factor),
                },
                prediction_reliability: result.reliability.label().to_string(),
            },
        })
    }

    pub fn from_error(error: &EngineError) -> Self {
        PredictResponse::Failure(PredictFailure {
            success: false,
            error: error.to_string(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PredictResponse::Success(_))
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
