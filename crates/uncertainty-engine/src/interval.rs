//! Interval construction
//!
//! Jackknife+-style bounds: the margin scales with the relative uncertainty
//! and with the standard-normal quantile of the requested confidence level,
//! so higher confidence always widens the interval.

use carbonation_core::{EngineError, IntervalMethod};
use statrs::distribution::{ContinuousCDF, Normal};

/// A bounded prediction interval and its derived quantities
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionInterval {
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub interval_width: f64,
    /// Interval width as a percentage of the point prediction
    pub relative_uncertainty: f64,
    pub confidence_level: f64,
    pub method: IntervalMethod,
}

/// Turns point estimate + uncertainty fraction + confidence level into
/// bounds. Physical depths cannot be negative, so the lower bound is floored
/// at zero; the floor never rises above the point estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalConstructor;

impl IntervalConstructor {
    /// Construct the interval for `prediction` given the decomposed
    /// `uncertainty_fraction` (e.g. 0.165 for 16.5 %).
    pub fn construct(
        &self,
        prediction: f64,
        uncertainty_fraction: f64,
        confidence_level: f64,
    ) -> Result<PredictionInterval, EngineError> {
        if !prediction.is_finite() || prediction <= 0.0 {
            return Err(EngineError::NumericDegeneracy(format!(
                "cannot bound a non-positive point estimate ({prediction})"
            )));
        }
        if !(confidence_level > 0.0 && confidence_level < 1.0) {
            return Err(EngineError::NumericDegeneracy(format!(
                "confidence level {confidence_level} outside (0, 1)"
            )));
        }

        let z = standard_normal_quantile((1.0 + confidence_level) / 2.0)?;
        let margin = z * prediction * uncertainty_fraction;

        let lower_bound = (prediction - margin).max(0.0);
        let upper_bound = prediction + margin;
        let interval_width = upper_bound - lower_bound;

        Ok(PredictionInterval {
            lower_bound,
            upper_bound,
            interval_width,
            relative_uncertainty: interval_width / prediction * 100.0,
            confidence_level,
            method: IntervalMethod::JackknifePlus,
        })
    }
}

fn standard_normal_quantile(p: f64) -> Result<f64, EngineError> {
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| EngineError::NumericDegeneracy(format!("standard normal: {e}")))?;
    let z = normal.inverse_cdf(p);
    if !z.is_finite() {
        return Err(EngineError::NumericDegeneracy(format!(
            "quantile at p={p} is not finite"
        )));
    }
    Ok(z)
}
