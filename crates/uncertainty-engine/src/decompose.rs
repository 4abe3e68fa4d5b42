//! Uncertainty decomposition
//!
//! Combines three independent contributions into one relative uncertainty:
//! a model correction taken from the selected family's validation metadata,
//! an experimental-stability term from finite-difference probing of the
//! mix-design fields, and an environmental term penalizing inputs far from
//! the training distribution. The multiplicative anchor is a mix-quality
//! baseline scored from the water/binder ratio, fly-ash fraction, recycled
//! aggregate replacement and compressive strength.

use carbonation_core::{
    CarbonationInputs, CarbonationModel, EngineError, MixFactors, MixField, ModelMetadata,
    UncertaintyBreakdown,
};
use serde::{Deserialize, Serialize};

/// Training-distribution reference for one environmental field
struct EnvReference {
    field: &'static str,
    center: f64,
    scale: f64,
}

/// Centers and scales of the four environmental fields in the training set.
/// Temperature and humidity are anchored at the 20 °C / 65 % reference test
/// condition; concentration and exposure use the training mean and spread.
const ENV_REFERENCES: [EnvReference; 4] = [
    EnvReference {
        field: "carbon_concentration",
        center: 8.19,
        scale: 6.7,
    },
    EnvReference {
        field: "exposure_time",
        center: 147.91,
        scale: 285.7,
    },
    EnvReference {
        field: "temperature",
        center: 20.0,
        scale: 4.2,
    },
    EnvReference {
        field: "relative_humidity",
        center: 65.0,
        scale: 12.8,
    },
];

/// Quality-score cutoffs and the baseline uncertainty fraction of each tier,
/// from hold-out validation of the model families per mix-quality band
const QUALITY_TIERS: [(f64, f64); 3] = [(0.95, 0.068), (0.85, 0.103), (0.70, 0.137)];
const BASELINE_FALLBACK: f64 = 0.180;

/// Point estimates below this are too small to carry a relative uncertainty
const MIN_PREDICTION: f64 = 1e-6;

/// Named constants of the aggregation formula
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecomposerWeights {
    /// Relative bump applied per mix-design field when probing
    pub probe_relative_step: f64,
    /// Absolute bump for fields sitting at zero
    pub probe_min_step: f64,
    /// Stability multiplier for a perfectly insensitive estimate
    pub stability_floor: f64,
    /// Stability gained per unit mean relative sensitivity
    pub stability_gain: f64,
    pub stability_cap: f64,
    /// Penalty per unit normalized environmental deviation
    pub env_weight: f64,
    pub env_cap: f64,
    /// Clamp on the combined uncertainty fraction
    pub min_uncertainty: f64,
    pub max_uncertainty: f64,
}

impl Default for DecomposerWeights {
    fn default() -> Self {
        Self {
            probe_relative_step: 0.01,
            probe_min_step: 0.01,
            stability_floor: 0.90,
            stability_gain: 4.0,
            stability_cap: 1.25,
            env_weight: 0.01,
            env_cap: 1.50,
            min_uncertainty: 0.05,
            max_uncertainty: 0.50,
        }
    }
}

/// Pure decomposition of a prediction's relative uncertainty
#[derive(Debug, Clone, Copy)]
pub struct UncertaintyDecomposer {
    weights: DecomposerWeights,
}

impl Default for UncertaintyDecomposer {
    fn default() -> Self {
        Self::new(DecomposerWeights::default())
    }
}

impl UncertaintyDecomposer {
    pub fn new(weights: DecomposerWeights) -> Self {
        Self { weights }
    }

    /// Decompose the uncertainty of `prediction` for `inputs` under the
    /// selected model. Deterministic, no side effects; a near-zero or
    /// non-finite point estimate fails with `NumericDegeneracy` before any
    /// division.
    pub fn decompose(
        &self,
        inputs: &CarbonationInputs,
        model: &dyn CarbonationModel,
        metadata: &ModelMetadata,
        prediction: f64,
    ) -> Result<UncertaintyBreakdown, EngineError> {
        if !prediction.is_finite() || prediction.abs() < MIN_PREDICTION {
            return Err(EngineError::NumericDegeneracy(format!(
                "point estimate {prediction} cannot anchor a relative uncertainty"
            )));
        }

        let baseline = baseline_uncertainty(inputs);
        let model_correction = metadata.uncertainty_factor;
        let experimental_stability = self.experimental_stability(inputs, model, prediction)?;
        let environmental_factor = self.environmental_factor(inputs);

        let combined = baseline * model_correction * experimental_stability * environmental_factor;
        let final_fraction = combined.clamp(self.weights.min_uncertainty, self.weights.max_uncertainty);

        tracing::debug!(
            baseline,
            model_correction,
            experimental_stability,
            environmental_factor,
            final_fraction,
            "uncertainty decomposed"
        );

        Ok(UncertaintyBreakdown {
            model_correction,
            experimental_stability,
            environmental_factor,
            final_uncertainty: final_fraction * 100.0,
        })
    }

    /// Sensitivity of the point estimate to small perturbations of the
    /// mix-design fields: each field is bumped by 1 % and the mean relative
    /// change of the estimate is mapped to a stability multiplier. A twitchy
    /// estimate earns a larger multiplier.
    fn experimental_stability(
        &self,
        inputs: &CarbonationInputs,
        model: &dyn CarbonationModel,
        prediction: f64,
    ) -> Result<f64, EngineError> {
        let w = &self.weights;
        let mut total = 0.0;
        for field in MixField::ALL {
            let value = field.get(inputs);
            let step = if value.abs() < f64::EPSILON {
                w.probe_min_step
            } else {
                value * w.probe_relative_step
            };
            let probed = model.predict(&field.with(inputs, value + step))?;
            total += ((probed - prediction) / prediction).abs();
        }
        let mean_sensitivity = total / MixField::ALL.len() as f64;

        Ok((w.stability_floor + w.stability_gain * mean_sensitivity)
            .clamp(w.stability_floor, w.stability_cap))
    }

    /// Extrapolation penalty: normalized distance of the environmental
    /// fields from the training distribution's reference values. Inputs at
    /// the reference point contribute nothing.
    fn environmental_factor(&self, inputs: &CarbonationInputs) -> f64 {
        let deviation: f64 = ENV_REFERENCES
            .iter()
            .map(|r| {
                let value = match r.field {
                    "carbon_concentration" => inputs.carbon_concentration,
                    "exposure_time" => inputs.exposure_time,
                    "temperature" => inputs.temperature,
                    _ => inputs.relative_humidity,
                };
                (value - r.center).abs() / r.scale
            })
            .sum();

        (1.0 + self.weights.env_weight * deviation).clamp(1.0, self.weights.env_cap)
    }
}

/// 0-1 mix-design quality score and its baseline uncertainty tier
fn baseline_uncertainty(inputs: &CarbonationInputs) -> f64 {
    let mix = MixFactors::from_inputs(inputs);

    let w_c_score = ((0.6 - mix.w_c_ratio) / 0.3).clamp(0.0, 1.0);

    let fa_score = if (0.15..=0.30).contains(&mix.fa_ratio) {
        1.0
    } else if mix.fa_ratio < 0.15 {
        mix.fa_ratio / 0.15
    } else {
        (1.0 - (mix.fa_ratio - 0.30) / 0.20).max(0.0)
    };

    let ra_score = if (0.20..=0.30).contains(&mix.ra_ratio) {
        1.0
    } else if mix.ra_ratio < 0.20 {
        mix.ra_ratio / 0.20
    } else {
        (1.0 - (mix.ra_ratio - 0.30) / 0.30).max(0.0)
    };

    let strength_score = if inputs.compressive_strength > 0.0 {
        (inputs.compressive_strength / 50.0).min(1.0)
    } else {
        0.0
    };

    let quality = (w_c_score + fa_score + ra_score + strength_score) / 4.0;
    QUALITY_TIERS
        .iter()
        .find(|(cutoff, _)| quality >= *cutoff)
        .map(|(_, baseline)| *baseline)
        .unwrap_or(BASELINE_FALLBACK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use model_registry::ModelRegistry;

    fn reference_inputs() -> CarbonationInputs {
        CarbonationInputs {
            cement: 350.0,
            fly_ash: 50.0,
            water: 180.0,
            coarse_agg: 600.0,
            recycled_agg: 400.0,
            water_absorption: 4.5,
            fine_agg: 700.0,
            superplasticizer: 2.0,
            compressive_strength: 35.0,
            carbon_concentration: 10.0,
            exposure_time: 365.0,
            temperature: 20.0,
            relative_humidity: 65.0,
        }
    }

    #[test]
    fn reference_mix_lands_in_the_medium_band() {
        let registry = ModelRegistry::builtin();
        let entry = registry.lookup("XGB").unwrap();
        let inputs = reference_inputs();
        let prediction = entry.model().predict(&inputs).unwrap();

        let breakdown = UncertaintyDecomposer::default()
            .decompose(&inputs, entry.model(), &entry.metadata, prediction)
            .unwrap();

        assert_eq!(breakdown.model_correction, 1.00);
        assert_relative_eq!(breakdown.experimental_stability, 0.9091, max_relative = 1e-3);
        assert_relative_eq!(breakdown.environmental_factor, 1.0103, max_relative = 1e-3);
        assert_relative_eq!(breakdown.final_uncertainty, 16.53, max_relative = 1e-3);
    }

    #[test]
    fn decomposition_is_deterministic() {
        let registry = ModelRegistry::builtin();
        let entry = registry.lookup("RF").unwrap();
        let inputs = reference_inputs();
        let prediction = entry.model().predict(&inputs).unwrap();

        let decomposer = UncertaintyDecomposer::default();
        let a = decomposer
            .decompose(&inputs, entry.model(), &entry.metadata, prediction)
            .unwrap();
        let b = decomposer
            .decompose(&inputs, entry.model(), &entry.metadata, prediction)
            .unwrap();
        assert_eq!(a.final_uncertainty.to_bits(), b.final_uncertainty.to_bits());
        assert_eq!(a, b);
    }

    #[test]
    fn worse_families_carry_more_uncertainty() {
        let registry = ModelRegistry::builtin();
        let inputs = reference_inputs();
        let decomposer = UncertaintyDecomposer::default();

        let mut previous = 0.0;
        for id in ["XGB", "RF", "GB", "SVR", "KNN", "PRR"] {
            let entry = registry.lookup(id).unwrap();
            let prediction = entry.model().predict(&inputs).unwrap();
            let breakdown = decomposer
                .decompose(&inputs, entry.model(), &entry.metadata, prediction)
                .unwrap();
            assert!(
                breakdown.model_correction >= previous,
                "{id} correction regressed"
            );
            previous = breakdown.model_correction;
        }
    }

    #[test]
    fn environmental_factor_is_unity_at_the_reference_point() {
        let mut inputs = reference_inputs();
        inputs.carbon_concentration = 8.19;
        inputs.exposure_time = 147.91;
        inputs.temperature = 20.0;
        inputs.relative_humidity = 65.0;

        let factor = UncertaintyDecomposer::default().environmental_factor(&inputs);
        assert_eq!(factor, 1.0);

        inputs.temperature = 35.0;
        inputs.exposure_time = 3650.0;
        let extrapolated = UncertaintyDecomposer::default().environmental_factor(&inputs);
        assert!(extrapolated > 1.0);
    }

    #[test]
    fn near_zero_estimate_is_a_numeric_degeneracy() {
        let registry = ModelRegistry::builtin();
        let entry = registry.lookup("XGB").unwrap();
        let inputs = reference_inputs();

        let err = UncertaintyDecomposer::default()
            .decompose(&inputs, entry.model(), &entry.metadata, 0.0)
            .unwrap_err();
        assert!(matches!(err, EngineError::NumericDegeneracy(_)));

        let err = UncertaintyDecomposer::default()
            .decompose(&inputs, entry.model(), &entry.metadata, f64::NAN)
            .unwrap_err();
        assert!(matches!(err, EngineError::NumericDegeneracy(_)));
    }

    #[test]
    fn final_uncertainty_respects_the_clamp() {
        let registry = ModelRegistry::builtin();
        let decomposer = UncertaintyDecomposer::default();

        // hostile extrapolation with the worst family stays within 5-50 %
        let mut inputs = reference_inputs();
        inputs.water = 260.0;
        inputs.cement = 260.0;
        inputs.fly_ash = 0.0;
        inputs.recycled_agg = 1200.0;
        inputs.coarse_agg = 100.0;
        inputs.compressive_strength = 18.0;
        inputs.temperature = 45.0;
        inputs.relative_humidity = 40.0;
        inputs.exposure_time = 3650.0;

        let entry = registry.lookup("PRR").unwrap();
        let prediction = entry.model().predict(&inputs).unwrap();
        let breakdown = decomposer
            .decompose(&inputs, entry.model(), &entry.metadata, prediction)
            .unwrap();
        assert!(breakdown.final_uncertainty >= 5.0);
        assert!(breakdown.final_uncertainty <= 50.0);
    }

    #[test]
    fn zero_valued_fields_probe_with_an_absolute_step() {
        let registry = ModelRegistry::builtin();
        let entry = registry.lookup("XGB").unwrap();

        let mut inputs = reference_inputs();
        inputs.fly_ash = 0.0;
        inputs.superplasticizer = 0.0;
        let prediction = entry.model().predict(&inputs).unwrap();

        // must not divide by a zero field value
        let breakdown = UncertaintyDecomposer::default()
            .decompose(&inputs, entry.model(), &entry.metadata, prediction)
            .unwrap();
        assert!(breakdown.experimental_stability.is_finite());
        assert!(breakdown.experimental_stability >= 0.90);
    }
}
