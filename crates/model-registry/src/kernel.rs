//! Calibrated carbonation kernel
//!
//! Papadakis-type multiplicative model: a base carbonation coefficient
//! scaled by mix-design and environmental factors, times the square root of
//! exposure time, with a per-family adjustment derived from the family's
//! validation R².

use carbonation_core::{CarbonationInputs, CarbonationModel, EngineError, MixFactors};
use serde::{Deserialize, Serialize};

/// Calibrated constants of the carbonation kernel, persisted with the model
/// artifacts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KernelCoefficients {
    /// Base carbonation coefficient, mm/√year
    pub k_base: f64,
    /// Reference water/binder ratio
    pub wc_reference: f64,
    pub wc_exponent: f64,
    /// Depth increase per unit recycled-aggregate replacement
    pub ra_slope: f64,
    /// Reference compressive strength, MPa
    pub strength_reference: f64,
    pub strength_exponent: f64,
    /// Fly-ash protection: depth reduction per unit fly-ash fraction
    pub fa_slope: f64,
    /// Floor of the fly-ash protection factor
    pub fa_floor: f64,
    /// Arrhenius-style temperature sensitivity per °C around 20 °C
    pub temp_sensitivity: f64,
    /// Atmospheric CO₂ concentration, percent
    pub co2_reference: f64,
    /// Humidity window within which carbonation proceeds unimpeded
    pub rh_window_low: f64,
    pub rh_window_high: f64,
}

impl Default for KernelCoefficients {
    fn default() -> Self {
        Self {
            k_base: 4.2,
            wc_reference: 0.40,
            wc_exponent: 0.65,
            ra_slope: 0.30,
            strength_reference: 35.0,
            strength_exponent: 0.40,
            fa_slope: 0.25,
            fa_floor: 0.70,
            temp_sensitivity: 0.0693,
            co2_reference: 0.04,
            rh_window_low: 50.0,
            rh_window_high: 70.0,
        }
    }
}

/// R² above which a family earns a positive prediction adjustment
const R2_HIGH_PERFORMANCE: f64 = 0.93;
/// Anchor R² for the high-performance adjustment
const R2_ANCHOR: f64 = 0.85;
const HIGH_PERFORMANCE_GAIN: f64 = 0.1;
const LOW_PERFORMANCE_PENALTY: f64 = 0.15;

/// Fitted-model handle for one family: the shared kernel plus the family's
/// validation-R² prediction adjustment
#[derive(Debug, Clone, Copy)]
pub struct KernelModel {
    coefficients: KernelCoefficients,
    expected_r2: f64,
}

impl KernelModel {
    pub fn new(coefficients: KernelCoefficients, expected_r2: f64) -> Self {
        Self {
            coefficients,
            expected_r2,
        }
    }

    /// Multiplicative adjustment derived from the family's validation R²
    fn r2_adjustment(&self) -> f64 {
        if self.expected_r2 >= R2_HIGH_PERFORMANCE {
            1.0 + (self.expected_r2 - R2_ANCHOR) * HIGH_PERFORMANCE_GAIN
        } else {
            1.0 - (R2_HIGH_PERFORMANCE - self.expected_r2) * LOW_PERFORMANCE_PENALTY
        }
    }

    fn humidity_factor(&self, rh: f64) -> f64 {
        let c = &self.coefficients;
        if rh >= c.rh_window_low && rh <= c.rh_window_high {
            1.0
        } else {
            let mid = (c.rh_window_low + c.rh_window_high) / 2.0;
            let half_span = c.rh_window_high - c.rh_window_low;
            0.5 + 0.5 * (std::f64::consts::PI * (rh - mid).abs() / (2.0 * half_span)).cos()
        }
    }
}

impl CarbonationModel for KernelModel {
    fn predict(&self, inputs: &CarbonationInputs) -> Result<f64, EngineError> {
        let c = &self.coefficients;
        let mix = MixFactors::from_inputs(inputs);

        let wc_factor = (mix.w_c_ratio / c.wc_reference).powf(c.wc_exponent);
        let ra_factor = 1.0 + mix.ra_ratio * c.ra_slope;
        let strength_factor = if inputs.compressive_strength > 0.0 {
            (c.strength_reference / inputs.compressive_strength).powf(c.strength_exponent)
        } else {
            1.5
        };
        let fa_factor = (1.0 - mix.fa_ratio * c.fa_slope).max(c.fa_floor);

        let temp_factor = (c.temp_sensitivity * (inputs.temperature - 20.0)).exp();
        let rh_factor = self.humidity_factor(inputs.relative_humidity);
        let co2_factor = (inputs.carbon_concentration / c.co2_reference).sqrt();
        let time_factor = (inputs.exposure_time / 365.25).sqrt();

        let depth = c.k_base
            * wc_factor
            * ra_factor
            * strength_factor
            * fa_factor
            * temp_factor
            * rh_factor
            * co2_factor
            * time_factor
            * self.r2_adjustment();

        if !depth.is_finite() {
            return Err(EngineError::Inference(format!(
                "kernel produced a non-finite depth (w/c={:.3}, ra={:.3})",
                mix.w_c_ratio, mix.ra_ratio
            )));
        }
        Ok(depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

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
    fn xgb_kernel_reproduces_documented_estimate() {
        let model = KernelModel::new(KernelCoefficients::default(), 0.934);
        let depth = model.predict(&reference_inputs()).unwrap();
        assert_relative_eq!(depth, 78.41, max_relative = 1e-4);
    }

    #[test]
    fn prediction_is_deterministic() {
        let model = KernelModel::new(KernelCoefficients::default(), 0.934);
        let a = model.predict(&reference_inputs()).unwrap();
        let b = model.predict(&reference_inputs()).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn higher_water_binder_ratio_carbonates_deeper() {
        let model = KernelModel::new(KernelCoefficients::default(), 0.934);
        let base = model.predict(&reference_inputs()).unwrap();

        let mut wetter = reference_inputs();
        wetter.water = 200.0;
        assert!(model.predict(&wetter).unwrap() > base);
    }

    #[test]
    fn fly_ash_is_protective() {
        let model = KernelModel::new(KernelCoefficients::default(), 0.934);

        // same binder total, more of it fly ash: fa protection outweighs
        // the slightly different w/c
        let mut more_fa = reference_inputs();
        more_fa.cement = 320.0;
        more_fa.fly_ash = 80.0;
        let base = model.predict(&reference_inputs()).unwrap();
        assert!(model.predict(&more_fa).unwrap() < base);
    }

    #[test]
    fn low_r2_family_is_adjusted_down() {
        let strong = KernelModel::new(KernelCoefficients::default(), 0.934);
        let weak = KernelModel::new(KernelCoefficients::default(), 0.847);
        let inputs = reference_inputs();
        assert!(weak.predict(&inputs).unwrap() < strong.predict(&inputs).unwrap());
    }

    #[test]
    fn humidity_window_is_optimal() {
        let model = KernelModel::new(KernelCoefficients::default(), 0.934);
        let base = model.predict(&reference_inputs()).unwrap();

        let mut dry = reference_inputs();
        dry.relative_humidity = 30.0;
        let mut wet = reference_inputs();
        wet.relative_humidity = 90.0;

        assert!(model.predict(&dry).unwrap() < base);
        assert!(model.predict(&wet).unwrap() < base);
    }

    #[test]
    fn zero_exposure_time_gives_zero_depth() {
        let model = KernelModel::new(KernelCoefficients::default(), 0.934);
        let mut inputs = reference_inputs();
        inputs.exposure_time = 0.0;
        assert_eq!(model.predict(&inputs).unwrap(), 0.0);
    }
}
