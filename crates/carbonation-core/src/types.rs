use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identifier of a fitted model family
///
/// The set is closed: selection is a lookup against these variants, never
/// runtime reflection over artifact names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModelId {
    /// XGBoost
    Xgb,
    /// Random Forest
    Rf,
    /// Gradient Boosting
    Gb,
    /// Support Vector Regression
    Svr,
    /// K-Nearest Neighbors
    Knn,
    /// Polynomial Ridge Regression
    Prr,
}

impl ModelId {
    pub const ALL: [ModelId; 6] = [
        ModelId::Xgb,
        ModelId::Rf,
        ModelId::Gb,
        ModelId::Svr,
        ModelId::Knn,
        ModelId::Prr,
    ];

    /// Wire id, as it appears in requests and responses
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Xgb => "XGB",
            ModelId::Rf => "RF",
            ModelId::Gb => "GB",
            ModelId::Svr => "SVR",
            ModelId::Knn => "KNN",
            ModelId::Prr => "PRR",
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            ModelId::Xgb => "XGBoost",
            ModelId::Rf => "Random Forest",
            ModelId::Gb => "Gradient Boosting",
            ModelId::Svr => "Support Vector Regression",
            ModelId::Knn => "K-Nearest Neighbors",
            ModelId::Prr => "Polynomial Ridge Regression",
        }
    }
}

impl FromStr for ModelId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or(())
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The 13 mix-design and environmental parameters of a prediction request
///
/// Masses are kg/m³, water_absorption and relative_humidity are percent,
/// compressive_strength is MPa, carbon_concentration is percent CO₂,
/// exposure_time is days, temperature is °C. Constructed only by the
/// validator; immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarbonationInputs {
    pub cement: f64,
    pub fly_ash: f64,
    pub water: f64,
    pub coarse_agg: f64,
    pub recycled_agg: f64,
    pub water_absorption: f64,
    pub fine_agg: f64,
    pub superplasticizer: f64,
    pub compressive_strength: f64,
    pub carbon_concentration: f64,
    pub exposure_time: f64,
    pub temperature: f64,
    pub relative_humidity: f64,
}

/// Derived mix-design ratios used by the prediction kernel and by the
/// uncertainty decomposer's quality scoring
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixFactors {
    /// Water / (cement + fly ash)
    pub w_c_ratio: f64,
    /// Recycled aggregate share of total coarse aggregate
    pub ra_ratio: f64,
    /// Fly ash share of total binder
    pub fa_ratio: f64,
}

impl MixFactors {
    pub fn from_inputs(inputs: &CarbonationInputs) -> Self {
        let binder = inputs.cement + inputs.fly_ash;
        let total_agg = inputs.coarse_agg + inputs.recycled_agg;
        Self {
            // fallback matches the calibration default for a binder-free mix
            w_c_ratio: if binder > 0.0 {
                inputs.water / binder
            } else {
                0.5
            },
            ra_ratio: if total_agg > 0.0 {
                inputs.recycled_agg / total_agg
            } else {
                0.0
            },
            fa_ratio: if binder > 0.0 {
                inputs.fly_ash / binder
            } else {
                0.0
            },
        }
    }
}

/// Mix-design fields probed by the finite-difference stability check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixField {
    Cement,
    FlyAsh,
    Water,
    CoarseAgg,
    RecycledAgg,
    FineAgg,
    Superplasticizer,
    CompressiveStrength,
}

impl MixField {
    pub const ALL: [MixField; 8] = [
        MixField::Cement,
        MixField::FlyAsh,
        MixField::Water,
        MixField::CoarseAgg,
        MixField::RecycledAgg,
        MixField::FineAgg,
        MixField::Superplasticizer,
        MixField::CompressiveStrength,
    ];

    pub fn get(&self, inputs: &CarbonationInputs) -> f64 {
        match self {
            MixField::Cement => inputs.cement,
            MixField::FlyAsh => inputs.fly_ash,
            MixField::Water => inputs.water,
            MixField::CoarseAgg => inputs.coarse_agg,
            MixField::RecycledAgg => inputs.recycled_agg,
            MixField::FineAgg => inputs.fine_agg,
            MixField::Superplasticizer => inputs.superplasticizer,
            MixField::CompressiveStrength => inputs.compressive_strength,
        }
    }

    /// Copy of `inputs` with this field replaced by `value`
    pub fn with(&self, inputs: &CarbonationInputs, value: f64) -> CarbonationInputs {
        let mut out = *inputs;
        match self {
            MixField::Cement => out.cement = value,
            MixField::FlyAsh => out.fly_ash = value,
            MixField::Water => out.water = value,
            MixField::CoarseAgg => out.coarse_agg = value,
            MixField::RecycledAgg => out.recycled_agg = value,
            MixField::FineAgg => out.fine_agg = value,
            MixField::Superplasticizer => out.superplasticizer = value,
            MixField::CompressiveStrength => out.compressive_strength = value,
        }
        out
    }
}

/// Static performance record of a fitted model family, measured during
/// hold-out validation and shipped with the artifacts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Validation R² of the family
    pub expected_r2: f64,
    /// Validation RMSE (mm)
    pub model_rmse: f64,
    /// Validation MAE (mm)
    pub model_mae: f64,
    /// Relative uncertainty multiplier fitted against the family's RMSE/R²
    /// (1.0 for the best family, larger for worse ones)
    pub uncertainty_factor: f64,
}

/// Per-request echo of the selected model's performance metadata
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPerformance {
    pub selected_model: ModelId,
    pub expected_r2: f64,
    pub model_rmse: f64,
    pub uncertainty_factor: f64,
}

/// The three independent uncertainty contributions and their combination
///
/// `model_correction`, `experimental_stability` and `environmental_factor`
/// are dimensionless multipliers; `final_uncertainty` is a percentage of the
/// point prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyBreakdown {
    pub model_correction: f64,
    pub experimental_stability: f64,
    pub environmental_factor: f64,
    pub final_uncertainty: f64,
}

/// Interval-construction strategy tag attached to every result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntervalMethod {
    /// Jackknife+-style margin, wire tag "J+"
    #[serde(rename = "J+")]
    JackknifePlus,
}

impl IntervalMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalMethod::JackknifePlus => "J+",
        }
    }
}

/// Qualitative reliability of a prediction, derived from its relative
/// uncertainty
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    VeryHigh,
    High,
    Medium,
    Low,
}

/// Uncertainty fraction thresholds for the reliability tiers
pub const RELIABILITY_VERY_HIGH_MAX: f64 = 0.10;
pub const RELIABILITY_HIGH_MAX: f64 = 0.15;
pub const RELIABILITY_MEDIUM_MAX: f64 = 0.25;

impl Reliability {
    /// Total, monotone classification of a non-negative uncertainty fraction
    pub fn from_uncertainty(fraction: f64) -> Self {
        match fraction {
            u if u <= RELIABILITY_VERY_HIGH_MAX => Reliability::VeryHigh,
            u if u <= RELIABILITY_HIGH_MAX => Reliability::High,
            u if u <= RELIABILITY_MEDIUM_MAX => Reliability::Medium,
            _ => Reliability::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Reliability::VeryHigh => "very_high",
            Reliability::High => "high",
            Reliability::Medium => "medium",
            Reliability::Low => "low",
        }
    }

    /// Human-readable label for the response
    pub fn label(&self) -> &'static str {
        match self {
            Reliability::VeryHigh => {
                "Very high reliability - suitable for critical structural design"
            }
            Reliability::High => "High reliability - suitable for major engineering works",
            Reliability::Medium => "Medium reliability - suitable for general engineering",
            Reliability::Low => "Low reliability - use with caution",
        }
    }
}

/// The sole output of a successful pipeline run
///
/// All depth values are mm; `relative_uncertainty` and
/// `breakdown.final_uncertainty` are percentages of the point prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: f64,
    pub relative_uncertainty: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub interval_width: f64,
    pub confidence_level: f64,
    pub model: ModelId,
    pub method: IntervalMethod,
    pub performance: ModelPerformance,
    pub breakdown: UncertaintyBreakdown,
    pub reliability: Reliability,
}
