//! Boundary validation
//!
//! The raw envelope keeps `input_params` as a JSON object so every problem
//! can be collected and reported at once - missing fields, non-numeric
//! values, out-of-range values and unknown keys all become violations in a
//! single `Validation` error instead of failing at the first bad field.

use carbonation_core::{CarbonationInputs, EngineError, FieldViolation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw request envelope as received from the transport layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub input_params: Map<String, Value>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub confidence_level: Option<f64>,
}

/// Strongly-typed request produced by a successful validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub inputs: CarbonationInputs,
    pub model: String,
    pub confidence_level: f64,
}

struct FieldSpec {
    name: &'static str,
    min: f64,
    max: f64,
}

/// Plausible physical ranges for the 13 parameters. Wider than the training
/// distribution on purpose: the uncertainty decomposer penalizes
/// extrapolation, the validator only rejects the physically impossible.
const FIELD_SPECS: [FieldSpec; 13] = [
    FieldSpec { name: "cement", min: 0.0, max: 1000.0 },
    FieldSpec { name: "fly_ash", min: 0.0, max: 500.0 },
    FieldSpec { name: "water", min: 0.0, max: 500.0 },
    FieldSpec { name: "coarse_agg", min: 0.0, max: 2000.0 },
    FieldSpec { name: "recycled_agg", min: 0.0, max: 2000.0 },
    FieldSpec { name: "water_absorption", min: 0.0, max: 20.0 },
    FieldSpec { name: "fine_agg", min: 0.0, max: 1500.0 },
    FieldSpec { name: "superplasticizer", min: 0.0, max: 20.0 },
    FieldSpec { name: "compressive_strength", min: 5.0, max: 150.0 },
    FieldSpec { name: "carbon_concentration", min: 0.0, max: 30.0 },
    FieldSpec { name: "exposure_time", min: 0.0, max: 36500.0 },
    FieldSpec { name: "temperature", min: -10.0, max: 60.0 },
    FieldSpec { name: "relative_humidity", min: 0.0, max: 100.0 },
];

/// Validate the raw envelope into a strongly-typed request, or fail with a
/// `Validation` error enumerating every offending field. No side effects.
pub fn validate(request: &PredictRequest) -> Result<ValidatedRequest, EngineError> {
    let mut violations = Vec::new();
    let mut values = [0.0_f64; 13];

    for (i, spec) in FIELD_SPECS.iter().enumerate() {
        match request.input_params.get(spec.name) {
            None => violations.push(FieldViolation::new(spec.name, "missing")),
            Some(value) => match value.as_f64() {
                None => violations.push(FieldViolation::new(
                    spec.name,
                    format!("not numeric (got {value})"),
                )),
                Some(v) if !v.is_finite() => {
                    violations.push(FieldViolation::new(spec.name, "not finite"))
                }
                Some(v) if v < spec.min || v > spec.max => violations.push(FieldViolation::new(
                    spec.name,
                    format!("out of range {}..={} (got {v})", spec.min, spec.max),
                )),
                Some(v) => values[i] = v,
            },
        }
    }

    for key in request.input_params.keys() {
        if !FIELD_SPECS.iter().any(|spec| spec.name == key) {
            violations.push(FieldViolation::new(key.clone(), "unknown field"));
        }
    }

    let model = match &request.model {
        Some(m) => m.clone(),
        None => {
            violations.push(FieldViolation::new("model", "missing"));
            String::new()
        }
    };

    let confidence_level = match request.confidence_level {
        Some(c) if c.is_finite() && c > 0.0 && c < 1.0 => c,
        Some(c) => {
            violations.push(FieldViolation::new(
                "confidence_level",
                format!("must lie strictly inside (0, 1) (got {c})"),
            ));
            0.0
        }
        None => {
            violations.push(FieldViolation::new("confidence_level", "missing"));
            0.0
        }
    };

    if !violations.is_empty() {
        return Err(EngineError::Validation(violations));
    }

    Ok(ValidatedRequest {
        inputs: CarbonationInputs {
            cement: values[0],
            fly_ash: values[1],
            water: values[2],
            coarse_agg: values[3],
            recycled_agg: values[4],
            water_absorption: values[5],
            fine_agg: values[6],
            superplasticizer: values[7],
            compressive_strength: values[8],
            carbon_concentration: values[9],
            exposure_time: values[10],
            temperature: values[11],
            relative_humidity: values[12],
        },
        model,
        confidence_level,
    })
}
