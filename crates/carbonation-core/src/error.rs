use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single offending request field with the reason it was rejected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    /// Request rejected at the boundary; carries every violation, not just the first
    #[error("validation failed: {}", format_violations(.0))]
    Validation(Vec<FieldViolation>),

    #[error("unknown model id: {0}")]
    UnknownModel(String),

    #[error("model inference failed: {0}")]
    Inference(String),

    #[error("numeric degeneracy: {0}")]
    NumericDegeneracy(String),
}

impl EngineError {
    /// True when the caller's request is at fault (transport maps to 4xx);
    /// false for engine-side failures (5xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EngineError::Validation(_) | EngineError::UnknownModel(_)
        )
    }
}

fn format_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_violation() {
        let err = EngineError::Validation(vec![
            FieldViolation::new("cement", "missing"),
            FieldViolation::new("relative_humidity", "out of range 0..=100 (got 150)"),
        ]);

        let msg = err.to_string();
        assert!(msg.contains("cement: missing"));
        assert!(msg.contains("relative_humidity"));
        assert!(msg.contains("150"));
    }

    #[test]
    fn error_kinds_split_into_client_and_server() {
        assert!(EngineError::Validation(vec![]).is_client_error());
        assert!(EngineError::UnknownModel("LSTM".into()).is_client_error());
        assert!(!EngineError::Inference("corrupted artifact".into()).is_client_error());
        assert!(!EngineError::NumericDegeneracy("zero point estimate".into()).is_client_error());
    }
}
