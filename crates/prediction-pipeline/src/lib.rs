//! Inference pipeline for RAC carbonation depth
//!
//! Strict linear flow per request: validate the raw envelope, select the
//! model, predict, decompose uncertainty, construct the interval, classify
//! reliability. Every stage is pure computation over the shared read-only
//! model registry; any failure aborts that request only.

pub mod pipeline;
pub mod response;
pub mod validate;

pub use pipeline::PredictionPipeline;
pub use response::{MlAnalysis, PredictFailure, PredictResponse, PredictSuccess, WireBreakdown, WirePerformance};
pub use validate::{validate, PredictRequest, ValidatedRequest};
