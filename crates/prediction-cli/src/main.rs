//! Reference caller for the carbonation prediction engine
//!
//! Reads a JSON request from a file argument or stdin, runs the pipeline,
//! and prints the response envelope to stdout. Stands in for the excluded
//! HTTP serving layer and owns its bootstrap concerns: env config, tracing
//! init, registry loading.

use anyhow::{Context, Result};
use model_registry::ModelRegistry;
use prediction_pipeline::{PredictRequest, PredictResponse, PredictionPipeline};
use std::io::Read;
use std::sync::Arc;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let args: Vec<String> = std::env::args().collect();

    let artifacts_flag = args.iter().position(|a| a == "--artifacts");
    let artifacts = artifacts_flag
        .and_then(|i| args.get(i + 1))
        .cloned()
        .or_else(|| std::env::var("CARBONATION_ARTIFACTS").ok());

    let registry = match artifacts {
        Some(path) => {
            tracing::info!(path = %path, "loading model registry from artifacts");
            ModelRegistry::from_artifact_file(&path)?
        }
        None => {
            tracing::info!("no artifact path configured, using builtin registry");
            ModelRegistry::builtin()
        }
    };
    tracing::info!(
        models = ?registry.model_ids(),
        "registry ready"
    );

    let request_path = args.iter().enumerate().skip(1).find_map(|(i, a)| {
        let is_flag_value = artifacts_flag.map(|f| i == f + 1).unwrap_or(false);
        (!a.starts_with("--") && !is_flag_value).then_some(a)
    });

    let raw = match request_path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("reading request {path}"))?
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading request from stdin")?;
            buf
        }
    };

    let request: PredictRequest =
        serde_json::from_str(&raw).context("parsing request envelope")?;

    let pipeline = PredictionPipeline::new(Arc::new(registry));
    let response = match pipeline.run(&request) {
        Ok(result) => PredictResponse::from_result(&result),
        Err(err) => {
            tracing::warn!(client_error = err.is_client_error(), %err, "request failed");
            PredictResponse::from_error(&err)
        }
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
