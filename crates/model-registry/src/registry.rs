use crate::kernel::{KernelCoefficients, KernelModel};
use anyhow::Context;
use carbonation_core::{CarbonationModel, EngineError, ModelId, ModelMetadata, ModelPerformance};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

/// One registered model family: fitted handle plus its static performance
/// metadata. Never mutated after registry construction.
pub struct ModelEntry {
    pub id: ModelId,
    pub metadata: ModelMetadata,
    model: Box<dyn CarbonationModel>,
}

impl ModelEntry {
    pub fn new(id: ModelId, metadata: ModelMetadata, model: Box<dyn CarbonationModel>) -> Self {
        Self {
            id,
            metadata,
            model,
        }
    }

    pub fn model(&self) -> &dyn CarbonationModel {
        self.model.as_ref()
    }

    /// Per-request echo of this entry's metadata for the response
    pub fn performance(&self) -> ModelPerformance {
        ModelPerformance {
            selected_model: self.id,
            expected_r2: self.metadata.expected_r2,
            model_rmse: self.metadata.model_rmse,
            uncertainty_factor: self.metadata.uncertainty_factor,
        }
    }
}

impl std::fmt::Debug for ModelEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelEntry")
            .field("id", &self.id)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Persisted registry artifact: kernel coefficients plus the per-family
/// performance table, serialized by the training side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryArtifact {
    pub kernel: KernelCoefficients,
    pub models: HashMap<ModelId, ModelMetadata>,
}

/// Process-wide, read-only map of model families
///
/// Built once at startup and shared by reference across all requests; no
/// entry is ever mutated post-load, so no locking is needed.
#[derive(Debug)]
pub struct ModelRegistry {
    entries: HashMap<ModelId, ModelEntry>,
}

impl ModelRegistry {
    /// Registry from a loaded artifact
    pub fn from_artifact(artifact: RegistryArtifact) -> Self {
        let entries = artifact
            .models
            .into_iter()
            .map(|(id, metadata)| {
                tracing::info!(
                    model = %id,
                    expected_r2 = metadata.expected_r2,
                    model_rmse = metadata.model_rmse,
                    "registered model family"
                );
                let model = KernelModel::new(artifact.kernel, metadata.expected_r2);
                (id, ModelEntry::new(id, metadata, Box::new(model)))
            })
            .collect();
        Self { entries }
    }

    /// Registry from a JSON artifact file persisted by the training side
    pub fn from_artifact_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading registry artifact {}", path.display()))?;
        let artifact: RegistryArtifact = serde_json::from_str(&raw)
            .with_context(|| format!("parsing registry artifact {}", path.display()))?;
        Ok(Self::from_artifact(artifact))
    }

    /// The six validated model families with their hold-out performance
    /// table and the default kernel calibration
    pub fn builtin() -> Self {
        let models = [
            (ModelId::Xgb, 0.934, 2.85, 2.12, 1.00),
            (ModelId::Rf, 0.921, 3.12, 2.34, 1.05),
            (ModelId::Gb, 0.918, 3.18, 2.41, 1.08),
            (ModelId::Svr, 0.896, 3.58, 2.78, 1.15),
            (ModelId::Knn, 0.883, 3.79, 2.91, 1.20),
            (ModelId::Prr, 0.847, 4.32, 3.25, 1.30),
        ]
        .into_iter()
        .map(|(id, expected_r2, model_rmse, model_mae, uncertainty_factor)| {
            (
                id,
                ModelMetadata {
                    expected_r2,
                    model_rmse,
                    model_mae,
                    uncertainty_factor,
                },
            )
        })
        .collect();

        Self::from_artifact(RegistryArtifact {
            kernel: KernelCoefficients::default(),
            models,
        })
    }

    /// Resolve a caller-supplied model id. Selection is explicit: an id
    /// outside the enumerated set, or one the registry does not hold, fails
    /// with `UnknownModel`; there is no best-model fallback.
    pub fn lookup(&self, id: &str) -> Result<&ModelEntry, EngineError> {
        let model_id =
            ModelId::from_str(id).map_err(|_| EngineError::UnknownModel(id.to_string()))?;
        self.entries
            .get(&model_id)
            .ok_or_else(|| EngineError::UnknownModel(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered ids, for startup logging
    pub fn model_ids(&self) -> Vec<ModelId> {
        let mut ids: Vec<ModelId> = self.entries.keys().copied().collect();
        ids.sort_by_key(|id| id.as_str());
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_holds_all_six_families() {
        let registry = ModelRegistry::builtin();
        assert_eq!(registry.len(), 6);
        for id in ModelId::ALL {
            let entry = registry.lookup(id.as_str()).unwrap();
            assert_eq!(entry.id, id);
        }
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let registry = ModelRegistry::builtin();
        for id in ["LSTM", "xgb", "", "XG B"] {
            match registry.lookup(id) {
                Err(EngineError::UnknownModel(s)) => assert_eq!(s, id),
                other => panic!("expected UnknownModel, got {other:?}"),
            }
        }
    }

    #[test]
    fn lookup_without_registered_entry_fails() {
        // valid id, but the artifact only shipped XGB
        let mut models = HashMap::new();
        models.insert(
            ModelId::Xgb,
            ModelMetadata {
                expected_r2: 0.934,
                model_rmse: 2.85,
                model_mae: 2.12,
                uncertainty_factor: 1.00,
            },
        );
        let registry = ModelRegistry::from_artifact(RegistryArtifact {
            kernel: KernelCoefficients::default(),
            models,
        });

        assert!(registry.lookup("XGB").is_ok());
        assert!(matches!(
            registry.lookup("RF"),
            Err(EngineError::UnknownModel(_))
        ));
    }

    #[test]
    fn artifact_json_round_trip() {
        let builtin = ModelRegistry::builtin();
        let artifact = RegistryArtifact {
            kernel: KernelCoefficients::default(),
            models: ModelId::ALL
                .into_iter()
                .map(|id| (id, builtin.lookup(id.as_str()).unwrap().metadata))
                .collect(),
        };

        let json = serde_json::to_string(&artifact).unwrap();
        let parsed: RegistryArtifact = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.kernel, artifact.kernel);
        assert_eq!(parsed.models[&ModelId::Prr].uncertainty_factor, 1.30);

        let registry = ModelRegistry::from_artifact(parsed);
        assert_eq!(registry.len(), 6);
    }

    #[test]
    fn xgb_metadata_matches_validation_table() {
        let registry = ModelRegistry::builtin();
        let perf = registry.lookup("XGB").unwrap().performance();
        assert_eq!(perf.selected_model, ModelId::Xgb);
        assert_eq!(perf.expected_r2, 0.934);
        assert_eq!(perf.model_rmse, 2.85);
        assert_eq!(perf.uncertainty_factor, 1.00);
    }
}
