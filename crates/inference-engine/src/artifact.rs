//! Model Artifact Loading
//!
//! A model artifact is a directory holding `manifest.json` plus the backend
//! file it names. It is loaded once at start-up and shared read-only.

use feature_engine::{FEATURE_DIMENSION, FEATURE_NAMES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::forest::TreeEnsemble;
use crate::model::{
    rank_importances, EstimatorImportances, ImportanceSource, LabelDecoder, NativeImportances,
    RiskModel,
};
use crate::onnx::OnnxModel;
use crate::tier::RiskTier;
use crate::InferenceError;

/// Manifest file name inside an artifact directory
pub const MANIFEST_FILE: &str = "manifest.json";

fn default_probability_output() -> usize {
    1
}

/// Classifier backend named by the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendSpec {
    Forest {
        path: PathBuf,
    },
    Onnx {
        path: PathBuf,
        #[serde(default = "default_probability_output")]
        probability_output: usize,
    },
}

/// Feature importance table shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportanceSpec {
    Native(Vec<f64>),
    Estimators(Vec<Vec<f64>>),
}

/// `manifest.json` contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: String,
    pub feature_order: Vec<String>,
    /// Class labels in class id order
    pub classes: Vec<String>,
    pub backend: BackendSpec,
    #[serde(default)]
    pub importances: Option<ImportanceSpec>,
}

/// Single feature importance entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Summary of the loaded model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    pub version: String,
    pub backend: String,
    pub classes: Vec<RiskTier>,
    pub feature_order: Vec<String>,
    /// Most important first; empty when the artifact ships no table
    pub feature_importances: Vec<FeatureImportance>,
}

/// Loaded, immutable model plus its label decoder and importance table
pub struct ModelArtifact {
    version: String,
    model: Arc<dyn RiskModel>,
    decoder: LabelDecoder,
    importances: Option<Box<dyn ImportanceSource>>,
}

impl std::fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("version", &self.version)
            .field("backend", &self.model.name())
            .field("classes", &self.decoder.labels())
            .finish()
    }
}

impl ModelArtifact {
    /// Assemble an artifact from already-built parts
    pub fn new(
        version: impl Into<String>,
        model: Arc<dyn RiskModel>,
        decoder: LabelDecoder,
        importances: Option<Box<dyn ImportanceSource>>,
    ) -> Self {
        Self {
            version: version.into(),
            model,
            decoder,
            importances,
        }
    }

    /// Load an artifact directory
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let dir = dir.as_ref();
        let manifest_path = dir.join(MANIFEST_FILE);

        let raw = std::fs::read_to_string(&manifest_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => InferenceError::ModelUnavailable(format!(
                "no model manifest at {}",
                manifest_path.display()
            )),
            _ => InferenceError::ModelLoadError(format!("{}: {}", manifest_path.display(), e)),
        })?;
        let manifest: ModelManifest = serde_json::from_str(&raw).map_err(|e| {
            InferenceError::ModelLoadError(format!("{}: {}", manifest_path.display(), e))
        })?;

        Self::from_manifest(dir, manifest)
    }

    /// Build an artifact from a parsed manifest; backend paths resolve
    /// relative to `dir`
    pub fn from_manifest(dir: &Path, manifest: ModelManifest) -> Result<Self, InferenceError> {
        check_feature_order(&manifest.feature_order)?;
        let decoder = LabelDecoder::from_labels(&manifest.classes)?;

        let model: Arc<dyn RiskModel> = match &manifest.backend {
            BackendSpec::Forest { path } => {
                let ensemble = TreeEnsemble::from_path(&dir.join(path))?;
                if ensemble.n_classes != decoder.len() {
                    return Err(InferenceError::ModelLoadError(format!(
                        "forest has {} classes but manifest lists {}",
                        ensemble.n_classes,
                        decoder.len()
                    )));
                }
                Arc::new(ensemble)
            }
            BackendSpec::Onnx {
                path,
                probability_output,
            } => Arc::new(OnnxModel::load(
                &dir.join(path),
                decoder.len(),
                *probability_output,
            )?),
        };

        let importances: Option<Box<dyn ImportanceSource>> = match manifest.importances {
            Some(ImportanceSpec::Native(table)) => {
                check_importance_len(&table)?;
                Some(Box::new(NativeImportances(table)))
            }
            Some(ImportanceSpec::Estimators(tables)) => {
                for table in &tables {
                    check_importance_len(table)?;
                }
                Some(Box::new(EstimatorImportances(tables)))
            }
            None => {
                warn!("Model artifact ships no feature importance table");
                None
            }
        };

        info!(
            "Model artifact {} loaded: backend={}, classes={:?}",
            manifest.version,
            model.name(),
            decoder.labels()
        );

        Ok(Self {
            version: manifest.version,
            model,
            decoder,
            importances,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn model(&self) -> &dyn RiskModel {
        self.model.as_ref()
    }

    pub fn decoder(&self) -> &LabelDecoder {
        &self.decoder
    }

    /// Per-feature importances in model order, if the artifact has them
    pub fn feature_importances(&self) -> Option<Vec<f64>> {
        self.importances.as_ref().map(|source| source.feature_importances())
    }

    /// Report of version, classes and ranked importances
    pub fn report(&self) -> ModelReport {
        let feature_importances = self
            .importances
            .as_deref()
            .map(|source| {
                rank_importances(source)
                    .into_iter()
                    .map(|(feature, importance)| FeatureImportance {
                        feature: feature.to_string(),
                        importance,
                    })
                    .collect()
            })
            .unwrap_or_default();

        ModelReport {
            version: self.version.clone(),
            backend: self.model.name().to_string(),
            classes: self.decoder.labels().to_vec(),
            feature_order: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            feature_importances,
        }
    }
}

fn check_feature_order(order: &[String]) -> Result<(), InferenceError> {
    if order.iter().map(String::as_str).eq(FEATURE_NAMES.iter().copied()) {
        Ok(())
    } else {
        Err(InferenceError::InvalidInputShape {
            expected: FEATURE_NAMES.join(","),
            actual: order.join(","),
        })
    }
}

fn check_importance_len(table: &[f64]) -> Result<(), InferenceError> {
    if table.len() == FEATURE_DIMENSION {
        Ok(())
    } else {
        Err(InferenceError::ModelLoadError(format!(
            "importance table has {} entries, expected {}",
            table.len(),
            FEATURE_DIMENSION
        )))
    }
}
