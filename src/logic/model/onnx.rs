//! ONNX Classifier - ONNX Runtime Integration
//!
//! Runs a scent classifier exported to ONNX (the dense network, or a
//! scikit-learn pipeline exported with probabilities as a plain tensor).
//! Class names and the optional input scaler come from a sidecar
//! `<stem>.meta.json` next to the model file.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::scaler::StandardScaler;
use super::{Classifier, ModelError};
use crate::logic::features::layout::{validate_declared, validate_names};
use crate::logic::features::{FeatureVector, FEATURE_COUNT};

// ============================================================================
// SIDECAR
// ============================================================================

/// Metadata shipped next to an ONNX graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnnxSidecar {
    /// Class names in output-index order (label encoder order)
    pub labels: Vec<String>,
    /// Standardization applied before the graph, if it was trained on scaled input
    #[serde(default)]
    pub scaler: Option<StandardScaler>,
    /// Output holding class scores; defaults to the last graph output
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub feature_version: Option<u8>,
    #[serde(default)]
    pub layout_hash: Option<u32>,
}

impl OnnxSidecar {
    /// `model.onnx` -> `model.meta.json`
    pub fn path_for(model_path: &Path) -> PathBuf {
        model_path.with_extension("meta.json")
    }

    pub fn load(model_path: &Path) -> Result<Self, ModelError> {
        let path = Self::path_for(model_path);
        let bytes = std::fs::read(&path).map_err(|source| ModelError::Io {
            path: path.clone(),
            source,
        })?;
        let sidecar: Self = serde_json::from_slice(&bytes)
            .map_err(|e| ModelError::Format(format!("invalid sidecar {}: {}", path.display(), e)))?;
        sidecar.validate()?;
        Ok(sidecar)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.labels.is_empty() {
            return Err(ModelError::Format("sidecar lists no labels".to_string()));
        }
        validate_declared(self.feature_version, self.layout_hash)?;
        if !self.feature_names.is_empty() {
            validate_names(&self.feature_names)?;
        }
        if let Some(scaler) = &self.scaler {
            scaler.validate()?;
        }
        Ok(())
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

pub struct OnnxClassifier {
    /// `Session::run` needs `&mut`; only the poller loop ever locks it
    session: Mutex<Session>,
    output_name: String,
    sidecar: OnnxSidecar,
}

impl OnnxClassifier {
    /// Build from model bytes and a sidecar, then probe once with a zero vector
    pub fn from_memory(model_bytes: &[u8], sidecar: OnnxSidecar) -> Result<Self, ModelError> {
        log::info!("Loading ONNX model from memory ({} bytes)", model_bytes.len());

        let session = Session::builder()
            .map_err(|e| ModelError::Onnx(format!("Session builder error: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ModelError::Onnx(format!("Optimization error: {}", e)))?
            .commit_from_memory(model_bytes)
            .map_err(|e| ModelError::Onnx(format!("Load from memory error: {}", e)))?;

        let output_name = match &sidecar.output {
            Some(name) => {
                if !session.outputs.iter().any(|o| &o.name == name) {
                    return Err(ModelError::Onnx(format!("Graph has no output named {:?}", name)));
                }
                name.clone()
            }
            None => session
                .outputs
                .last()
                .map(|o| o.name.clone())
                .ok_or_else(|| ModelError::Onnx("No output defined".to_string()))?,
        };

        let classifier = Self {
            session: Mutex::new(session),
            output_name,
            sidecar,
        };

        // A graph that cannot take a [1, 3] input or whose score width
        // disagrees with the label list is a configuration error
        let scores = classifier.scores(&FeatureVector::new())?;
        if scores.len() != classifier.sidecar.labels.len() {
            return Err(ModelError::Format(format!(
                "model produces {} scores but sidecar lists {} labels",
                scores.len(),
                classifier.sidecar.labels.len()
            )));
        }

        Ok(classifier)
    }

    /// Raw class scores for one sample
    pub fn scores(&self, features: &FeatureVector) -> Result<Vec<f32>, ModelError> {
        let input = match &self.sidecar.scaler {
            Some(scaler) => scaler.transform(features),
            None => *features.as_array(),
        };

        let input_array = Array2::<f32>::from_shape_vec((1, FEATURE_COUNT), input.to_vec())
            .map_err(|e| ModelError::Inference(format!("Array error: {}", e)))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| ModelError::Inference(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| ModelError::Inference(format!("Inference failed: {}", e)))?;

        let output = outputs
            .get(&self.output_name)
            .ok_or_else(|| ModelError::Inference(format!("No output {}", self.output_name)))?;

        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Inference(format!("Extract error: {}", e)))?;

        Ok(data.to_vec())
    }
}

/// Index of the highest score; first wins on ties
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &s) in scores.iter().enumerate() {
        if s.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((i, s));
        }
    }
    best.map(|(i, _)| i)
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &FeatureVector) -> Result<String, ModelError> {
        let scores = self.scores(features)?;
        let index = argmax(&scores)
            .ok_or_else(|| ModelError::Inference("model returned no usable scores".to_string()))?;

        self.sidecar
            .labels
            .get(index)
            .cloned()
            .ok_or_else(|| {
                ModelError::Inference(format!(
                    "score index {} outside {} labels",
                    index,
                    self.sidecar.labels.len()
                ))
            })
    }

    fn model_type(&self) -> &'static str {
        "onnx"
    }

    fn classes(&self) -> Vec<String> {
        self.sidecar.labels.clone()
    }
}
