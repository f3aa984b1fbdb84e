//! Model loader
//!
//! Reads the artifact once, verifies its checksum, validates the feature
//! layout and hands back a shared read-only classifier.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use super::knn::KnnPipeline;
use super::onnx::{OnnxClassifier, OnnxSidecar};
use super::{Classifier, ModelError};
use crate::logic::features::layout::{layout_hash, FEATURE_VERSION};

/// Model metadata
#[derive(Debug, Clone)]
pub struct ModelMetadata {
    pub model_path: String,
    pub model_type: String,
    pub sha256: String,
    pub classes: Vec<String>,
    pub feature_version: u8,
    pub layout_hash: u32,
    pub loaded_at: DateTime<Utc>,
}

/// A classifier together with where it came from
pub struct LoadedModel {
    pub classifier: Arc<dyn Classifier>,
    pub metadata: ModelMetadata,
}

/// Hex SHA-256 of the artifact bytes
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Compare against an expected digest (case-insensitive hex)
pub fn verify_checksum(bytes: &[u8], expected: &str) -> Result<String, ModelError> {
    let actual = sha256_hex(bytes);
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(ModelError::Checksum {
            expected: expected.trim().to_lowercase(),
            actual,
        });
    }
    Ok(actual)
}

/// Load a model artifact, dispatching on its extension
pub fn load_model(path: &Path, expected_sha256: Option<&str>) -> Result<LoadedModel, ModelError> {
    log::info!("Loading model from: {}", path.display());

    let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let sha256 = match expected_sha256 {
        Some(expected) => verify_checksum(&bytes, expected)?,
        None => sha256_hex(&bytes),
    };

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let classifier: Arc<dyn Classifier> = match extension.as_str() {
        "json" => Arc::new(KnnPipeline::from_slice(&bytes)?),
        "onnx" => {
            let sidecar = OnnxSidecar::load(path)?;
            Arc::new(OnnxClassifier::from_memory(&bytes, sidecar)?)
        }
        other => return Err(ModelError::UnsupportedFormat(format!("{:?}", other))),
    };

    let metadata = ModelMetadata {
        model_path: path.display().to_string(),
        model_type: classifier.model_type().to_string(),
        sha256,
        classes: classifier.classes(),
        feature_version: FEATURE_VERSION,
        layout_hash: layout_hash(),
        loaded_at: Utc::now(),
    };

    log::info!(
        "Model loaded: {} ({} classes, sha256 {}...)",
        metadata.model_type,
        metadata.classes.len(),
        &metadata.sha256[..12]
    );

    Ok(LoadedModel { classifier, metadata })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::features::FeatureVector;
    use crate::logic::model::Weights;

    fn write_knn(dir: &Path) -> std::path::PathBuf {
        let samples = [[1.0, 0.5, 2.0], [1.1, 0.6, 2.1], [4.0, 3.0, 0.5], [4.2, 3.1, 0.4]];
        let knn = KnnPipeline::fit(&samples, &["rose", "rose", "oud", "oud"], 1, Weights::Uniform)
            .unwrap();
        let path = dir.join("model.json");
        knn.save(&path).unwrap();
        path
    }

    #[test]
    fn test_load_knn_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_knn(dir.path());

        let loaded = load_model(&path, None).unwrap();
        assert_eq!(loaded.metadata.model_type, "knn");
        assert_eq!(loaded.metadata.classes, vec!["oud", "rose"]);
        assert_eq!(loaded.metadata.sha256.len(), 64);

        let label = loaded
            .classifier
            .predict(&FeatureVector::from_values([1.0, 0.5, 2.0]))
            .unwrap();
        assert_eq!(label, "rose");
    }

    #[test]
    fn test_checksum_verified() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_knn(dir.path());
        let digest = sha256_hex(&std::fs::read(&path).unwrap());

        assert!(load_model(&path, Some(&digest.to_uppercase())).is_ok());

        let err = load_model(&path, Some("00ff")).err().unwrap();
        assert!(matches!(err, ModelError::Checksum { .. }));
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_missing_file() {
        let err = load_model(Path::new("/nonexistent/model.json"), None).err().unwrap();
        assert!(matches!(err, ModelError::Io { .. }));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.pkl");
        std::fs::write(&path, b"\x80\x04").unwrap();

        let err = load_model(&path, None).err().unwrap();
        assert!(matches!(err, ModelError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_onnx_without_sidecar_fails_before_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scentify.onnx");
        std::fs::write(&path, b"not a graph").unwrap();

        let err = load_model(&path, None).err().unwrap();
        assert!(matches!(err, ModelError::Io { .. }));
    }

    #[test]
    fn test_load_onnx_artifact_with_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scentify.onnx");
        std::fs::write(&path, include_bytes!("testdata/scores_3x4.onnx")).unwrap();
        std::fs::write(
            OnnxSidecar::path_for(&path),
            serde_json::json!({ "labels": ["chanel", "dior", "gucci", "ysl"] }).to_string(),
        )
        .unwrap();

        let loaded = load_model(&path, None).unwrap();
        assert_eq!(loaded.metadata.model_type, "onnx");
        assert_eq!(loaded.metadata.classes, vec!["chanel", "dior", "gucci", "ysl"]);

        let label = loaded
            .classifier
            .predict(&FeatureVector::from_values([0.1, 0.2, 0.9]))
            .unwrap();
        assert_eq!(label, "gucci");
    }
}
