//! Model Module - Scent classification
//!
//! The poller only sees `dyn Classifier`. Two artifact formats are supported:
//! - `*.json` - scale-then-k-NN pipeline (`knn`)
//! - `*.onnx` - ONNX graph + `*.meta.json` sidecar (`onnx`)

pub mod knn;
pub mod loader;
pub mod onnx;
pub mod scaler;

use std::path::PathBuf;

use thiserror::Error;

use crate::logic::features::layout::LayoutMismatchError;
use crate::logic::features::FeatureVector;

pub use knn::{KnnPipeline, Weights};
pub use loader::{load_model, LoadedModel, ModelMetadata};
pub use onnx::OnnxClassifier;
pub use scaler::StandardScaler;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("model checksum mismatch: expected {expected}, got {actual}")]
    Checksum { expected: String, actual: String },

    #[error("unsupported model format: {0}")]
    UnsupportedFormat(String),

    #[error("malformed model artifact: {0}")]
    Format(String),

    #[error(transparent)]
    Layout(#[from] LayoutMismatchError),

    #[error("ONNX runtime error: {0}")]
    Onnx(String),

    #[error("inference failed: {0}")]
    Inference(String),
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// A loaded, immutable scent classifier
pub trait Classifier: Send + Sync {
    /// Predict the label of a single sample
    fn predict(&self, features: &FeatureVector) -> Result<String, ModelError>;

    /// Short format name for logs ("knn", "onnx")
    fn model_type(&self) -> &'static str;

    /// Labels this model can emit
    fn classes(&self) -> Vec<String>;
}
