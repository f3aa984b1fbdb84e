//! k-Nearest-Neighbors pipeline
//!
//! Serialized scale-then-classify pipeline: a `StandardScaler` followed by a
//! k-NN vote over standardized training samples. Stored as JSON.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::scaler::StandardScaler;
use super::{Classifier, ModelError};
use crate::logic::features::layout::{
    feature_names, layout_hash, validate_declared, validate_names, validate_width, FEATURE_VERSION,
};
use crate::logic::features::{FeatureVector, FEATURE_COUNT};

/// Neighbor vote weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weights {
    /// One vote per neighbor
    #[default]
    Uniform,
    /// Votes weighted by 1 / distance
    Distance,
}

/// Persisted k-NN pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnPipeline {
    /// Training column order; empty means "not recorded"
    #[serde(default)]
    pub feature_names: Vec<String>,
    /// Layout the samples were built with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_version: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_hash: Option<u32>,
    pub scaler: StandardScaler,
    pub n_neighbors: usize,
    #[serde(default)]
    pub weights: Weights,
    /// Standardized training samples
    pub samples: Vec<Vec<f32>>,
    pub labels: Vec<String>,
}

impl KnnPipeline {
    /// Fit scaler and store standardized samples
    pub fn fit<S: AsRef<str>>(
        samples: &[[f32; FEATURE_COUNT]],
        labels: &[S],
        n_neighbors: usize,
        weights: Weights,
    ) -> Result<Self, ModelError> {
        if samples.len() != labels.len() {
            return Err(ModelError::Format(format!(
                "{} samples but {} labels",
                samples.len(),
                labels.len()
            )));
        }

        let scaler = StandardScaler::fit(samples)?;
        let pipeline = Self {
            feature_names: feature_names().iter().map(|s| s.to_string()).collect(),
            feature_version: Some(FEATURE_VERSION),
            layout_hash: Some(layout_hash()),
            samples: samples
                .iter()
                .map(|s| scaler.transform_values(s).to_vec())
                .collect(),
            scaler,
            n_neighbors,
            weights,
            labels: labels.iter().map(|l| l.as_ref().to_string()).collect(),
        };

        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Parse from JSON bytes and validate
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        let pipeline: Self = serde_json::from_slice(bytes)
            .map_err(|e| ModelError::Format(format!("invalid k-NN artifact: {}", e)))?;
        pipeline.validate()?;
        Ok(pipeline)
    }

    /// Write as JSON
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| ModelError::Format(format!("serialize k-NN artifact: {}", e)))?;
        std::fs::write(path, json).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Structural checks; layout problems surface as `ModelError::Layout`
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_declared(self.feature_version, self.layout_hash)?;
        if !self.feature_names.is_empty() {
            validate_names(&self.feature_names)?;
        }
        self.scaler.validate()?;

        if self.samples.is_empty() {
            return Err(ModelError::Format("k-NN artifact has no samples".to_string()));
        }
        if self.samples.len() != self.labels.len() {
            return Err(ModelError::Format(format!(
                "{} samples but {} labels",
                self.samples.len(),
                self.labels.len()
            )));
        }
        for sample in &self.samples {
            validate_width(sample.len())?;
        }
        if self.n_neighbors == 0 || self.n_neighbors > self.samples.len() {
            return Err(ModelError::Format(format!(
                "n_neighbors must be in 1..={}, got {}",
                self.samples.len(),
                self.n_neighbors
            )));
        }
        Ok(())
    }

    /// Distinct class labels, sorted
    pub fn sorted_classes(&self) -> Vec<String> {
        let mut classes = self.labels.clone();
        classes.sort();
        classes.dedup();
        classes
    }

    fn vote(&self, query: &[f32; FEATURE_COUNT]) -> Result<String, ModelError> {
        let mut distances: Vec<(f32, usize)> = self
            .samples
            .iter()
            .enumerate()
            .map(|(i, sample)| {
                let d2: f32 = sample
                    .iter()
                    .zip(query.iter())
                    .map(|(a, b)| (a - b).powi(2))
                    .sum();
                (d2.sqrt(), i)
            })
            .collect();

        distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let neighbors = &distances[..self.n_neighbors.min(distances.len())];

        // Exact matches take the whole vote under distance weighting
        let exact = self.weights == Weights::Distance && neighbors.iter().any(|(d, _)| *d == 0.0);

        let mut votes: BTreeMap<&str, f64> = BTreeMap::new();
        for &(distance, index) in neighbors {
            let weight = match self.weights {
                Weights::Uniform => 1.0,
                Weights::Distance if exact => {
                    if distance == 0.0 { 1.0 } else { 0.0 }
                }
                Weights::Distance => 1.0 / distance as f64,
            };
            *votes.entry(self.labels[index].as_str()).or_insert(0.0) += weight;
        }

        // BTreeMap order: ties go to the smallest label
        let mut best: Option<(&str, f64)> = None;
        for (label, weight) in votes {
            if best.map_or(true, |(_, w)| weight > w) {
                best = Some((label, weight));
            }
        }

        best.map(|(label, _)| label.to_string())
            .ok_or_else(|| ModelError::Inference("no neighbors voted".to_string()))
    }
}

impl Classifier for KnnPipeline {
    fn predict(&self, features: &FeatureVector) -> Result<String, ModelError> {
        let query = self.scaler.transform(features);
        if query.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::Inference(format!(
                "standardized features not finite: {:?}",
                query
            )));
        }
        self.vote(&query)
    }

    fn model_type(&self) -> &'static str {
        "knn"
    }

    fn classes(&self) -> Vec<String> {
        self.sorted_classes()
    }
}
