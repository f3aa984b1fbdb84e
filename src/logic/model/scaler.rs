//! Standard scaler
//!
//! Zero-mean / unit-variance standardization fitted at training time.
//! Applied before every classifier, both k-NN and ONNX.

use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::logic::features::layout::validate_width;
use crate::logic::features::{FeatureVector, FEATURE_COUNT};

/// Per-feature mean and scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f32>,
    pub scale: Vec<f32>,
}

impl StandardScaler {
    /// Fit on raw samples (population standard deviation).
    ///
    /// Constant columns get scale 1.0 so they pass through centered.
    pub fn fit(samples: &[[f32; FEATURE_COUNT]]) -> Result<Self, ModelError> {
        if samples.is_empty() {
            return Err(ModelError::Format("cannot fit scaler on zero samples".to_string()));
        }

        let n = samples.len() as f64;
        let mut mean = vec![0.0f32; FEATURE_COUNT];
        let mut scale = vec![1.0f32; FEATURE_COUNT];

        for j in 0..FEATURE_COUNT {
            let m = samples.iter().map(|s| s[j] as f64).sum::<f64>() / n;
            let var = samples
                .iter()
                .map(|s| (s[j] as f64 - m).powi(2))
                .sum::<f64>()
                / n;
            let std = var.sqrt();

            mean[j] = m as f32;
            scale[j] = if std > f64::EPSILON { std as f32 } else { 1.0 };
        }

        Ok(Self { mean, scale })
    }

    /// Check widths and that no scale is zero or non-finite
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_width(self.mean.len())?;
        validate_width(self.scale.len())?;

        if self.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(ModelError::Format("scaler scale must be finite and non-zero".to_string()));
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(ModelError::Format("scaler mean must be finite".to_string()));
        }
        Ok(())
    }

    pub fn transform(&self, features: &FeatureVector) -> [f32; FEATURE_COUNT] {
        self.transform_values(features.as_array())
    }

    pub fn transform_values(&self, values: &[f32; FEATURE_COUNT]) -> [f32; FEATURE_COUNT] {
        let mut out = [0.0f32; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            out[i] = (values[i] - self.mean[i]) / self.scale[i];
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_mean_and_population_std() {
        let scaler = StandardScaler::fit(&[[1.0, 10.0, 5.0], [3.0, 30.0, 5.0]]).unwrap();
        assert_eq!(scaler.mean, vec![2.0, 20.0, 5.0]);
        // Constant column keeps scale 1.0
        assert_eq!(scaler.scale, vec![1.0, 10.0, 1.0]);
    }

    #[test]
    fn test_transform() {
        let scaler = StandardScaler::fit(&[[1.0, 10.0, 5.0], [3.0, 30.0, 5.0]]).unwrap();
        let out = scaler.transform(&FeatureVector::from_values([3.0, 10.0, 7.0]));
        assert_eq!(out, [1.0, -1.0, 2.0]);
    }

    #[test]
    fn test_validate_rejects_bad_params() {
        let s = StandardScaler { mean: vec![0.0; 3], scale: vec![1.0, 0.0, 1.0] };
        assert!(s.validate().is_err());

        let s = StandardScaler { mean: vec![0.0; 2], scale: vec![1.0; 2] };
        assert!(matches!(s.validate(), Err(ModelError::Layout(_))));
    }

    #[test]
    fn test_fit_empty_fails() {
        assert!(StandardScaler::fit(&[]).is_err());
    }
}
