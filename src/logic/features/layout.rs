//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the feature schema shared with the training pipeline.**
//!
//! The remote sensor store names its channels `MQ3`, `MQ4`, `MQ135`; the
//! models were trained on columns `MQ-3`, `MQ-4`, `MQ-135` in that order.
//! `SENSOR_FIELDS` is the only place that maps one onto the other.
//!
//! ## Rules:
//! 1. Add channel → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove channel → increment FEATURE_VERSION

use crc32fast::Hasher;
use thiserror::Error;

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// One sensor channel: where it lives in the store and what the model calls it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorField {
    /// Key in the remote sensor snapshot
    pub store_key: &'static str,
    /// Column name used at training time
    pub feature_name: &'static str,
}

/// Sensor channels in the exact order the model expects them
pub const SENSOR_FIELDS: [SensorField; FEATURE_COUNT] = [
    SensorField { store_key: "MQ3", feature_name: "MQ-3" },     // 0: alcohol
    SensorField { store_key: "MQ4", feature_name: "MQ-4" },     // 1: methane
    SensorField { store_key: "MQ135", feature_name: "MQ-135" }, // 2: air quality
];

/// Total number of features
pub const FEATURE_COUNT: usize = 3;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of the feature layout
pub fn compute_layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[FEATURE_VERSION]);

    for field in &SENSOR_FIELDS {
        hasher.update(field.feature_name.as_bytes());
        hasher.update(&[0]);
    }

    hasher.finalize()
}

/// Get layout hash
pub fn layout_hash() -> u32 {
    compute_layout_hash()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for logging
#[derive(Debug, Clone)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: feature_names().iter().map(|s| s.to_string()).collect(),
        }
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// A model artifact was trained against a different feature layout
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutMismatchError {
    #[error("model expects {actual} features, poller produces {expected}")]
    Width { expected: usize, actual: usize },

    #[error("model feature order {actual:?} does not match {expected:?}")]
    Names {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error(
        "model was built for layout v{actual_version:?} (hash {actual_hash:?}), \
         poller uses v{expected_version} (hash {expected_hash:08x})"
    )]
    Declared {
        expected_version: u8,
        expected_hash: u32,
        actual_version: Option<u8>,
        actual_hash: Option<u32>,
    },
}

/// Model-side feature names, in vector order
pub fn feature_names() -> [&'static str; FEATURE_COUNT] {
    SENSOR_FIELDS.map(|f| f.feature_name)
}

/// Validate the feature width an artifact was trained with
pub fn validate_width(actual: usize) -> Result<(), LayoutMismatchError> {
    if actual != FEATURE_COUNT {
        return Err(LayoutMismatchError::Width {
            expected: FEATURE_COUNT,
            actual,
        });
    }
    Ok(())
}

/// Validate the feature names an artifact declares (order matters)
pub fn validate_names(actual: &[String]) -> Result<(), LayoutMismatchError> {
    validate_width(actual.len())?;

    let expected = feature_names();
    if actual.iter().zip(expected.iter()).any(|(a, e)| a != e) {
        return Err(LayoutMismatchError::Names {
            expected: expected.iter().map(|s| s.to_string()).collect(),
            actual: actual.to_vec(),
        });
    }
    Ok(())
}

/// Validate the layout version/hash an artifact was stamped with.
/// Artifacts that declare nothing are accepted.
pub fn validate_declared(version: Option<u8>, hash: Option<u32>) -> Result<(), LayoutMismatchError> {
    let version_ok = version.map_or(true, |v| v == FEATURE_VERSION);
    let hash_ok = hash.map_or(true, |h| h == layout_hash());

    if !version_ok || !hash_ok {
        return Err(LayoutMismatchError::Declared {
            expected_version: FEATURE_VERSION,
            expected_hash: layout_hash(),
            actual_version: version,
            actual_hash: hash,
        });
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_field_table() {
        assert_eq!(SENSOR_FIELDS.len(), FEATURE_COUNT);
        let keys: Vec<&str> = SENSOR_FIELDS.iter().map(|f| f.store_key).collect();
        assert_eq!(keys, ["MQ3", "MQ4", "MQ135"]);
    }

    #[test]
    fn test_feature_names_follow_training_columns() {
        assert_eq!(feature_names(), ["MQ-3", "MQ-4", "MQ-135"]);
    }

    #[test]
    fn test_layout_hash_consistency() {
        assert_eq!(compute_layout_hash(), compute_layout_hash());
        assert_ne!(layout_hash(), 0);
    }

    #[test]
    fn test_validate_width() {
        assert!(validate_width(3).is_ok());
        assert_eq!(
            validate_width(4),
            Err(LayoutMismatchError::Width { expected: 3, actual: 4 })
        );
    }

    #[test]
    fn test_validate_names_order_matters() {
        let good: Vec<String> = vec!["MQ-3".into(), "MQ-4".into(), "MQ-135".into()];
        assert!(validate_names(&good).is_ok());

        let swapped: Vec<String> = vec!["MQ-135".into(), "MQ-3".into(), "MQ-4".into()];
        assert!(matches!(
            validate_names(&swapped),
            Err(LayoutMismatchError::Names { .. })
        ));
    }

    #[test]
    fn test_validate_declared() {
        assert!(validate_declared(None, None).is_ok());
        assert!(validate_declared(Some(FEATURE_VERSION), Some(layout_hash())).is_ok());
        assert!(validate_declared(Some(FEATURE_VERSION), None).is_ok());

        assert_eq!(
            validate_declared(Some(99), None),
            Err(LayoutMismatchError::Declared {
                expected_version: FEATURE_VERSION,
                expected_hash: layout_hash(),
                actual_version: Some(99),
                actual_hash: None,
            })
        );
        assert!(matches!(
            validate_declared(Some(FEATURE_VERSION), Some(12345)),
            Err(LayoutMismatchError::Declared { .. })
        ));
    }

    #[test]
    fn test_layout_info() {
        let info = LayoutInfo::current();
        assert_eq!(info.version, FEATURE_VERSION);
        assert_eq!(info.feature_count, FEATURE_COUNT);
        assert_eq!(info.feature_names, vec!["MQ-3", "MQ-4", "MQ-135"]);
    }
}
