//! Feature Vector - Core data structure for ML input
//!
//! Built from a raw sensor snapshot through the `SENSOR_FIELDS` table,
//! never from the snapshot's own key order.

use serde_json::{Map, Value};

use super::layout::{layout_hash, FEATURE_COUNT, FEATURE_VERSION, SENSOR_FIELDS};

// ============================================================================
// FEATURE VECTOR
// ============================================================================

/// Fixed-order sensor readings: [MQ-3, MQ-4, MQ-135]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub values: [f32; FEATURE_COUNT],
}

impl FeatureVector {
    /// Create a zeroed feature vector
    pub fn new() -> Self {
        Self {
            values: [0.0; FEATURE_COUNT],
        }
    }

    pub fn from_values(values: [f32; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    /// Build from a sensor snapshot, defaulting missing or malformed channels to 0.0
    pub fn from_snapshot(snapshot: &Map<String, Value>) -> Featurized {
        let mut vector = Self::new();
        let mut defaulted = Vec::new();

        for (index, field) in SENSOR_FIELDS.iter().enumerate() {
            match coerce_reading(snapshot.get(field.store_key)) {
                Ok(value) => vector.values[index] = value,
                Err(reason) => defaulted.push(DefaultedField {
                    store_key: field.store_key,
                    reason,
                }),
            }
        }

        Featurized { vector, defaulted }
    }

    pub fn as_array(&self) -> &[f32; FEATURE_COUNT] {
        &self.values
    }

    /// JSON form for logging
    pub fn to_log_entry(&self) -> Value {
        serde_json::json!({
            "feature_version": FEATURE_VERSION,
            "layout_hash": layout_hash(),
            "values": SENSOR_FIELDS.iter()
                .zip(self.values.iter())
                .map(|(field, value)| (field.feature_name.to_string(), Value::from(*value as f64)))
                .collect::<Map<String, Value>>(),
        })
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// SNAPSHOT COERCION
// ============================================================================

/// Result of featurizing one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Featurized {
    pub vector: FeatureVector,
    /// Channels that fell back to 0.0
    pub defaulted: Vec<DefaultedField>,
}

/// A channel that could not be read and was substituted with 0.0
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultedField {
    pub store_key: &'static str,
    pub reason: DefaultReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DefaultReason {
    Missing,
    Null,
    NotNumeric(String),
    NonFinite,
}

impl std::fmt::Display for DefaultReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::Null => write!(f, "null"),
            Self::NotNumeric(raw) => write!(f, "not numeric ({})", raw),
            Self::NonFinite => write!(f, "not finite"),
        }
    }
}

/// Coerce one raw reading to f32.
///
/// Numbers pass through, strings are trimmed and parsed, booleans are 1/0.
/// Finite readings beyond the f32 range saturate at `f32::MAX` / `f32::MIN`
/// instead of being dropped; only NaN and infinities default to 0.0.
pub fn coerce_reading(raw: Option<&Value>) -> Result<f32, DefaultReason> {
    let value = match raw {
        None => return Err(DefaultReason::Missing),
        Some(Value::Null) => return Err(DefaultReason::Null),
        Some(Value::Number(n)) => n.as_f64().map(narrow),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().map(narrow),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        Some(other) => return Err(DefaultReason::NotNumeric(truncate(other.to_string()))),
    };

    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(_) => Err(DefaultReason::NonFinite),
        None => Err(DefaultReason::NotNumeric(truncate(
            raw.map(|v| v.to_string()).unwrap_or_default(),
        ))),
    }
}

/// f64 -> f32 without overflowing finite values to infinity
fn narrow(v: f64) -> f32 {
    if v.is_finite() {
        v.clamp(f32::MIN as f64, f32::MAX as f64) as f32
    } else {
        v as f32
    }
}

fn truncate(mut s: String) -> String {
    const MAX: usize = 32;
    if s.len() > MAX {
        let mut end = MAX;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        s.truncate(end);
        s.push('…');
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_numbers_and_strings() {
        assert_eq!(coerce_reading(Some(&json!(1.5))), Ok(1.5));
        assert_eq!(coerce_reading(Some(&json!(42))), Ok(42.0));
        assert_eq!(coerce_reading(Some(&json!(" 0.8 "))), Ok(0.8));
        assert_eq!(coerce_reading(Some(&json!(true))), Ok(1.0));
    }

    #[test]
    fn test_coerce_failures() {
        assert_eq!(coerce_reading(None), Err(DefaultReason::Missing));
        assert_eq!(coerce_reading(Some(&Value::Null)), Err(DefaultReason::Null));
        assert_eq!(coerce_reading(Some(&json!("inf"))), Err(DefaultReason::NonFinite));
        assert!(matches!(
            coerce_reading(Some(&json!("bad"))),
            Err(DefaultReason::NotNumeric(_))
        ));
        assert!(matches!(
            coerce_reading(Some(&json!([1, 2]))),
            Err(DefaultReason::NotNumeric(_))
        ));
    }

    #[test]
    fn test_truncate_long_values() {
        let long = "x".repeat(100);
        let out = truncate(long);
        assert!(out.ends_with('…'));
        assert!(out.len() < 40);
    }

    #[test]
    fn test_out_of_f32_range_saturates() {
        assert_eq!(coerce_reading(Some(&json!(1e39))), Ok(f32::MAX));
        assert_eq!(coerce_reading(Some(&json!(-1e39))), Ok(f32::MIN));
        assert_eq!(coerce_reading(Some(&json!("1e39"))), Ok(f32::MAX));
        assert_eq!(coerce_reading(Some(&json!("-inf"))), Err(DefaultReason::NonFinite));
    }
}
