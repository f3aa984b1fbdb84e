//! Featurization tests over whole snapshots.

#[cfg(test)]
mod integration_tests {
    use crate::logic::features::{DefaultReason, FeatureVector};
    use serde_json::{json, Map, Value};

    fn snapshot(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("test snapshot must be an object")
    }

    /// Key order in the store never changes vector order
    #[test]
    fn test_fixed_order_regardless_of_key_order() {
        let a = snapshot(json!({"MQ3": 1.2, "MQ4": 0.8, "MQ135": 3.0}));
        let b = snapshot(json!({"MQ135": 3.0, "MQ3": 1.2, "MQ4": 0.8}));

        let fa = FeatureVector::from_snapshot(&a);
        let fb = FeatureVector::from_snapshot(&b);

        assert_eq!(fa.vector.values, [1.2, 0.8, 3.0]);
        assert_eq!(fa.vector, fb.vector);
        assert!(fa.defaulted.is_empty());
    }

    /// String readings as written by the device firmware
    #[test]
    fn test_string_readings() {
        let s = snapshot(json!({"MQ3": "1.2", "MQ4": "0.8", "MQ135": "3.0"}));
        let f = FeatureVector::from_snapshot(&s);
        assert_eq!(f.vector.values, [1.2, 0.8, 3.0]);
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let s = snapshot(json!({"MQ4": 0.8}));
        let f = FeatureVector::from_snapshot(&s);

        assert_eq!(f.vector.values, [0.0, 0.8, 0.0]);
        let keys: Vec<_> = f.defaulted.iter().map(|d| d.store_key).collect();
        assert_eq!(keys, vec!["MQ3", "MQ135"]);
        assert!(f.defaulted.iter().all(|d| d.reason == DefaultReason::Missing));
    }

    #[test]
    fn test_malformed_field_defaults_to_zero() {
        let s = snapshot(json!({"MQ3": "bad", "MQ4": "0.8", "MQ135": "3.0"}));
        let f = FeatureVector::from_snapshot(&s);

        assert_eq!(f.vector.values, [0.0, 0.8, 3.0]);
        assert_eq!(f.defaulted.len(), 1);
        assert_eq!(f.defaulted[0].store_key, "MQ3");
    }

    #[test]
    fn test_extra_keys_ignored() {
        let s = snapshot(json!({
            "MQ3": 1, "MQ4": 2, "MQ135": 3,
            "timestamp": "2025-03-01T10:00:00Z", "device": "nose-1"
        }));
        let f = FeatureVector::from_snapshot(&s);
        assert_eq!(f.vector.values, [1.0, 2.0, 3.0]);
        assert!(f.defaulted.is_empty());
    }

    #[test]
    fn test_empty_snapshot() {
        let f = FeatureVector::from_snapshot(&Map::new());
        assert_eq!(f.vector.values, [0.0; 3]);
        assert_eq!(f.defaulted.len(), 3);
    }

    #[test]
    fn test_log_entry_uses_model_names() {
        let v = FeatureVector::from_values([1.0, 2.0, 3.0]);
        let entry = v.to_log_entry();
        assert_eq!(entry["values"]["MQ-3"], json!(1.0));
        assert_eq!(entry["values"]["MQ-135"], json!(3.0));
    }
}
