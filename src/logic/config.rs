//! Poller configuration
//!
//! Loaded once at startup from the environment. Defaults live in `constants.rs`.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::constants;

/// Configuration errors (fatal at startup)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },

    #[error("{key} must be an http(s) URL, got {value:?}")]
    InvalidUrl { key: &'static str, value: String },
}

/// Realtime Database endpoint and paths
#[derive(Debug, Clone)]
pub struct RealtimeDbConfig {
    pub url: String,
    pub sensor_path: String,
    pub prediction_path: String,
}

/// Firestore endpoint and target document
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub url: String,
    pub project_id: String,
    pub collection: String,
    pub document: String,
}

/// Full application configuration
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub realtime_db: RealtimeDbConfig,
    pub firestore: FirestoreConfig,
    /// Opaque access token shared by both stores
    pub auth_token: Option<String>,
    pub model_path: PathBuf,
    /// Expected SHA-256 of the model artifact (hex)
    pub model_sha256: Option<String>,
    pub poll_interval: Duration,
    /// Backoff ceiling; zero disables backoff
    pub backoff_max: Duration,
    pub http_timeout: Duration,
}

impl PollerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(constants::env_opt)
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let secs = |key: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(key) {
                Some(raw) => raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                    key,
                    value: raw,
                }),
                None => Ok(default),
            }
        };

        let poll_interval = secs("POLL_INTERVAL_SECS", constants::DEFAULT_POLL_INTERVAL)?;
        if poll_interval == 0 {
            return Err(ConfigError::Zero { key: "POLL_INTERVAL_SECS" });
        }
        let http_timeout = secs("HTTP_TIMEOUT_SECS", constants::DEFAULT_HTTP_TIMEOUT)?;
        if http_timeout == 0 {
            return Err(ConfigError::Zero { key: "HTTP_TIMEOUT_SECS" });
        }
        let backoff_max = secs("POLL_BACKOFF_MAX_SECS", constants::DEFAULT_BACKOFF_MAX)?;

        let rtdb_url = validate_url("RTDB_URL", get("RTDB_URL", constants::DEFAULT_RTDB_URL))?;
        let firestore_url = validate_url(
            "FIRESTORE_URL",
            get("FIRESTORE_URL", constants::DEFAULT_FIRESTORE_URL),
        )?;

        Ok(Self {
            realtime_db: RealtimeDbConfig {
                url: rtdb_url,
                sensor_path: trim_path(&get("RTDB_SENSOR_PATH", constants::DEFAULT_SENSOR_PATH)),
                prediction_path: trim_path(&get(
                    "RTDB_PREDICTION_PATH",
                    constants::DEFAULT_PREDICTION_PATH,
                )),
            },
            firestore: FirestoreConfig {
                url: firestore_url,
                project_id: get("FIRESTORE_PROJECT_ID", constants::DEFAULT_FIRESTORE_PROJECT),
                collection: trim_path(&get(
                    "FIRESTORE_COLLECTION",
                    constants::DEFAULT_FIRESTORE_COLLECTION,
                )),
                document: trim_path(&get("FIRESTORE_DOCUMENT", constants::DEFAULT_FIRESTORE_DOCUMENT)),
            },
            auth_token: lookup("FIREBASE_AUTH_TOKEN"),
            model_path: PathBuf::from(get("MODEL_PATH", constants::DEFAULT_MODEL_PATH)),
            model_sha256: lookup("MODEL_SHA256").map(|s| s.to_lowercase()),
            poll_interval: Duration::from_secs(poll_interval),
            backoff_max: Duration::from_secs(backoff_max),
            http_timeout: Duration::from_secs(http_timeout),
        })
    }

    /// Backoff is active only when its ceiling exceeds the base interval
    pub fn backoff_enabled(&self) -> bool {
        self.backoff_max > self.poll_interval
    }
}

fn validate_url(key: &'static str, value: String) -> Result<String, ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(ConfigError::InvalidUrl { key, value })
    }
}

fn trim_path(path: &str) -> String {
    path.trim_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PollerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.realtime_db.url, "http://localhost:9000");
        assert_eq!(config.realtime_db.sensor_path, "latestSensorData");
        assert_eq!(config.realtime_db.prediction_path, "prediction");
        assert_eq!(config.firestore.collection, "scentify");
        assert_eq!(config.firestore.document, "currentPrediction");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.model_path, PathBuf::from("model.json"));
        assert!(config.auth_token.is_none());
        assert!(!config.backoff_enabled());
    }

    #[test]
    fn test_overrides_and_normalization() {
        let config = PollerConfig::from_lookup(lookup_from(&[
            ("RTDB_URL", "https://scentify-default-rtdb.example.app/"),
            ("RTDB_SENSOR_PATH", "/devices/nose-1/latest/"),
            ("POLL_INTERVAL_SECS", " 2 "),
            ("POLL_BACKOFF_MAX_SECS", "60"),
            ("MODEL_SHA256", "ABCDEF"),
        ]))
        .unwrap();

        assert_eq!(config.realtime_db.url, "https://scentify-default-rtdb.example.app");
        assert_eq!(config.realtime_db.sensor_path, "devices/nose-1/latest");
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.model_sha256.as_deref(), Some("abcdef"));
        assert!(config.backoff_enabled());
    }

    #[test]
    fn test_invalid_interval_rejected() {
        let err = PollerConfig::from_lookup(lookup_from(&[("POLL_INTERVAL_SECS", "five")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { key: "POLL_INTERVAL_SECS", .. }));

        let err = PollerConfig::from_lookup(lookup_from(&[("POLL_INTERVAL_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Zero { .. }));

        let err = PollerConfig::from_lookup(lookup_from(&[("HTTP_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Zero { key: "HTTP_TIMEOUT_SECS" }));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = PollerConfig::from_lookup(lookup_from(&[("RTDB_URL", "localhost:9000")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { key: "RTDB_URL", .. }));
    }
}
