//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Every value can be overridden from the environment (or a `.env` file).

/// Default Realtime Database URL (local emulator)
pub const DEFAULT_RTDB_URL: &str = "http://localhost:9000";

/// Path holding the latest sensor snapshot
pub const DEFAULT_SENSOR_PATH: &str = "latestSensorData";

/// Path overwritten with the latest prediction
pub const DEFAULT_PREDICTION_PATH: &str = "prediction";

/// Default Firestore REST endpoint
pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";

/// Default Firestore project
pub const DEFAULT_FIRESTORE_PROJECT: &str = "scentify";

/// Firestore collection / document receiving the upserted prediction
pub const DEFAULT_FIRESTORE_COLLECTION: &str = "scentify";
pub const DEFAULT_FIRESTORE_DOCUMENT: &str = "currentPrediction";

/// Default model artifact
pub const DEFAULT_MODEL_PATH: &str = "model.json";

/// Default polling interval (seconds)
pub const DEFAULT_POLL_INTERVAL: u64 = 5;

/// Default backoff ceiling (seconds). 0 disables backoff.
pub const DEFAULT_BACKOFF_MAX: u64 = 0;

/// Default HTTP request timeout (seconds)
pub const DEFAULT_HTTP_TIMEOUT: u64 = 30;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Scentify Poller";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Read an optional string variable (unset or blank => None)
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
