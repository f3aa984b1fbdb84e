//! Cloud Module - Remote stores
//!
//! This module handles:
//! - Reading the latest sensor snapshot (Realtime Database)
//! - Overwriting the prediction slot (Realtime Database)
//! - Upserting the prediction document (Firestore)
//!
//! The poller depends on the traits only, so tests swap in fakes.

pub mod firestore;
pub mod realtime_db;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use firestore::FirestoreClient;
pub use realtime_db::RealtimeDbClient;

/// Remote store errors
#[derive(Debug, Clone, Error)]
pub enum CloudError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Server error: {0} {1}")]
    ServerError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unauthorized")]
    Unauthorized,
}

impl CloudError {
    /// Map a non-success response into an error, keeping a short body excerpt
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Self::Unauthorized;
        }
        let body = response.text().await.unwrap_or_default();
        Self::ServerError(status, body.chars().take(200).collect())
    }
}

/// Source of sensor snapshots
#[async_trait]
pub trait SensorSource: Send + Sync {
    /// Latest snapshot, or `None` when nothing has been written yet
    async fn fetch_snapshot(&self) -> Result<Option<Value>, CloudError>;
}

/// Key-value prediction slot (full overwrite)
#[async_trait]
pub trait PredictionSink: Send + Sync {
    async fn set_prediction(&self, label: &str) -> Result<(), CloudError>;
}

/// Document store prediction record (upsert with server timestamp)
#[async_trait]
pub trait PredictionDocumentSink: Send + Sync {
    async fn upsert_prediction(&self, label: &str) -> Result<(), CloudError>;
}

/// Shared HTTP client settings
pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client, CloudError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(format!(
            "{}/{}",
            env!("CARGO_PKG_NAME"),
            crate::constants::APP_VERSION
        ))
        .build()
        .map_err(|e| CloudError::NetworkError(format!("Failed to create HTTP client: {}", e)))
}
