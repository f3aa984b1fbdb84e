//! Realtime Database REST client
//!
//! `GET {url}/{path}.json` reads a node (`null` when empty),
//! `PUT {url}/{path}.json` overwrites it.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{build_http_client, CloudError, PredictionSink, SensorSource};
use crate::logic::config::RealtimeDbConfig;

pub struct RealtimeDbClient {
    config: RealtimeDbConfig,
    auth_token: Option<String>,
    http_client: reqwest::Client,
}

impl RealtimeDbClient {
    pub fn new(
        config: RealtimeDbConfig,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, CloudError> {
        Ok(Self {
            config,
            auth_token,
            http_client: build_http_client(timeout)?,
        })
    }

    /// REST URL of a database node
    pub fn node_url(&self, path: &str) -> String {
        format!("{}/{}.json", self.config.url, path.trim_matches('/'))
    }

    fn auth_query(&self) -> Vec<(&'static str, &str)> {
        match &self.auth_token {
            Some(token) => vec![("auth", token.as_str())],
            None => Vec::new(),
        }
    }

    /// Body written to the prediction slot
    pub fn prediction_body(label: &str) -> Value {
        json!({ "prediction": label })
    }
}

#[async_trait]
impl SensorSource for RealtimeDbClient {
    async fn fetch_snapshot(&self) -> Result<Option<Value>, CloudError> {
        let url = self.node_url(&self.config.sensor_path);

        let response = self
            .http_client
            .get(&url)
            .query(&self.auth_query())
            .send()
            .await
            .map_err(|e| CloudError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CloudError::from_response(response).await);
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| CloudError::ParseError(e.to_string()))?;

        Ok(match value {
            Value::Null => None,
            other => Some(other),
        })
    }
}

#[async_trait]
impl PredictionSink for RealtimeDbClient {
    async fn set_prediction(&self, label: &str) -> Result<(), CloudError> {
        let url = self.node_url(&self.config.prediction_path);

        let response = self
            .http_client
            .put(&url)
            .query(&self.auth_query())
            .json(&Self::prediction_body(label))
            .send()
            .await
            .map_err(|e| CloudError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CloudError::from_response(response).await)
        }
    }
}
