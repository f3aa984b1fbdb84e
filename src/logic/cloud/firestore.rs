//! Firestore REST client
//!
//! Upserts one fixed document through `documents:commit`. The write has no
//! precondition (create or replace) and a `REQUEST_TIME` transform fills
//! `timestamp` on the server.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{build_http_client, CloudError, PredictionDocumentSink};
use crate::logic::config::FirestoreConfig;

pub struct FirestoreClient {
    config: FirestoreConfig,
    auth_token: Option<String>,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    #[serde(default)]
    pub write_results: Vec<Value>,
    #[serde(default)]
    pub commit_time: Option<String>,
}

impl FirestoreClient {
    pub fn new(
        config: FirestoreConfig,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, CloudError> {
        Ok(Self {
            config,
            auth_token,
            http_client: build_http_client(timeout)?,
        })
    }

    fn database(&self) -> String {
        format!("projects/{}/databases/(default)", self.config.project_id)
    }

    /// Full resource name of the prediction document
    pub fn document_name(&self) -> String {
        format!(
            "{}/documents/{}/{}",
            self.database(),
            self.config.collection,
            self.config.document
        )
    }

    pub fn commit_url(&self) -> String {
        format!("{}/{}/documents:commit", self.config.url, self.database())
    }

    /// Commit request replacing the document with `{prediction}` and a server timestamp
    pub fn commit_body(&self, label: &str) -> Value {
        json!({
            "writes": [{
                "update": {
                    "name": self.document_name(),
                    "fields": {
                        "prediction": { "stringValue": label }
                    }
                },
                "updateTransforms": [{
                    "fieldPath": "timestamp",
                    "setToServerValue": "REQUEST_TIME"
                }]
            }]
        })
    }
}

#[async_trait]
impl PredictionDocumentSink for FirestoreClient {
    async fn upsert_prediction(&self, label: &str) -> Result<(), CloudError> {
        let mut request = self
            .http_client
            .post(self.commit_url())
            .json(&self.commit_body(label));

        if let Some(token) = &self.auth_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| CloudError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CloudError::from_response(response).await);
        }

        let result: CommitResponse = response
            .json()
            .await
            .map_err(|e| CloudError::ParseError(e.to_string()))?;

        log::debug!(
            "Firestore commit ok ({} writes, at {})",
            result.write_results.len(),
            result.commit_time.as_deref().unwrap_or("?")
        );
        Ok(())
    }
}
