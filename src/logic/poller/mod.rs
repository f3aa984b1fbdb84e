//! Inference Poller
//!
//! One cycle: fetch snapshot → featurize → predict → overwrite the
//! key-value slot → upsert the document. Any failure ends the cycle early,
//! is logged and the loop sleeps as usual. Nothing in a cycle can stop
//! the loop.

pub mod status;


use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use tokio::time::sleep;

use crate::logic::cloud::{CloudError, PredictionDocumentSink, PredictionSink, SensorSource};
use crate::logic::features::FeatureVector;
use crate::logic::model::{Classifier, ModelError};

pub use status::{PollerState, PollerStatus};

// ============================================================================
// OUTCOMES
// ============================================================================

/// A cycle that ran to completion
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Nothing stored at the sensor path yet
    NoData,
    /// Label written to both stores
    Published {
        label: String,
        features: FeatureVector,
    },
}

/// A cycle that stopped early. Never fatal to the loop.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("sensor fetch failed: {0}")]
    Fetch(#[source] CloudError),

    #[error("sensor snapshot is not an object: {0}")]
    MalformedPayload(String),

    #[error("prediction failed: {0}")]
    Model(#[source] ModelError),

    #[error("key-value publish failed: {0}")]
    PublishKeyValue(#[source] CloudError),

    #[error("document publish failed: {0}")]
    PublishDocument(#[source] CloudError),
}

impl CycleError {
    /// Failures of a remote call (these feed the backoff streak)
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Fetch(_) | Self::PublishKeyValue(_) | Self::PublishDocument(_)
        )
    }
}

// ============================================================================
// POLLER
// ============================================================================

pub struct InferencePoller {
    source: Arc<dyn SensorSource>,
    kv_sink: Arc<dyn PredictionSink>,
    doc_sink: Arc<dyn PredictionDocumentSink>,
    model: Arc<dyn Classifier>,
    interval: Duration,
    backoff_max: Duration,
    status: PollerStatus,
}

impl InferencePoller {
    pub fn new(
        source: Arc<dyn SensorSource>,
        kv_sink: Arc<dyn PredictionSink>,
        doc_sink: Arc<dyn PredictionDocumentSink>,
        model: Arc<dyn Classifier>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            kv_sink,
            doc_sink,
            model,
            interval,
            backoff_max: Duration::ZERO,
            status: PollerStatus::default(),
        }
    }

    /// Grow the wait after consecutive remote failures, up to `max`.
    /// A ceiling at or below the interval keeps the wait fixed.
    pub fn with_backoff(mut self, max: Duration) -> Self {
        self.backoff_max = max;
        self
    }

    pub fn status(&self) -> &PollerStatus {
        &self.status
    }

    /// Run forever
    pub async fn run(mut self) {
        log::info!(
            "Inference poller started (model: {}, interval: {}s)",
            self.model.model_type(),
            self.interval.as_secs_f32()
        );

        loop {
            let wait = self.tick().await;
            sleep(wait).await;
        }
    }

    /// One cycle plus bookkeeping; returns how long to sleep next
    pub async fn tick(&mut self) -> Duration {
        self.status.state = PollerState::Active;
        let result = self.run_cycle().await;
        self.record(&result);
        self.status.state = PollerState::Idle;

        log::debug!("Poller status: {}", self.status.summary());
        self.next_wait()
    }

    /// fetch → featurize → predict → publish
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, CycleError> {
        let snapshot = match self.source.fetch_snapshot().await.map_err(CycleError::Fetch)? {
            None => return Ok(CycleOutcome::NoData),
            Some(Value::Object(map)) if map.is_empty() => return Ok(CycleOutcome::NoData),
            Some(Value::Object(map)) => map,
            Some(other) => return Err(CycleError::MalformedPayload(json_kind(&other).to_string())),
        };

        let featurized = FeatureVector::from_snapshot(&snapshot);
        for field in &featurized.defaulted {
            log::warn!("Sensor field {} defaulted to 0.0 ({})", field.store_key, field.reason);
        }
        self.status.defaulted_fields += featurized.defaulted.len() as u64;
        let features = featurized.vector;

        let started = Instant::now();
        let label = self.model.predict(&features).map_err(CycleError::Model)?;
        log::debug!(
            "Predicted {:?} from {} in {}us",
            label,
            features.to_log_entry(),
            started.elapsed().as_micros()
        );

        self.kv_sink
            .set_prediction(&label)
            .await
            .map_err(CycleError::PublishKeyValue)?;

        self.doc_sink
            .upsert_prediction(&label)
            .await
            .map_err(CycleError::PublishDocument)?;

        Ok(CycleOutcome::Published { label, features })
    }

    fn record(&mut self, result: &Result<CycleOutcome, CycleError>) {
        self.status.cycles += 1;
        self.status.last_cycle_at = Some(Utc::now());

        match result {
            Ok(CycleOutcome::NoData) => {
                self.status.no_data_cycles += 1;
                self.status.consecutive_remote_failures = 0;
                log::info!("No sensor data available.");
            }
            Ok(CycleOutcome::Published { label, .. }) => {
                self.status.predictions += 1;
                self.status.consecutive_remote_failures = 0;
                self.status.last_label = Some(label.clone());
                log::info!("Prediction updated: {}", label);
            }
            Err(e) => {
                self.status.failed_cycles += 1;
                self.status.last_error = Some(e.to_string());
                if e.is_remote() {
                    self.status.consecutive_remote_failures =
                        self.status.consecutive_remote_failures.saturating_add(1);
                }
                match e {
                    CycleError::MalformedPayload(_) => log::warn!("Error processing sensor data: {}", e),
                    _ => log::error!("Error processing sensor data: {}", e),
                }
            }
        }
    }

    /// Fixed interval, or `interval * 2^(n-1)` capped at the backoff ceiling
    pub fn next_wait(&self) -> Duration {
        let n = self.status.consecutive_remote_failures;
        if n == 0 || self.backoff_max <= self.interval {
            return self.interval;
        }

        let factor = 1u32.checked_shl((n - 1).min(16)).unwrap_or(u32::MAX);
        let wait = self.interval.saturating_mul(factor).min(self.backoff_max);
        if wait > self.interval {
            log::warn!("{} remote failures in a row, next poll in {}s", n, wait.as_secs());
        }
        wait
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
