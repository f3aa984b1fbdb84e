//! Scentify Poller - Main Entry Point

use std::sync::Arc;

use anyhow::Context;

use scentify_poller::constants::{APP_NAME, APP_VERSION};
use scentify_poller::logic::cloud::{FirestoreClient, RealtimeDbClient};
use scentify_poller::logic::config::PollerConfig;
use scentify_poller::logic::features::layout::LayoutInfo;
use scentify_poller::logic::model::load_model;
use scentify_poller::logic::poller::InferencePoller;

fn main() {
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} v{}...", APP_NAME, APP_VERSION);

    // Single logical thread: one current-thread runtime for the whole process
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to create tokio runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(run()) {
        log::error!("Startup failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = PollerConfig::from_env().context("invalid configuration")?;

    let layout = LayoutInfo::current();
    log::info!(
        "Feature layout v{} {:?} (hash: {:08x})",
        layout.version,
        layout.feature_names,
        layout.hash
    );

    let model = load_model(&config.model_path, config.model_sha256.as_deref())
        .with_context(|| format!("cannot load model {}", config.model_path.display()))?;
    log::info!("   Classes: {}", model.metadata.classes.join(", "));

    let realtime_db = Arc::new(
        RealtimeDbClient::new(
            config.realtime_db.clone(),
            config.auth_token.clone(),
            config.http_timeout,
        )
        .context("cannot create Realtime Database client")?,
    );
    let firestore = Arc::new(
        FirestoreClient::new(
            config.firestore.clone(),
            config.auth_token.clone(),
            config.http_timeout,
        )
        .context("cannot create Firestore client")?,
    );

    log::info!("   Sensor source: {}", realtime_db.node_url(&config.realtime_db.sensor_path));
    log::info!("   Prediction slot: {}", realtime_db.node_url(&config.realtime_db.prediction_path));
    log::info!("   Prediction document: {}", firestore.document_name());
    if config.backoff_enabled() {
        log::info!("   Backoff up to {}s on remote failures", config.backoff_max.as_secs());
    }

    let poller = InferencePoller::new(
        realtime_db.clone(),
        realtime_db,
        firestore,
        model.classifier,
        config.poll_interval,
    )
    .with_backoff(config.backoff_max);

    poller.run().await;
    Ok(())
}
