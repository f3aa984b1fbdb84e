//! Logic Module
//!
//! - `config` - environment configuration
//! - `features` - sensor snapshot → feature vector
//! - `model` - classifiers (k-NN pipeline, ONNX)
//! - `cloud` - Realtime Database / Firestore clients
//! - `poller` - the fetch → predict → publish loop

pub mod cloud;
pub mod config;
pub mod features;
pub mod model;
pub mod poller;
