//! Features Module - Sensor snapshot → model input
//!
//! - `layout` - channel table, order and layout hash
//! - `vector` - fixed-order feature vector and field coercion

pub mod layout;
pub mod vector;

#[cfg(test)]
mod tests;

pub use layout::{FEATURE_COUNT, SENSOR_FIELDS};
pub use vector::{DefaultReason, FeatureVector, Featurized};
