//! Scentify Poller
//!
//! Polls the latest gas-sensor snapshot, classifies the scent and publishes
//! the label to the Realtime Database and Firestore.

pub mod constants;
pub mod logic;
