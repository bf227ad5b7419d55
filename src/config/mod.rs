//! Configuration management
//!
//! Environment-backed settings for the node address, the discovery service
//! address, and the chain file location.

pub mod settings;

pub use settings::{Config, GLOBAL_CONFIG};
