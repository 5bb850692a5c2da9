//! nodepool-core — shared types for the nodepool capacity controller.
//!
//! Holds the minimal view of cluster nodes the scale-up path works with,
//! the per-group options, the cluster snapshot format consumed by the
//! daemon, and the `nodepool.toml` controller configuration.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ControllerConfig, NodeGroupConfig};
pub use error::{ConfigError, ConfigResult};
pub use types::*;
