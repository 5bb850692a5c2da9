//! nodepool-metrics — observability for node group scaling.
//!
//! The scale-up path never touches a global registry. It reports through
//! the [`MetricsSink`] capability, which the daemon backs with an
//! [`UntaintEventCounter`] and tests back with whatever they like.
//!
//! # Architecture
//!
//! ```text
//! MetricsSink (trait)
//!   └── record_untaint_events(nodegroup, n) ← called per reclaim batch
//!
//! UntaintEventCounter
//!   ├── implements MetricsSink
//!   └── totals() → per-group counter values
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for scraping
//! ```

pub mod counter;
pub mod prometheus;

pub use counter::{MetricsSink, UntaintEventCounter};
pub use prometheus::render_prometheus;
