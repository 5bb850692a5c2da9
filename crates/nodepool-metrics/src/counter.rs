//! Untaint event counter — tracks attempted reclaims per node group.
//!
//! Uses atomics for the counter values and an `RwLock` around the group
//! map, so increments for already-known groups only take a read lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use tracing::debug;

/// Counter-increment capability used by the scale-up path.
pub trait MetricsSink: Send + Sync {
    /// Add `count` to `nodegroup_untaint_event_total{nodegroup}`.
    fn record_untaint_events(&self, nodegroup: &str, count: u64);
}

/// In-process monotonic counter keyed by node group name.
#[derive(Debug, Default)]
pub struct UntaintEventCounter {
    totals: RwLock<HashMap<String, AtomicU64>>,
}

impl UntaintEventCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value for one group (0 if never incremented).
    pub fn get(&self, nodegroup: &str) -> u64 {
        let totals = self.totals.read().unwrap_or_else(PoisonError::into_inner);
        totals
            .get(nodegroup)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// All counter values, sorted by group name.
    pub fn totals(&self) -> Vec<(String, u64)> {
        let totals = self.totals.read().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<(String, u64)> = totals
            .iter()
            .map(|(name, c)| (name.clone(), c.load(Ordering::Relaxed)))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }
}

impl MetricsSink for UntaintEventCounter {
    fn record_untaint_events(&self, nodegroup: &str, count: u64) {
        {
            let totals = self.totals.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(c) = totals.get(nodegroup) {
                c.fetch_add(count, Ordering::Relaxed);
                return;
            }
        }

        let mut totals = self.totals.write().unwrap_or_else(PoisonError::into_inner);
        totals
            .entry(nodegroup.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(count, Ordering::Relaxed);
        debug!(%nodegroup, "registered untaint event counter");
    }
}
