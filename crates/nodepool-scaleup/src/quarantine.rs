//! Quarantine mutators — the only place a reclaim touches anything.
//!
//! A node group picks one mutator when it is built. The cluster mutator
//! talks to the node API; the dry-run mutator edits an in-memory list of
//! node names that mirrors what the cluster would look like had the
//! quarantine and reclaim actions really been applied.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use nodepool_core::{Node, NodeName};

use crate::error::{QuarantineError, QuarantineResult};

/// Result of asking a mutator to reclaim one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReclaimOutcome {
    /// The marker is gone; carries the updated node.
    Reclaimed(Node),
    /// Nothing to do for this node; it does not count as reclaimed.
    Skipped,
}

/// Removes the quarantine marker from a single node.
pub trait QuarantineMutator: Send {
    /// Whether this mutator only simulates changes.
    fn dry_mode(&self) -> bool;

    /// Reclaim one node. An `Err` means this node failed and nothing else.
    fn remove_marker(&mut self, node: &Node) -> QuarantineResult<ReclaimOutcome>;

    /// Record a simulated quarantine. Returns `true` if newly tracked.
    fn track(&mut self, _name: &str) -> bool {
        false
    }

    /// Names considered quarantined by the simulation, oldest entry first.
    fn tracked(&self) -> &[NodeName] {
        &[]
    }
}

// ── Node API ──────────────────────────────────────────────────────

/// Cluster-side node mutation capability.
pub trait NodeApi: Send + Sync {
    /// Remove the quarantine taint and return the updated node.
    fn remove_quarantine_taint(&self, node: &Node) -> QuarantineResult<Node>;
}

#[derive(Debug, Default)]
struct NodeStore {
    nodes: HashMap<NodeName, Node>,
    failing: HashSet<NodeName>,
    calls: Vec<NodeName>,
}

/// Node API over an in-memory node table.
///
/// Backs the daemon's simulated cluster and tests. Individual nodes can
/// be set to fail so partial-failure behaviour can be exercised.
#[derive(Debug, Default)]
pub struct InMemoryNodeApi {
    store: Mutex<NodeStore>,
}

impl InMemoryNodeApi {
    pub fn new(nodes: impl IntoIterator<Item = Node>) -> Self {
        let api = Self::default();
        api.upsert_all(nodes);
        api
    }

    /// Insert or replace nodes by name.
    pub fn upsert_all(&self, nodes: impl IntoIterator<Item = Node>) {
        let mut store = self.lock();
        for node in nodes {
            store.nodes.insert(node.name.clone(), node);
        }
    }

    /// Make every call for `name` fail.
    pub fn fail_node(&self, name: &str) {
        self.lock().failing.insert(name.to_string());
    }

    pub fn node(&self, name: &str) -> Option<Node> {
        self.lock().nodes.get(name).cloned()
    }

    /// Node names passed to `remove_quarantine_taint`, in call order.
    pub fn calls(&self) -> Vec<NodeName> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, NodeStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NodeApi for InMemoryNodeApi {
    fn remove_quarantine_taint(&self, node: &Node) -> QuarantineResult<Node> {
        let mut store = self.lock();
        store.calls.push(node.name.clone());

        if store.failing.contains(&node.name) {
            return Err(QuarantineError::NodeApi {
                node: node.name.clone(),
                reason: "injected failure".to_string(),
            });
        }

        let stored = store
            .nodes
            .get_mut(&node.name)
            .ok_or_else(|| QuarantineError::NodeApi {
                node: node.name.clone(),
                reason: "node not found".to_string(),
            })?;

        if !stored.clear_quarantine() {
            return Err(QuarantineError::MarkerMissing(node.name.clone()));
        }
        Ok(stored.clone())
    }
}

// ── Mutators ──────────────────────────────────────────────────────

/// Mutator that issues real node API calls.
pub struct ClusterQuarantineMutator {
    api: Arc<dyn NodeApi>,
}

impl ClusterQuarantineMutator {
    pub fn new(api: Arc<dyn NodeApi>) -> Self {
        Self { api }
    }
}

impl QuarantineMutator for ClusterQuarantineMutator {
    fn dry_mode(&self) -> bool {
        false
    }

    fn remove_marker(&mut self, node: &Node) -> QuarantineResult<ReclaimOutcome> {
        if !node.is_quarantined() {
            debug!(node = %node.name, "node has no quarantine marker, skipping");
            return Ok(ReclaimOutcome::Skipped);
        }

        info!(drymode = false, node = %node.name, "untainting node");
        let updated = self.api.remove_quarantine_taint(node)?;
        Ok(ReclaimOutcome::Reclaimed(updated))
    }
}

/// Mutator that only edits the simulated quarantine tracker.
#[derive(Debug, Default)]
pub struct DryRunQuarantineMutator {
    tracker: Vec<NodeName>,
}

impl DryRunQuarantineMutator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QuarantineMutator for DryRunQuarantineMutator {
    fn dry_mode(&self) -> bool {
        true
    }

    fn remove_marker(&mut self, node: &Node) -> QuarantineResult<ReclaimOutcome> {
        let Some(pos) = self.tracker.iter().position(|name| *name == node.name) else {
            debug!(node = %node.name, "node not in taint tracker, skipping");
            return Ok(ReclaimOutcome::Skipped);
        };

        self.tracker.remove(pos);
        info!(drymode = true, node = %node.name, "untainting node");

        let mut updated = node.clone();
        updated.clear_quarantine();
        Ok(ReclaimOutcome::Reclaimed(updated))
    }

    fn track(&mut self, name: &str) -> bool {
        if self.tracker.iter().any(|n| n == name) {
            return false;
        }
        self.tracker.push(name.to_string());
        true
    }

    fn tracked(&self) -> &[NodeName] {
        &self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quarantined(name: &str, created_at: u64) -> Node {
        Node::new(name, created_at).quarantined(created_at + 10)
    }

    #[test]
    fn cluster_mutator_removes_marker_via_api() {
        let node = quarantined("a", 1);
        let api = Arc::new(InMemoryNodeApi::new([node.clone()]));
        let mut mutator = ClusterQuarantineMutator::new(api.clone());

        let outcome = mutator.remove_marker(&node).unwrap();
        assert_eq!(outcome, ReclaimOutcome::Reclaimed(Node::new("a", 1)));
        assert!(!api.node("a").unwrap().is_quarantined());
        assert_eq!(api.calls(), vec!["a".to_string()]);
    }

    #[test]
    fn cluster_mutator_skips_unmarked_node_without_calling_api() {
        let node = Node::new("a", 1);
        let api = Arc::new(InMemoryNodeApi::new([node.clone()]));
        let mut mutator = ClusterQuarantineMutator::new(api.clone());

        assert_eq!(mutator.remove_marker(&node).unwrap(), ReclaimOutcome::Skipped);
        assert!(api.calls().is_empty());
    }

    #[test]
    fn cluster_mutator_surfaces_api_failure() {
        let node = quarantined("a", 1);
        let api = Arc::new(InMemoryNodeApi::new([node.clone()]));
        api.fail_node("a");
        let mut mutator = ClusterQuarantineMutator::new(api.clone());

        let err = mutator.remove_marker(&node).unwrap_err();
        assert!(matches!(err, QuarantineError::NodeApi { node, .. } if node == "a"));
        assert!(api.node("a").unwrap().is_quarantined());
    }

    #[test]
    fn in_memory_api_reports_unknown_node() {
        let api = InMemoryNodeApi::default();
        let err = api.remove_quarantine_taint(&quarantined("ghost", 1)).unwrap_err();
        assert!(matches!(err, QuarantineError::NodeApi { reason, .. } if reason == "node not found"));
    }

    #[test]
    fn in_memory_api_rejects_already_clean_node() {
        let api = InMemoryNodeApi::new([Node::new("a", 1)]);
        let err = api.remove_quarantine_taint(&quarantined("a", 1)).unwrap_err();
        assert_eq!(err, QuarantineError::MarkerMissing("a".to_string()));
    }

    #[test]
    fn dry_run_reclaims_tracked_node_once() {
        let mut mutator = DryRunQuarantineMutator::new();
        assert!(mutator.track("a"));
        assert!(mutator.track("b"));

        let node = quarantined("a", 1);
        let outcome = mutator.remove_marker(&node).unwrap();
        assert_eq!(outcome, ReclaimOutcome::Reclaimed(Node::new("a", 1)));
        assert_eq!(mutator.tracked(), ["b".to_string()]);

        // Second attempt on the same identifier is a silent no-op.
        assert_eq!(mutator.remove_marker(&node).unwrap(), ReclaimOutcome::Skipped);
        assert_eq!(mutator.tracked(), ["b".to_string()]);
    }

    #[test]
    fn dry_run_skips_untracked_node() {
        let mut mutator = DryRunQuarantineMutator::new();
        mutator.track("b");

        let outcome = mutator.remove_marker(&quarantined("a", 1)).unwrap();
        assert_eq!(outcome, ReclaimOutcome::Skipped);
        assert_eq!(mutator.tracked().len(), 1);
    }

    #[test]
    fn dry_run_track_is_idempotent() {
        let mut mutator = DryRunQuarantineMutator::new();
        assert!(mutator.track("a"));
        assert!(!mutator.track("a"));
        assert_eq!(mutator.tracked().len(), 1);
    }

    #[test]
    fn cluster_mutator_has_no_tracker() {
        let mut mutator = ClusterQuarantineMutator::new(Arc::new(InMemoryNodeApi::default()));
        assert!(!mutator.dry_mode());
        assert!(!mutator.track("a"));
        assert!(mutator.tracked().is_empty());
    }
}
