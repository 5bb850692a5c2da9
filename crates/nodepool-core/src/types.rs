//! Domain types shared across nodepool crates.
//!
//! These types describe the external view of cluster nodes and node
//! groups. All of them serialize to/from JSON so the daemon can load
//! cluster snapshots from disk.

use serde::{Deserialize, Serialize};

/// Unique identifier for a node in the cluster.
pub type NodeName = String;

/// Taint key marking a node as quarantined for removal.
pub const TO_BE_REMOVED_TAINT_KEY: &str = "nodepool.io/to-be-removed";

// ── Node ──────────────────────────────────────────────────────────

/// Scheduling effect of a taint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaintEffect {
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}

/// A key/value marker placed on a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taint {
    pub key: String,
    pub value: String,
    pub effect: TaintEffect,
}

impl Taint {
    /// Build the quarantine taint, stamped with the time it was applied.
    pub fn to_be_removed(quarantined_at: u64) -> Self {
        Self {
            key: TO_BE_REMOVED_TAINT_KEY.to_string(),
            value: quarantined_at.to_string(),
            effect: TaintEffect::NoSchedule,
        }
    }
}

/// Minimal view of a cluster node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: NodeName,
    /// Unix timestamp (seconds) when the node was created.
    pub created_at: u64,
    #[serde(default)]
    pub taints: Vec<Taint>,
}

impl Node {
    /// Create an untainted node.
    pub fn new(name: impl Into<String>, created_at: u64) -> Self {
        Self {
            name: name.into(),
            created_at,
            taints: Vec::new(),
        }
    }

    /// Return a copy of this node carrying the quarantine taint.
    pub fn quarantined(mut self, quarantined_at: u64) -> Self {
        self.taints.retain(|t| t.key != TO_BE_REMOVED_TAINT_KEY);
        self.taints.push(Taint::to_be_removed(quarantined_at));
        self
    }

    /// The quarantine taint, if present.
    pub fn quarantine_taint(&self) -> Option<&Taint> {
        self.taints.iter().find(|t| t.key == TO_BE_REMOVED_TAINT_KEY)
    }

    pub fn is_quarantined(&self) -> bool {
        self.quarantine_taint().is_some()
    }

    /// Drop the quarantine taint. Returns `true` if one was removed.
    pub fn clear_quarantine(&mut self) -> bool {
        let before = self.taints.len();
        self.taints.retain(|t| t.key != TO_BE_REMOVED_TAINT_KEY);
        self.taints.len() != before
    }
}

// ── Node group ────────────────────────────────────────────────────

/// Immutable per-group options, fixed at controller startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeGroupOptions {
    pub name: String,
    /// Lower bound on active nodes (enforced by the scale-down path).
    pub min_nodes: usize,
    /// Hard ceiling on active nodes; no scale-up may exceed it.
    pub max_nodes: usize,
    /// Effective simulation flag for this group.
    pub dry_mode: bool,
}

// ── Cluster snapshot ──────────────────────────────────────────────

/// Point-in-time view of one node group as seen by a scan cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeGroupSnapshot {
    pub name: String,
    /// Current desired size reported by the cloud provider.
    pub cloud_size: usize,
    /// Maximum size accepted by the cloud provider.
    pub cloud_max_size: usize,
    /// Nodes the scan cycle wants added to this group.
    #[serde(default)]
    pub pending_delta: usize,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl NodeGroupSnapshot {
    /// Split the group's nodes into (active, quarantined).
    pub fn partition(&self) -> (Vec<Node>, Vec<Node>) {
        self.nodes.iter().cloned().partition(|n| !n.is_quarantined())
    }
}

/// Snapshot of every node group in the cluster.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    pub node_groups: Vec<NodeGroupSnapshot>,
}

impl ClusterSnapshot {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn group(&self, name: &str) -> Option<&NodeGroupSnapshot> {
        self.node_groups.iter().find(|g| g.name == name)
    }
}
