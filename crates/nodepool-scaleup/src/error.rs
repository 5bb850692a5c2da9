//! Scale-up error types.

use nodepool_cloud::CloudError;
use thiserror::Error;

/// Errors that abort a scale-up call.
///
/// Per-node reclaim failures never show up here; they are logged and
/// the node is skipped.
#[derive(Debug, Error)]
pub enum ScaleUpError {
    #[error("node group {nodegroup}: {active} active nodes exceed the maximum of {max_nodes}, taking no action")]
    CeilingViolation {
        nodegroup: String,
        active: usize,
        max_nodes: usize,
    },

    #[error("node group {nodegroup}: adding {requested} nodes would breach the cloud maximum ({current_size}/{max_size})")]
    CapacityExceeded {
        nodegroup: String,
        requested: usize,
        current_size: usize,
        max_size: usize,
    },

    #[error("node group {nodegroup}: cloud resize failed: {source}")]
    Gateway {
        nodegroup: String,
        #[source]
        source: CloudError,
    },

    #[error("unknown node group: {0}")]
    UnknownGroup(String),
}

pub type ScaleUpResult<T> = Result<T, ScaleUpError>;

/// Errors from removing the quarantine marker from a single node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuarantineError {
    #[error("node api call for {node} failed: {reason}")]
    NodeApi { node: String, reason: String },

    #[error("node {0} carries no quarantine marker")]
    MarkerMissing(String),
}

pub type QuarantineResult<T> = Result<T, QuarantineError>;
