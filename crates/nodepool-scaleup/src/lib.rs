//! nodepool-scaleup — the scale-up decision core.
//!
//! Given a node group, the nodes currently active in it, and the nodes
//! quarantined for removal, decides how many quarantined nodes to reclaim
//! and how many new nodes to request from the cloud provider.
//!
//! # Scale-up Algorithm
//!
//! ```text
//! delta = requested
//! if active + delta > max_nodes:
//!     if active > max_nodes: fail (ceiling violation, no action)
//!     delta = max_nodes - active
//!
//! reclaimed = untaint up to `delta` quarantined nodes, newest first
//! remaining = delta - reclaimed
//! if remaining > 0:
//!     grow the cloud group by `remaining`
//! ```
//!
//! Reclaimed nodes are usable immediately. Cloud growth only becomes
//! visible once the provider has booted the nodes, in a later scan cycle.
//!
//! All mutations go through the group's [`QuarantineMutator`] and
//! [`CloudResizeGateway`](nodepool_cloud::CloudResizeGateway). In dry mode
//! the mutator only edits an in-memory tracker and growth is logged but
//! never sent to the provider.

pub mod error;
pub mod group;
pub mod quarantine;
pub mod reclaim;
pub mod scaler;

pub use error::{QuarantineError, QuarantineResult, ScaleUpError, ScaleUpResult};
pub use group::NodeGroupState;
pub use quarantine::{
    ClusterQuarantineMutator, DryRunQuarantineMutator, InMemoryNodeApi, NodeApi,
    QuarantineMutator, ReclaimOutcome,
};
pub use reclaim::reclaim_newest;
pub use scaler::{ScaleUpController, ScaleUpOutcome, ScaleUpRequest, grow, scale_up};
