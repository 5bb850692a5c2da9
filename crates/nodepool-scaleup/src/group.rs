//! Node group state — configuration plus per-group runtime bookkeeping.

use std::sync::Arc;

use nodepool_cloud::CloudResizeGateway;
use nodepool_core::{NodeGroupOptions, NodeName};

use crate::quarantine::{
    ClusterQuarantineMutator, DryRunQuarantineMutator, NodeApi, QuarantineMutator,
};

/// One named pool of nodes tied to one cloud resize target.
///
/// Built once at controller startup. The scale-up path needs `&mut` access,
/// so a group is only ever driven by one worker at a time.
pub struct NodeGroupState {
    options: NodeGroupOptions,
    /// Shared with whoever owns the provider client.
    gateway: Arc<dyn CloudResizeGateway>,
    mutator: Box<dyn QuarantineMutator>,
}

impl NodeGroupState {
    /// Build a group, choosing the mutator from `options.dry_mode`.
    pub fn new(
        options: NodeGroupOptions,
        gateway: Arc<dyn CloudResizeGateway>,
        node_api: Arc<dyn NodeApi>,
    ) -> Self {
        let mutator: Box<dyn QuarantineMutator> = if options.dry_mode {
            Box::new(DryRunQuarantineMutator::new())
        } else {
            Box::new(ClusterQuarantineMutator::new(node_api))
        };

        Self {
            options,
            gateway,
            mutator,
        }
    }

    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn options(&self) -> &NodeGroupOptions {
        &self.options
    }

    pub fn max_nodes(&self) -> usize {
        self.options.max_nodes
    }

    pub fn dry_mode(&self) -> bool {
        self.options.dry_mode
    }

    pub fn gateway(&self) -> &dyn CloudResizeGateway {
        self.gateway.as_ref()
    }

    /// Names the simulation considers quarantined. Always empty outside dry mode.
    pub fn quarantine_tracker(&self) -> &[NodeName] {
        self.mutator.tracked()
    }

    /// Record a simulated quarantine, as the scale-down path does in dry mode.
    ///
    /// Returns `false` outside dry mode or when the name is already tracked.
    pub fn simulate_quarantine(&mut self, name: &str) -> bool {
        self.mutator.track(name)
    }

    pub(crate) fn mutator_mut(&mut self) -> &mut dyn QuarantineMutator {
        self.mutator.as_mut()
    }
}

impl std::fmt::Debug for NodeGroupState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeGroupState")
            .field("options", &self.options)
            .field("quarantine_tracker", &self.quarantine_tracker())
            .finish_non_exhaustive()
    }
}
