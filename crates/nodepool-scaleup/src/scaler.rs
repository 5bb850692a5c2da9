//! Scale-up orchestration — ceiling check, reclaim, then cloud growth.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info};

use nodepool_core::Node;
use nodepool_metrics::MetricsSink;

use crate::error::{ScaleUpError, ScaleUpResult};
use crate::group::NodeGroupState;
use crate::reclaim::reclaim_newest;

/// Input for one scale-up call, built fresh by the caller every scan cycle.
#[derive(Debug, Clone, Copy)]
pub struct ScaleUpRequest<'a> {
    /// Nodes the caller wants added.
    pub delta: usize,
    pub active_nodes: &'a [Node],
    pub quarantined_nodes: &'a [Node],
}

/// What a successful scale-up did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaleUpOutcome {
    /// Nodes returned to service, already usable.
    pub reclaimed: Vec<Node>,
    /// Nodes requested from the cloud provider; they join in a later cycle.
    pub requested: usize,
}

impl ScaleUpOutcome {
    /// Total nodes added: reclaimed plus requested.
    pub fn nodes_added(&self) -> usize {
        self.reclaimed.len() + self.requested
    }
}

/// Scale a group up by `request.delta` nodes without passing `max_nodes`.
///
/// Quarantined nodes are reclaimed first; whatever is still missing is
/// requested from the cloud provider. A growth failure returns `Err` even
/// when some nodes were already reclaimed; those reclaims are not undone.
pub fn scale_up(
    group: &mut NodeGroupState,
    request: &ScaleUpRequest<'_>,
    metrics: &dyn MetricsSink,
) -> ScaleUpResult<ScaleUpOutcome> {
    let nodegroup = group.name().to_string();
    let active = request.active_nodes.len();
    let max_nodes = group.max_nodes();
    let mut delta = request.delta;

    if delta == 0 {
        return Ok(ScaleUpOutcome::default());
    }

    let Some(room) = max_nodes.checked_sub(active) else {
        error!(
            %nodegroup,
            active,
            max_nodes,
            "active nodes exceed the maximum, cancelling scale up"
        );
        return Err(ScaleUpError::CeilingViolation {
            nodegroup,
            active,
            max_nodes,
        });
    };

    if delta > room {
        info!(
            %nodegroup,
            max_nodes,
            requested = delta,
            adjusted = room,
            "increasing nodes close to maximum, adjusting add amount"
        );
        delta = room;
    }

    if delta == 0 {
        return Ok(ScaleUpOutcome::default());
    }

    let reclaimed = reclaim_newest(group, request.quarantined_nodes, delta, metrics);

    let remaining = delta.saturating_sub(reclaimed.len());
    if remaining == 0 {
        return Ok(ScaleUpOutcome {
            reclaimed,
            requested: 0,
        });
    }

    match grow(group, remaining) {
        Ok(requested) => Ok(ScaleUpOutcome {
            reclaimed,
            requested,
        }),
        Err(e) => {
            error!(
                %nodegroup,
                reclaimed = reclaimed.len(),
                error = %e,
                "failed to add nodes, skipping cloud scale up"
            );
            Err(e)
        }
    }
}

/// Ask the cloud provider for `count` more nodes.
///
/// Fails without touching the provider when the result would exceed the
/// provider's maximum. In dry mode the request is only logged.
pub fn grow(group: &NodeGroupState, count: usize) -> ScaleUpResult<usize> {
    let nodegroup = group.name();
    let gateway = group.gateway();
    let current_size = gateway.current_size();
    let max_size = gateway.max_size();

    if count > max_size.saturating_sub(current_size) {
        return Err(ScaleUpError::CapacityExceeded {
            nodegroup: nodegroup.to_string(),
            requested: count,
            current_size,
            max_size,
        });
    }

    let drymode = group.dry_mode();
    info!(%nodegroup, drymode, count, current_size, "increasing cloud group size");

    if !drymode {
        gateway
            .increase_size(count)
            .map_err(|source| ScaleUpError::Gateway {
                nodegroup: nodegroup.to_string(),
                source,
            })?;
    }

    Ok(count)
}

/// Owns every node group and routes scale-up calls to them by name.
pub struct ScaleUpController {
    groups: HashMap<String, NodeGroupState>,
    metrics: Arc<dyn MetricsSink>,
}

impl ScaleUpController {
    pub fn new(metrics: Arc<dyn MetricsSink>) -> Self {
        Self {
            groups: HashMap::new(),
            metrics,
        }
    }

    /// Register a group, replacing any previous group with the same name.
    pub fn add_group(&mut self, group: NodeGroupState) {
        self.groups.insert(group.name().to_string(), group);
    }

    pub fn group(&self, name: &str) -> Option<&NodeGroupState> {
        self.groups.get(name)
    }

    /// Registered group names, sorted.
    pub fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.keys().cloned().collect();
        names.sort();
        names
    }

    /// Scale the named group up by `delta` nodes.
    pub fn scale_up(
        &mut self,
        nodegroup: &str,
        delta: usize,
        active_nodes: &[Node],
        quarantined_nodes: &[Node],
    ) -> ScaleUpResult<ScaleUpOutcome> {
        let group = self
            .groups
            .get_mut(nodegroup)
            .ok_or_else(|| ScaleUpError::UnknownGroup(nodegroup.to_string()))?;

        let request = ScaleUpRequest {
            delta,
            active_nodes,
            quarantined_nodes,
        };
        scale_up(group, &request, self.metrics.as_ref())
    }
}
