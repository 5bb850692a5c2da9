//! Simulated scan cycles over a cluster snapshot.
//!
//! Stands in for the periodic scheduler: each cycle reads the snapshot,
//! splits every group's nodes into active and quarantined, and calls the
//! scale-up core with the group's pending delta. Cloud and node mutations
//! land in in-memory backends that live as long as the simulation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::Serialize;
use tracing::{debug, info, warn};

use nodepool_cloud::InMemoryGateway;
use nodepool_core::{ClusterSnapshot, ControllerConfig};
use nodepool_metrics::{UntaintEventCounter, render_prometheus};
use nodepool_scaleup::{InMemoryNodeApi, NodeGroupState, ScaleUpController};

/// Result of one group's scale-up within a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    pub nodegroup: String,
    pub requested_delta: usize,
    pub dry_mode: bool,
    /// Names of reclaimed nodes, in reclaim order.
    pub reclaimed: Vec<String>,
    pub cloud_requested: usize,
    pub nodes_added: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct Simulation {
    controller: ScaleUpController,
    metrics: Arc<UntaintEventCounter>,
    gateways: HashMap<String, Arc<InMemoryGateway>>,
    node_api: Arc<InMemoryNodeApi>,
}

impl Simulation {
    /// Build one group per configured entry.
    ///
    /// Dry-mode trackers start out holding every node the snapshot shows
    /// as quarantined.
    pub fn new(config: &ControllerConfig, snapshot: &ClusterSnapshot) -> Self {
        let metrics = Arc::new(UntaintEventCounter::new());
        let node_api = Arc::new(InMemoryNodeApi::default());
        let mut controller = ScaleUpController::new(metrics.clone());
        let mut gateways = HashMap::new();

        for options in config.group_options() {
            let observed = snapshot.group(&options.name);
            let gateway = Arc::new(match observed {
                Some(g) => InMemoryGateway::new(g.cloud_size, g.cloud_max_size),
                None => InMemoryGateway::new(0, options.max_nodes),
            });

            let mut group = NodeGroupState::new(options, gateway.clone(), node_api.clone());
            if group.dry_mode()
                && let Some(g) = observed
            {
                for node in g.nodes.iter().filter(|n| n.is_quarantined()) {
                    group.simulate_quarantine(&node.name);
                }
            }

            info!(
                nodegroup = %group.name(),
                max_nodes = group.max_nodes(),
                drymode = group.dry_mode(),
                tracked = group.quarantine_tracker().len(),
                "node group initialized"
            );
            gateways.insert(group.name().to_string(), gateway);
            controller.add_group(group);
        }

        Self {
            controller,
            metrics,
            gateways,
            node_api,
        }
    }

    /// Run one scan cycle against `snapshot`.
    pub fn run_cycle(&mut self, snapshot: &ClusterSnapshot) -> Vec<GroupReport> {
        let mut reports = Vec::new();

        for name in self.controller.group_names() {
            let Some(observed) = snapshot.group(&name) else {
                warn!(nodegroup = %name, "node group missing from cluster snapshot");
                continue;
            };

            if let Some(gateway) = self.gateways.get(&name) {
                gateway.sync(observed.cloud_size, observed.cloud_max_size);
            }
            self.node_api.upsert_all(observed.nodes.iter().cloned());

            if observed.pending_delta == 0 {
                debug!(nodegroup = %name, "nothing pending, skipping scale up");
                continue;
            }

            let dry_mode = self
                .controller
                .group(&name)
                .is_some_and(|g| g.dry_mode());
            let (active, quarantined) = observed.partition();

            let mut report = GroupReport {
                nodegroup: name.clone(),
                requested_delta: observed.pending_delta,
                dry_mode,
                reclaimed: Vec::new(),
                cloud_requested: 0,
                nodes_added: 0,
                error: None,
            };

            match self
                .controller
                .scale_up(&name, observed.pending_delta, &active, &quarantined)
            {
                Ok(outcome) => {
                    report.nodes_added = outcome.nodes_added();
                    report.cloud_requested = outcome.requested;
                    report.reclaimed = outcome.reclaimed.into_iter().map(|n| n.name).collect();
                    info!(
                        nodegroup = %name,
                        nodes_added = report.nodes_added,
                        "scale up finished"
                    );
                }
                // Already logged by the scale-up core; retried next cycle.
                Err(e) => report.error = Some(e.to_string()),
            }

            reports.push(report);
        }

        reports
    }

    pub fn render_metrics(&self) -> String {
        render_prometheus(&self.metrics)
    }

    /// Re-read the snapshot and run a cycle every `interval` until shutdown.
    pub async fn run(
        &mut self,
        cluster_path: &Path,
        interval: Duration,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) {
        info!(interval_secs = interval.as_secs(), "scan loop started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    match load_snapshot(cluster_path) {
                        Ok(snapshot) => {
                            let reports = self.run_cycle(&snapshot);
                            debug!(groups = reports.len(), "scan cycle complete");
                        }
                        Err(e) => tracing::error!(error = %e, "failed to load cluster snapshot"),
                    }
                }
                _ = shutdown.changed() => {
                    info!("scan loop shutting down");
                    break;
                }
            }
        }
    }
}

pub fn load_snapshot(path: &Path) -> anyhow::Result<ClusterSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading cluster snapshot {}", path.display()))?;
    ClusterSnapshot::from_json(&content)
        .with_context(|| format!("parsing cluster snapshot {}", path.display()))
}
