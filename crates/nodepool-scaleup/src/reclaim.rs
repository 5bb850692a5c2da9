//! Reclaimer — returns quarantined nodes to service, newest first.

use tracing::{error, info, warn};

use nodepool_core::Node;
use nodepool_metrics::MetricsSink;

use crate::group::NodeGroupState;
use crate::quarantine::ReclaimOutcome;

/// Reclaim up to `target` of `quarantined`, newest node first.
///
/// Candidates are ordered by creation time descending; ties keep their
/// input order. Each reclaim is independent: a failed node is logged and
/// skipped. Returns the reclaimed nodes in the order they were reclaimed.
///
/// The untaint event counter is bumped by `target` (attempts, not
/// successes) before any node is touched.
pub fn reclaim_newest(
    group: &mut NodeGroupState,
    quarantined: &[Node],
    target: usize,
    metrics: &dyn MetricsSink,
) -> Vec<Node> {
    let nodegroup = group.name().to_string();

    if quarantined.is_empty() {
        warn!(%nodegroup, "there are no tainted nodes to untaint");
        return Vec::new();
    }

    info!(%nodegroup, target, "scaling up: trying to untaint tainted nodes");
    metrics.record_untaint_events(&nodegroup, target as u64);

    let mut candidates: Vec<&Node> = quarantined.iter().collect();
    // `sort_by` is stable, so equal timestamps keep their input order.
    candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mutator = group.mutator_mut();
    let dry_mode = mutator.dry_mode();
    let mut reclaimed = Vec::with_capacity(target.min(candidates.len()));

    for node in candidates {
        if reclaimed.len() >= target {
            break;
        }

        match mutator.remove_marker(node) {
            Ok(ReclaimOutcome::Reclaimed(updated)) => reclaimed.push(updated),
            Ok(ReclaimOutcome::Skipped) => {}
            Err(e) => {
                error!(
                    %nodegroup,
                    drymode = dry_mode,
                    node = %node.name,
                    error = %e,
                    "failed to untaint node"
                );
            }
        }
    }

    info!(%nodegroup, untainted = reclaimed.len(), "untainted nodes");
    reclaimed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use nodepool_cloud::InMemoryGateway;
    use nodepool_core::NodeGroupOptions;
    use nodepool_metrics::UntaintEventCounter;

    use crate::quarantine::InMemoryNodeApi;

    fn quarantined(name: &str, created_at: u64) -> Node {
        Node::new(name, created_at).quarantined(created_at + 1)
    }

    fn group(dry_mode: bool, api: Arc<InMemoryNodeApi>) -> NodeGroupState {
        NodeGroupState::new(
            NodeGroupOptions {
                name: "shared".to_string(),
                min_nodes: 0,
                max_nodes: 10,
                dry_mode,
            },
            Arc::new(InMemoryGateway::new(0, 10)),
            api,
        )
    }

    fn names(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    #[test]
    fn empty_quarantine_list_reclaims_nothing() {
        let metrics = UntaintEventCounter::new();
        let mut group = group(false, Arc::new(InMemoryNodeApi::default()));

        let reclaimed = reclaim_newest(&mut group, &[], 3, &metrics);
        assert!(reclaimed.is_empty());
        // No batch started, so no attempts recorded.
        assert!(metrics.totals().is_empty());
    }

    #[test]
    fn newest_first_with_stable_ties() {
        let now = 1_000;
        let nodes = vec![
            quarantined("pos0", now - 1),
            quarantined("pos1", now - 3),
            quarantined("pos2", now - 2),
        ];
        let api = Arc::new(InMemoryNodeApi::new(nodes.clone()));
        let mut group = group(false, api);

        let reclaimed = reclaim_newest(&mut group, &nodes, 2, &UntaintEventCounter::new());
        assert_eq!(names(&reclaimed), ["pos0", "pos2"]);
    }

    #[test]
    fn equal_timestamps_keep_input_order() {
        let nodes = vec![
            quarantined("first", 5),
            quarantined("second", 5),
            quarantined("third", 5),
        ];
        let api = Arc::new(InMemoryNodeApi::new(nodes.clone()));
        let mut group = group(false, api);

        let reclaimed = reclaim_newest(&mut group, &nodes, 2, &UntaintEventCounter::new());
        assert_eq!(names(&reclaimed), ["first", "second"]);
    }

    #[test]
    fn failed_node_is_skipped_and_batch_continues() {
        let nodes = vec![
            quarantined("newest", 30),
            quarantined("middle", 20),
            quarantined("oldest", 10),
        ];
        let api = Arc::new(InMemoryNodeApi::new(nodes.clone()));
        api.fail_node("newest");
        let mut group = group(false, api.clone());

        let reclaimed = reclaim_newest(&mut group, &nodes, 3, &UntaintEventCounter::new());
        assert_eq!(names(&reclaimed), ["middle", "oldest"]);
        assert!(reclaimed.iter().all(|n| !n.is_quarantined()));
        assert!(api.node("newest").unwrap().is_quarantined());
    }

    #[test]
    fn failure_lets_next_candidate_fill_target() {
        let nodes = vec![
            quarantined("a", 30),
            quarantined("b", 20),
            quarantined("c", 10),
        ];
        let api = Arc::new(InMemoryNodeApi::new(nodes.clone()));
        api.fail_node("a");
        let mut group = group(false, api.clone());

        let reclaimed = reclaim_newest(&mut group, &nodes, 2, &UntaintEventCounter::new());
        assert_eq!(names(&reclaimed), ["b", "c"]);
        assert_eq!(api.calls(), ["a", "b", "c"]);
    }

    #[test]
    fn stops_at_target() {
        let nodes = vec![quarantined("a", 3), quarantined("b", 2), quarantined("c", 1)];
        let api = Arc::new(InMemoryNodeApi::new(nodes.clone()));
        let mut group = group(false, api.clone());

        let reclaimed = reclaim_newest(&mut group, &nodes, 1, &UntaintEventCounter::new());
        assert_eq!(names(&reclaimed), ["a"]);
        assert_eq!(api.calls(), ["a"]);
    }

    #[test]
    fn metric_counts_attempts_not_successes() {
        let nodes = vec![quarantined("a", 2), quarantined("b", 1)];
        let api = Arc::new(InMemoryNodeApi::new(nodes.clone()));
        api.fail_node("a");
        let metrics = UntaintEventCounter::new();
        let mut group = group(false, api);

        let reclaimed = reclaim_newest(&mut group, &nodes, 5, &metrics);
        assert_eq!(reclaimed.len(), 1);
        assert_eq!(metrics.get("shared"), 5);
    }

    #[test]
    fn dry_run_only_reclaims_tracked_nodes() {
        let nodes = vec![quarantined("a", 3), quarantined("b", 2), quarantined("c", 1)];
        let api = Arc::new(InMemoryNodeApi::new(nodes.clone()));
        let mut group = group(true, api.clone());
        group.simulate_quarantine("b");
        group.simulate_quarantine("c");

        let reclaimed = reclaim_newest(&mut group, &nodes, 3, &UntaintEventCounter::new());
        assert_eq!(names(&reclaimed), ["b", "c"]);
        assert!(group.quarantine_tracker().is_empty());
        // Nothing reached the node API.
        assert!(api.calls().is_empty());
        assert!(api.node("b").unwrap().is_quarantined());
    }
}
