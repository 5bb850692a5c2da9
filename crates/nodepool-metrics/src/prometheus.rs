//! Prometheus text exposition format.
//!
//! Renders the untaint event counters for scraping by a Prometheus
//! server or compatible agent.

use crate::counter::UntaintEventCounter;

/// Render the untaint counters into Prometheus text format.
///
/// Produces one COUNTER family with `nodegroup` labels.
pub fn render_prometheus(counter: &UntaintEventCounter) -> String {
    let mut out = String::new();

    out.push_str("# HELP nodegroup_untaint_event_total Nodes the scale-up path tried to untaint.\n");
    out.push_str("# TYPE nodegroup_untaint_event_total counter\n");
    for (nodegroup, value) in counter.totals() {
        out.push_str(&format!(
            "nodegroup_untaint_event_total{{nodegroup=\"{}\"}} {}\n",
            escape_label(&nodegroup),
            value
        ));
    }

    out
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
