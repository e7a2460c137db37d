//! High-velocity detection: accounts moving money faster than people do.
//!
//! This detector emits no rings. Its flags only boost accounts that some
//! other detector already scored; the aggregator enforces that gate.

use petgraph::graph::NodeIndex;
use tracing::info;

use crate::config::DetectionConfig;
use crate::tx_graph::TransactionGraph;

/// Returns flagged nodes in ascending account-ID order.
pub fn detect_high_velocity(graph: &TransactionGraph, cfg: &DetectionConfig) -> Vec<NodeIndex> {
    let mut flagged = Vec::new();

    for &node in graph.nodes_sorted() {
        if graph.tx_count(node) < cfg.velocity_threshold {
            continue;
        }
        // Merged in+out timestamps, with multiplicity.
        let mut times: Vec<_> = graph
            .inbound(node)
            .iter()
            .chain(graph.outbound(node))
            .map(|&e| graph.edge(e).timestamp)
            .collect();
        times.sort();

        let mut start = 0;
        for end in 0..times.len() {
            while times[end] - times[start] > cfg.velocity_window {
                start += 1;
            }
            if end - start + 1 >= cfg.velocity_threshold {
                flagged.push(node);
                break;
            }
        }
    }

    info!(flagged = flagged.len(), "high-velocity detection finished");
    flagged
}
