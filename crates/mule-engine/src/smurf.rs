//! Smurf detection: bursts of many distinct counterparties hitting one
//! account inside a 72-hour window, both fan-in (many senders, one
//! receiver) and fan-out (one sender, many receivers).
//!
//! The scan keeps a two-pointer window over the timestamp-sorted edge list
//! and a counterparty frequency map: increment on entry, decrement on
//! eviction, drop the key at zero. The window is inclusive on both ends.

use std::collections::HashMap;

use petgraph::graph::{EdgeIndex, NodeIndex};
use tracing::info;

use crate::config::DetectionConfig;
use crate::heuristics::AccountTraits;
use crate::tx_graph::TransactionGraph;

const SMURF_RISK: u8 = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmurfDirection {
    FanIn,
    FanOut,
}

#[derive(Debug, Clone)]
pub struct SmurfRing {
    pub focal: NodeIndex,
    /// Counterparties present in the window when the threshold was first
    /// crossed, in ascending account-ID order.
    pub counterparties: Vec<NodeIndex>,
    pub direction: SmurfDirection,
    pub risk_score: u8,
}

pub fn detect_smurf_rings(
    graph: &TransactionGraph,
    traits: &AccountTraits,
    cfg: &DetectionConfig,
) -> Vec<SmurfRing> {
    let mut rings = Vec::new();

    for &node in graph.nodes_sorted() {
        // At most one ring per (account, direction), however often the
        // window crosses the threshold afterwards.
        if !traits.merchant_like(node) {
            if let Some(counterparties) =
                scan(graph, node, graph.inbound(node), |e| graph.endpoints(e).0, cfg)
            {
                rings.push(SmurfRing {
                    focal: node,
                    counterparties,
                    direction: SmurfDirection::FanIn,
                    risk_score: SMURF_RISK,
                });
            }
        }
        if !traits.payroll_like(node) {
            if let Some(counterparties) =
                scan(graph, node, graph.outbound(node), |e| graph.endpoints(e).1, cfg)
            {
                rings.push(SmurfRing {
                    focal: node,
                    counterparties,
                    direction: SmurfDirection::FanOut,
                    risk_score: SMURF_RISK,
                });
            }
        }
    }

    info!(rings = rings.len(), "smurf detection finished");
    rings
}

/// Slides the window over `edges` and returns the counterparty set at the
/// first instant it reaches the threshold. Self-loops stay in the window
/// but the focal account is never its own counterparty.
fn scan(
    graph: &TransactionGraph,
    focal: NodeIndex,
    edges: &[EdgeIndex],
    counterparty: impl Fn(EdgeIndex) -> NodeIndex,
    cfg: &DetectionConfig,
) -> Option<Vec<NodeIndex>> {
    if edges.len() < cfg.smurf_min_counterparties {
        return None;
    }

    let mut counts: HashMap<NodeIndex, usize> = HashMap::new();
    let mut start = 0;
    for &edge in edges {
        let entering = counterparty(edge);
        if entering != focal {
            *counts.entry(entering).or_insert(0) += 1;
        }
        let newest = graph.edge(edge).timestamp;
        while newest - graph.edge(edges[start]).timestamp > cfg.smurf_window {
            let evicted = counterparty(edges[start]);
            if evicted != focal {
                if let Some(n) = counts.get_mut(&evicted) {
                    *n -= 1;
                    if *n == 0 {
                        counts.remove(&evicted);
                    }
                }
            }
            start += 1;
        }
        if counts.len() >= cfg.smurf_min_counterparties {
            let mut members: Vec<NodeIndex> = counts.keys().copied().collect();
            members.sort_by(|&a, &b| graph.account_id(a).cmp(graph.account_id(b)));
            return Some(members);
        }
    }
    None
}
