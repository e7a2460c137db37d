//! Shell-chain detection: layering runs of 3–4 hops where every
//! intermediate account barely transacts at all (total ≤ 3 transactions).
//! Endpoints are unconstrained; a busy account can source or absorb a
//! chain, it just cannot sit in the middle of one.

use std::collections::HashMap;

use petgraph::graph::NodeIndex;
use tracing::info;

use crate::config::DetectionConfig;
use crate::tx_graph::TransactionGraph;

const SHELL_RISK_BASE: u32 = 50;

#[derive(Debug, Clone)]
pub struct ShellRing {
    /// Source, intermediates and terminal in path order.
    pub path: Vec<NodeIndex>,
    pub risk_score: u8,
}

pub fn detect_shell_rings(graph: &TransactionGraph, cfg: &DetectionConfig) -> Vec<ShellRing> {
    // Node-set → best path. Two simple paths over the same node set have
    // the same hop count, so the collapse rule reduces to the endpoint
    // tie-break.
    let mut best: HashMap<Vec<NodeIndex>, Vec<NodeIndex>> = HashMap::new();

    // Sorted successor lists once up front; the DFS below revisits nodes
    // far too often to re-derive them per visit.
    let mut successors: Vec<Vec<NodeIndex>> = vec![Vec::new(); graph.node_count()];
    for &node in graph.nodes_sorted() {
        successors[node.index()] = graph.distinct_successors(node);
    }

    let mut path = Vec::with_capacity(cfg.shell_max_hops + 1);
    for &source in graph.nodes_sorted() {
        path.clear();
        path.push(source);
        extend(graph, cfg, &successors, source, &mut path, &mut best);
    }

    let mut rings: Vec<ShellRing> = best
        .into_values()
        .map(|path| {
            let hops = path.len() - 1;
            let risk = (SHELL_RISK_BASE + 10 * hops as u32).min(100);
            ShellRing { path, risk_score: risk as u8 }
        })
        .collect();
    rings.sort_by(|a, b| {
        let key = |r: &ShellRing| -> Vec<&str> {
            let mut ids: Vec<&str> = r.path.iter().map(|&n| graph.account_id(n)).collect();
            ids.sort();
            ids
        };
        key(a).cmp(&key(b))
    });

    info!(rings = rings.len(), "shell detection finished");
    rings
}

fn extend(
    graph: &TransactionGraph,
    cfg: &DetectionConfig,
    successors: &[Vec<NodeIndex>],
    current: NodeIndex,
    path: &mut Vec<NodeIndex>,
    best: &mut HashMap<Vec<NodeIndex>, Vec<NodeIndex>>,
) {
    for &next in &successors[current.index()] {
        if path.contains(&next) {
            continue;
        }
        let hops = path.len(); // edge count of the extended path
        if hops >= cfg.shell_min_hops {
            path.push(next);
            record(graph, path, best);
            path.pop();
        }
        // Only a low-activity account may carry the chain further.
        if hops < cfg.shell_max_hops && graph.tx_count(next) <= cfg.shell_max_intermediate_txs {
            path.push(next);
            extend(graph, cfg, successors, next, path, best);
            path.pop();
        }
    }
}

fn record(
    graph: &TransactionGraph,
    path: &[NodeIndex],
    best: &mut HashMap<Vec<NodeIndex>, Vec<NodeIndex>>,
) {
    let mut key = path.to_vec();
    key.sort();
    match best.get_mut(&key) {
        None => {
            best.insert(key, path.to_vec());
        }
        Some(current) => {
            if prefer(graph, path, current) {
                *current = path.to_vec();
            }
        }
    }
}

/// Collapse rule: shorter path wins; on equal length the lexicographically
/// smallest endpoint ordering (then full sequence) wins.
fn prefer(graph: &TransactionGraph, candidate: &[NodeIndex], current: &[NodeIndex]) -> bool {
    if candidate.len() != current.len() {
        return candidate.len() < current.len();
    }
    let ids = |p: &[NodeIndex]| -> Vec<&str> { p.iter().map(|&n| graph.account_id(n)).collect() };
    let ca = ids(candidate);
    let cu = ids(current);
    (ca[0], ca[ca.len() - 1], &ca) < (cu[0], cu[cu.len() - 1], &cu)
}
