//! Cycle detection: money returning to its origin through 3–5 accounts.
//!
//! Cycles are enumerated by a depth-bounded DFS restricted to strongly
//! connected components of workable size, then deduplicated on their node
//! set. SCCs above the size cap are skipped wholesale; that is a policy to
//! bound the worst case, not an error.

use std::collections::{HashMap, HashSet};

use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use tracing::info;

use crate::config::DetectionConfig;
use crate::tx_graph::TransactionGraph;

const CYCLE_RISK_BASE: u32 = 70;

#[derive(Debug, Clone)]
pub struct CycleRing {
    /// First-seen directed ordering, starting at the cycle's minimum
    /// account ID.
    pub members: Vec<NodeIndex>,
    pub risk_score: u8,
}

pub fn detect_cycle_rings(graph: &TransactionGraph, cfg: &DetectionConfig) -> Vec<CycleRing> {
    let mut sccs: Vec<Vec<NodeIndex>> = tarjan_scc(graph.petgraph())
        .into_iter()
        .filter(|scc| scc.len() >= cfg.cycle_min_len)
        .collect();
    let oversized = sccs.iter().filter(|scc| scc.len() > cfg.scc_max_size).count();
    sccs.retain(|scc| scc.len() <= cfg.scc_max_size);

    // Deterministic component order: by minimum member account ID.
    for scc in sccs.iter_mut() {
        scc.sort_by(|&a, &b| graph.account_id(a).cmp(graph.account_id(b)));
    }
    sccs.sort_by(|a, b| graph.account_id(a[0]).cmp(graph.account_id(b[0])));

    let mut rings: Vec<CycleRing> = Vec::new();
    let mut seen: HashSet<Vec<NodeIndex>> = HashSet::new();

    for scc in &sccs {
        let in_scc: HashSet<NodeIndex> = scc.iter().copied().collect();
        let successors: HashMap<NodeIndex, Vec<NodeIndex>> = scc
            .iter()
            .map(|&node| {
                let succ = graph
                    .distinct_successors(node)
                    .into_iter()
                    .filter(|s| in_scc.contains(s))
                    .collect();
                (node, succ)
            })
            .collect();

        let mut path = Vec::with_capacity(cfg.cycle_max_len);
        for &start in scc {
            path.clear();
            path.push(start);
            dfs(start, start, &mut path, &successors, cfg, &mut |cycle| {
                let mut key = cycle.to_vec();
                key.sort();
                if seen.insert(key) {
                    let risk = (CYCLE_RISK_BASE + 10 * (cycle.len() as u32 - 3)).min(100);
                    rings.push(CycleRing { members: cycle.to_vec(), risk_score: risk as u8 });
                }
            });
        }
    }

    info!(
        components = sccs.len(),
        skipped_oversized = oversized,
        unique_cycles = rings.len(),
        "cycle detection finished"
    );
    rings
}

fn dfs(
    start: NodeIndex,
    current: NodeIndex,
    path: &mut Vec<NodeIndex>,
    successors: &HashMap<NodeIndex, Vec<NodeIndex>>,
    cfg: &DetectionConfig,
    record: &mut impl FnMut(&[NodeIndex]),
) {
    for &next in &successors[&current] {
        if next == start {
            if path.len() >= cfg.cycle_min_len {
                record(path);
            }
            continue;
        }
        if path.contains(&next) {
            continue;
        }
        if path.len() < cfg.cycle_max_len {
            path.push(next);
            dfs(start, next, path, successors, cfg, record);
            path.pop();
        }
    }
}
