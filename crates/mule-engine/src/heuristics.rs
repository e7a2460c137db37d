//! Counter-heuristics that suppress smurfing false positives: high-volume
//! storefronts look like fan-in targets and payroll runs look like fan-out
//! bursts. Both traits are derived once from the frozen indices and cached
//! per account.

use petgraph::graph::NodeIndex;

use crate::config::DetectionConfig;
use crate::tx_graph::TransactionGraph;

pub struct AccountTraits {
    merchant_like: Vec<bool>,
    payroll_like: Vec<bool>,
}

impl AccountTraits {
    /// Suppresses fan-in smurf flags only.
    pub fn merchant_like(&self, node: NodeIndex) -> bool {
        self.merchant_like[node.index()]
    }

    /// Suppresses fan-out smurf flags only.
    pub fn payroll_like(&self, node: NodeIndex) -> bool {
        self.payroll_like[node.index()]
    }
}

pub fn classify(graph: &TransactionGraph, cfg: &DetectionConfig) -> AccountTraits {
    let n = graph.node_count();
    let mut merchant_like = vec![false; n];
    let mut payroll_like = vec![false; n];

    for &node in graph.nodes_sorted() {
        merchant_like[node.index()] = is_merchant_like(graph, node, cfg);
        payroll_like[node.index()] = is_payroll_like(graph, node, cfg);
    }

    AccountTraits { merchant_like, payroll_like }
}

/// Steady inbound volume: many payments of similar size over a span of at
/// least two weeks.
fn is_merchant_like(graph: &TransactionGraph, node: NodeIndex, cfg: &DetectionConfig) -> bool {
    let inbound = graph.inbound(node);
    if inbound.len() < cfg.merchant_min_inbound {
        return false;
    }
    let amounts: Vec<f64> = inbound.iter().map(|&e| graph.edge(e).amount).collect();
    match coefficient_of_variation(&amounts) {
        Some(cv) if cv <= cfg.merchant_max_amount_cv => {}
        _ => return false,
    }
    // Indices are timestamp-sorted, so span is last minus first.
    let first = graph.edge(inbound[0]).timestamp;
    let last = graph.edge(inbound[inbound.len() - 1]).timestamp;
    last - first >= cfg.merchant_min_span
}

/// Steady outbound batches landing on several distinct pay dates.
fn is_payroll_like(graph: &TransactionGraph, node: NodeIndex, cfg: &DetectionConfig) -> bool {
    let outbound = graph.outbound(node);
    if outbound.len() < cfg.payroll_min_outbound {
        return false;
    }
    let amounts: Vec<f64> = outbound.iter().map(|&e| graph.edge(e).amount).collect();
    match coefficient_of_variation(&amounts) {
        Some(cv) if cv <= cfg.payroll_max_amount_cv => {}
        _ => return false,
    }
    let mut pay_dates: Vec<_> = outbound
        .iter()
        .map(|&e| graph.edge(e).timestamp.date())
        .collect();
    pay_dates.sort();
    pay_dates.dedup();
    pay_dates.len() >= cfg.payroll_min_pay_dates
}

/// Population standard deviation over mean. `None` for an empty sample or a
/// non-positive mean; degenerate statistics must read as "not suppressed",
/// never as an error.
pub(crate) fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return None;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt() / mean)
}
