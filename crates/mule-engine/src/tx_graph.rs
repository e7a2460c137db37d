//! The transaction multigraph and its frozen per-account indices.
//!
//! Nodes are account IDs interned on first sighting; every transaction
//! becomes one directed edge, parallel edges included. After `build` the
//! graph is read-only: detectors share it by reference.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::info;

use crate::ingest::Transaction;

/// Edge payload: the originating transaction.
#[derive(Debug, Clone)]
pub struct TxEdge {
    pub transaction_id: String,
    pub amount: f64,
    pub timestamp: NaiveDateTime,
}

pub struct TransactionGraph {
    graph: DiGraph<String, TxEdge>,
    node_map: HashMap<String, NodeIndex>,
    /// Per-node edge lists sorted ascending by timestamp; equal timestamps
    /// keep input order. Indexed by `NodeIndex::index()`.
    outbound: Vec<Vec<EdgeIndex>>,
    inbound: Vec<Vec<EdgeIndex>>,
    /// All nodes in ascending account-ID order, for deterministic iteration.
    sorted_nodes: Vec<NodeIndex>,
}

impl TransactionGraph {
    pub fn build(transactions: &[Transaction]) -> Self {
        let mut graph: DiGraph<String, TxEdge> = DiGraph::new();
        let mut node_map: HashMap<String, NodeIndex> = HashMap::new();

        let mut get_or_add = |graph: &mut DiGraph<String, TxEdge>, id: &str| -> NodeIndex {
            if let Some(&idx) = node_map.get(id) {
                return idx;
            }
            let idx = graph.add_node(id.to_owned());
            node_map.insert(id.to_owned(), idx);
            idx
        };

        for tx in transactions {
            let from = get_or_add(&mut graph, &tx.sender_id);
            let to = get_or_add(&mut graph, &tx.receiver_id);
            graph.add_edge(
                from,
                to,
                TxEdge {
                    transaction_id: tx.transaction_id.clone(),
                    amount: tx.amount,
                    timestamp: tx.timestamp,
                },
            );
        }

        let mut outbound = vec![Vec::new(); graph.node_count()];
        let mut inbound = vec![Vec::new(); graph.node_count()];
        for edge in graph.edge_references() {
            outbound[edge.source().index()].push(edge.id());
            inbound[edge.target().index()].push(edge.id());
        }
        // Stable sort keeps input order for equal timestamps.
        for list in outbound.iter_mut().chain(inbound.iter_mut()) {
            list.sort_by_key(|&e| graph[e].timestamp);
        }

        let mut sorted_nodes: Vec<NodeIndex> = graph.node_indices().collect();
        sorted_nodes.sort_by(|&a, &b| graph[a].cmp(&graph[b]));

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "transaction graph built"
        );

        Self { graph, node_map, outbound, inbound, sorted_nodes }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn account_id(&self, node: NodeIndex) -> &str {
        &self.graph[node]
    }

    pub fn node(&self, account: &str) -> Option<NodeIndex> {
        self.node_map.get(account).copied()
    }

    pub fn contains(&self, node: NodeIndex) -> bool {
        self.graph.node_weight(node).is_some()
    }

    /// All nodes in ascending account-ID order.
    pub fn nodes_sorted(&self) -> &[NodeIndex] {
        &self.sorted_nodes
    }

    /// Outbound edges of `node`, ascending by timestamp.
    pub fn outbound(&self, node: NodeIndex) -> &[EdgeIndex] {
        &self.outbound[node.index()]
    }

    /// Inbound edges of `node`, ascending by timestamp.
    pub fn inbound(&self, node: NodeIndex) -> &[EdgeIndex] {
        &self.inbound[node.index()]
    }

    /// Total transaction count, in-degree + out-degree with multiplicity.
    pub fn tx_count(&self, node: NodeIndex) -> usize {
        self.inbound[node.index()].len() + self.outbound[node.index()].len()
    }

    pub fn edge(&self, edge: EdgeIndex) -> &TxEdge {
        &self.graph[edge]
    }

    pub fn endpoints(&self, edge: EdgeIndex) -> (NodeIndex, NodeIndex) {
        self.graph
            .edge_endpoints(edge)
            .expect("edge index from this graph")
    }

    /// Distinct successor nodes in ascending account-ID order. Parallel
    /// edges collapse to one entry.
    pub fn distinct_successors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut succ: Vec<NodeIndex> = self.outbound[node.index()]
            .iter()
            .map(|&e| self.endpoints(e).1)
            .collect();
        succ.sort_by(|&a, &b| self.graph[a].cmp(&self.graph[b]));
        succ.dedup();
        succ
    }

    /// Edges in input order: `(source, target, payload)`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, &TxEdge)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (e.source(), e.target(), e.weight()))
    }

    pub(crate) fn petgraph(&self) -> &DiGraph<String, TxEdge> {
        &self.graph
    }
}
