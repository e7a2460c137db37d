//! Single-shot detection engine: a transaction batch in, the suspicion
//! report and visualization payload out. The graph is frozen after build,
//! so the independent detectors fan out to rayon workers; the smurf pass
//! waits for the counter-heuristics it consumes, and the aggregator runs
//! last as the sole writer of result structures.

use std::collections::HashMap;
use std::time::Instant;

use tracing::info;

use crate::config::DetectionConfig;
use crate::error::EngineError;
use crate::ingest::Transaction;
use crate::report::{
    AnalysisReport, AnalysisResult, GraphEdge, GraphNode, GraphPayload, SuspiciousAccount,
};
use crate::tx_graph::TransactionGraph;
use crate::{cycle, heuristics, score, shell, smurf, velocity};

pub struct MulingDetector {
    config: DetectionConfig,
}

impl Default for MulingDetector {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}

impl MulingDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Runs the full detection pass over one transaction batch.
    ///
    /// An empty batch is not an error: it yields an empty result with
    /// `total_accounts_analyzed = 0`.
    pub fn analyze(&self, transactions: &[Transaction]) -> Result<AnalysisReport, EngineError> {
        let started = Instant::now();
        let cfg = &self.config;

        let graph = TransactionGraph::build(transactions);

        let ((traits, cycles), (shells, high_velocity)) = rayon::join(
            || {
                rayon::join(
                    || heuristics::classify(&graph, cfg),
                    || cycle::detect_cycle_rings(&graph, cfg),
                )
            },
            || {
                rayon::join(
                    || shell::detect_shell_rings(&graph, cfg),
                    || velocity::detect_high_velocity(&graph, cfg),
                )
            },
        );
        let smurfs = smurf::detect_smurf_rings(&graph, &traits, cfg);

        let mut result = score::aggregate(&graph, cycles, smurfs, shells, &high_velocity, cfg)?;
        let payload = build_graph_payload(&graph, &result);

        result.summary.processing_time_seconds = round_millis(started.elapsed().as_secs_f64());
        info!(
            accounts = result.summary.total_accounts_analyzed,
            suspicious = result.summary.suspicious_accounts_flagged,
            rings = result.summary.fraud_rings_detected,
            seconds = result.summary.processing_time_seconds,
            "analysis complete"
        );

        Ok(AnalysisReport { result, graph: payload })
    }
}

fn build_graph_payload(graph: &TransactionGraph, result: &AnalysisResult) -> GraphPayload {
    let flagged: HashMap<&str, &SuspiciousAccount> = result
        .suspicious_accounts
        .iter()
        .map(|s| (s.account_id.as_str(), s))
        .collect();

    // Nodes in first-sighting order, edges in input order: both stable for
    // one invocation.
    let nodes = graph
        .petgraph()
        .node_indices()
        .map(|n| {
            let id = graph.account_id(n);
            let entry = flagged.get(id);
            GraphNode {
                id: id.to_string(),
                label: id.to_string(),
                suspicion_score: entry.map(|s| s.suspicion_score),
                detected_patterns: entry
                    .map(|s| s.detected_patterns.clone())
                    .unwrap_or_default(),
            }
        })
        .collect();

    let edges = graph
        .edges()
        .map(|(source, target, edge)| GraphEdge {
            id: edge.transaction_id.clone(),
            source: graph.account_id(source).to_string(),
            target: graph.account_id(target).to_string(),
            amount: edge.amount,
            timestamp: edge.timestamp,
        })
        .collect();

    GraphPayload { nodes, edges }
}

fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::PatternType;
    use crate::test_util::{ts, tx};

    fn analyze(txs: &[Transaction]) -> AnalysisReport {
        MulingDetector::default().analyze(txs).unwrap()
    }

    fn account<'a>(result: &'a AnalysisResult, id: &str) -> &'a SuspiciousAccount {
        result
            .suspicious_accounts
            .iter()
            .find(|s| s.account_id == id)
            .unwrap_or_else(|| panic!("account {id} not flagged"))
    }

    fn triangle() -> Vec<Transaction> {
        vec![
            tx("T1", "A", "B", 1000.0, "2024-01-15 10:00:00"),
            tx("T2", "B", "C", 1000.0, "2024-01-15 11:00:00"),
            tx("T3", "C", "A", 1000.0, "2024-01-15 12:00:00"),
        ]
    }

    fn fan_in_burst() -> Vec<Transaction> {
        (0..10)
            .map(|i| Transaction {
                transaction_id: format!("F{i}"),
                sender_id: format!("S{i:02}"),
                receiver_id: "R".to_string(),
                amount: 9000.0,
                timestamp: ts("2024-02-01 08:00:00") + chrono::Duration::hours(i),
            })
            .collect()
    }

    fn shell_chain() -> Vec<Transaction> {
        vec![
            tx("H1", "SRC", "M1", 4000.0, "2024-03-01 10:00:00"),
            tx("H2", "M1", "M2", 3900.0, "2024-03-01 12:00:00"),
            tx("H3", "M2", "DST", 3800.0, "2024-03-01 14:00:00"),
        ]
    }

    #[test]
    fn test_minimal_three_cycle_scenario() {
        let report = analyze(&triangle());
        let result = &report.result;

        assert_eq!(result.fraud_rings.len(), 1);
        let ring = &result.fraud_rings[0];
        assert_eq!(ring.ring_id, "R1");
        assert_eq!(ring.pattern_type, PatternType::Cycle);
        assert_eq!(ring.member_accounts, vec!["A", "B", "C"]);
        assert_eq!(ring.risk_score, 70);

        assert_eq!(result.suspicious_accounts.len(), 3);
        for id in ["A", "B", "C"] {
            let acc = account(result, id);
            assert_eq!(acc.suspicion_score, 40);
            assert_eq!(acc.detected_patterns, vec!["cycle"]);
            assert_eq!(acc.ring_id, "R1");
        }
        assert_eq!(result.summary.total_accounts_analyzed, 3);
    }

    #[test]
    fn test_fan_in_smurf_scenario() {
        let report = analyze(&fan_in_burst());
        let result = &report.result;

        assert_eq!(result.fraud_rings.len(), 1);
        let ring = &result.fraud_rings[0];
        assert_eq!(ring.pattern_type, PatternType::SmurfFanIn);
        assert_eq!(ring.risk_score, 75);
        assert_eq!(ring.member_accounts[0], "R");
        assert_eq!(ring.member_accounts.len(), 11);

        let r = account(result, "R");
        assert_eq!(r.suspicion_score, 30);
        assert_eq!(r.detected_patterns, vec!["smurf_fan_in"]);
    }

    #[test]
    fn test_merchant_suppression_scenario() {
        // The fan-in burst rides on 300 steady same-amount payments spread
        // over 30 days: the receiver reads as a storefront and no smurf
        // ring is emitted.
        let mut txs: Vec<Transaction> = (0..300)
            .map(|i| Transaction {
                transaction_id: format!("BG{i}"),
                sender_id: format!("BG{i:04}"),
                receiver_id: "R".to_string(),
                amount: 9000.0,
                timestamp: ts("2024-01-01 00:00:00") + chrono::Duration::hours(i as i64 * 720 / 300),
            })
            .collect();
        txs.extend(fan_in_burst());

        let report = analyze(&txs);
        assert!(report.result.fraud_rings.is_empty());
        assert!(report.result.suspicious_accounts.is_empty());
    }

    #[test]
    fn test_shell_chain_scenario() {
        let report = analyze(&shell_chain());
        let result = &report.result;

        assert_eq!(result.fraud_rings.len(), 1);
        let ring = &result.fraud_rings[0];
        assert_eq!(ring.pattern_type, PatternType::Shell);
        assert_eq!(ring.member_accounts, vec!["SRC", "M1", "M2", "DST"]);
        assert_eq!(ring.risk_score, 80);

        for id in ["SRC", "M1", "M2", "DST"] {
            assert_eq!(account(result, id).suspicion_score, 35);
        }
    }

    #[test]
    fn test_high_velocity_alone_is_gated_out() {
        // Forty transactions inside twelve hours, but fanned over only
        // five distinct recipients so no smurf ring co-fires.
        let txs: Vec<Transaction> = (0..40)
            .map(|i| Transaction {
                transaction_id: format!("V{i}"),
                sender_id: "X".to_string(),
                receiver_id: format!("Y{}", i % 5),
                amount: 200.0,
                timestamp: ts("2024-04-01 06:00:00") + chrono::Duration::minutes(i as i64 * 18),
            })
            .collect();

        let report = analyze(&txs);
        assert!(report.result.fraud_rings.is_empty());
        assert!(report.result.suspicious_accounts.is_empty());
    }

    #[test]
    fn test_cycle_plus_high_velocity_scenario() {
        let mut txs = triangle();
        // A also fires 28 rapid transfers to one counterparty, bringing it
        // to 30 transactions inside 24 hours.
        for i in 0..28 {
            txs.push(Transaction {
                transaction_id: format!("V{i}"),
                sender_id: "A".to_string(),
                receiver_id: "D".to_string(),
                amount: 150.0,
                timestamp: ts("2024-01-15 13:00:00") + chrono::Duration::minutes(i),
            });
        }

        let report = analyze(&txs);
        let result = &report.result;
        assert_eq!(result.fraud_rings.len(), 1);

        let a = account(result, "A");
        assert_eq!(a.suspicion_score, 50);
        assert_eq!(a.detected_patterns, vec!["cycle", "high_velocity"]);
        assert_eq!(account(result, "B").suspicion_score, 40);
        assert_eq!(account(result, "C").suspicion_score, 40);
        assert!(result.suspicious_accounts.iter().all(|s| s.account_id != "D"));

        // Highest score first.
        assert_eq!(result.suspicious_accounts[0].account_id, "A");
    }

    #[test]
    fn test_empty_input_yields_empty_result() {
        let report = analyze(&[]);
        let result = &report.result;
        assert!(result.suspicious_accounts.is_empty());
        assert!(result.fraud_rings.is_empty());
        assert_eq!(result.summary.total_accounts_analyzed, 0);
        assert_eq!(result.summary.suspicious_accounts_flagged, 0);
        assert_eq!(result.summary.fraud_rings_detected, 0);
        assert!(report.graph.nodes.is_empty());
        assert!(report.graph.edges.is_empty());
    }

    #[test]
    fn test_ring_numbering_across_detectors() {
        let mut txs = triangle();
        txs.extend(fan_in_burst());
        txs.extend(shell_chain());

        let report = analyze(&txs);
        let kinds: Vec<(&str, PatternType)> = report
            .result
            .fraud_rings
            .iter()
            .map(|r| (r.ring_id.as_str(), r.pattern_type))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("R1", PatternType::Cycle),
                ("R2", PatternType::SmurfFanIn),
                ("R3", PatternType::Shell),
            ]
        );
    }

    #[test]
    fn test_output_is_deterministic() {
        let mut txs = triangle();
        txs.extend(fan_in_burst());
        txs.extend(shell_chain());

        let mut a = analyze(&txs);
        let mut b = analyze(&txs);
        a.result.summary.processing_time_seconds = 0.0;
        b.result.summary.processing_time_seconds = 0.0;

        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_summary_counts_match_lists() {
        let mut txs = triangle();
        txs.extend(fan_in_burst());

        let result = analyze(&txs).result;
        assert_eq!(result.summary.fraud_rings_detected, result.fraud_rings.len());
        assert_eq!(
            result.summary.suspicious_accounts_flagged,
            result.suspicious_accounts.len()
        );
    }

    #[test]
    fn test_graph_payload_mirrors_input() {
        let txs = triangle();
        let report = analyze(&txs);

        assert_eq!(report.graph.nodes.len(), 3);
        assert_eq!(report.graph.edges.len(), 3);
        let ids: Vec<&str> = report.graph.edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["T1", "T2", "T3"]);
        assert_eq!(report.graph.edges[0].source, "A");
        assert_eq!(report.graph.edges[0].target, "B");

        let node_a = report.graph.nodes.iter().find(|n| n.id == "A").unwrap();
        assert_eq!(node_a.label, "A");
        assert_eq!(node_a.suspicion_score, Some(40));
        assert_eq!(node_a.detected_patterns, vec!["cycle"]);
    }

    #[test]
    fn test_scores_stay_within_bounds() {
        // Cycle + fan-in + fan-out membership sums to the cap exactly.
        let mut txs = triangle();
        // A receives a fan-in burst.
        for i in 0..10 {
            txs.push(Transaction {
                transaction_id: format!("F{i}"),
                sender_id: format!("S{i:02}"),
                receiver_id: "A".to_string(),
                amount: 9000.0,
                timestamp: ts("2024-01-16 08:00:00") + chrono::Duration::hours(i),
            });
        }
        // A fans out to ten recipients.
        for i in 0..10 {
            txs.push(Transaction {
                transaction_id: format!("O{i}"),
                sender_id: "A".to_string(),
                receiver_id: format!("Q{i:02}"),
                amount: 880.0,
                timestamp: ts("2024-01-17 08:00:00") + chrono::Duration::hours(i),
            });
        }

        let result = analyze(&txs).result;
        for acc in &result.suspicious_accounts {
            assert!(acc.suspicion_score >= 1 && acc.suspicion_score <= 100);
        }
        let a = account(&result, "A");
        assert_eq!(a.suspicion_score, 100);
        assert_eq!(a.ring_id, "R1");
    }
}
