//! Aggregation: detector outputs in, the ranked suspicion report out.
//!
//! Everything here is deterministic. Ring IDs run `R1, R2, …` across the
//! detectors in a fixed order (cycle, fan-in, fan-out, shell), each
//! detector's rings ordered by ascending minimum member account ID. The
//! aggregator is the only writer of result structures and validates every
//! ring before emission.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use petgraph::graph::NodeIndex;
use tracing::info;

use crate::config::DetectionConfig;
use crate::cycle::CycleRing;
use crate::error::EngineError;
use crate::report::{
    AnalysisResult, FraudRing, PatternType, Summary, SuspiciousAccount, HIGH_VELOCITY_LABEL,
};
use crate::shell::ShellRing;
use crate::smurf::{SmurfDirection, SmurfRing};
use crate::tx_graph::TransactionGraph;

struct PendingRing {
    pattern: PatternType,
    members: Vec<NodeIndex>,
    risk_score: u8,
}

#[derive(Default)]
struct AccountState {
    score: u32,
    patterns: Vec<String>,
    contributed: HashSet<PatternType>,
    ring_id: Option<String>,
}

pub fn aggregate(
    graph: &TransactionGraph,
    cycles: Vec<CycleRing>,
    smurfs: Vec<SmurfRing>,
    shells: Vec<ShellRing>,
    high_velocity: &[NodeIndex],
    cfg: &DetectionConfig,
) -> Result<AnalysisResult, EngineError> {
    let rings = order_rings(graph, cycles, smurfs, shells);
    for ring in &rings {
        validate_ring(graph, ring)?;
    }

    let mut accounts: HashMap<NodeIndex, AccountState> = HashMap::new();
    let mut fraud_rings = Vec::with_capacity(rings.len());

    for (seq, ring) in rings.into_iter().enumerate() {
        let ring_id = format!("R{}", seq + 1);
        let points = match ring.pattern {
            PatternType::Cycle => cfg.score_cycle,
            PatternType::SmurfFanIn => cfg.score_fan_in,
            PatternType::SmurfFanOut => cfg.score_fan_out,
            PatternType::Shell => cfg.score_shell,
        };

        for &member in &ring.members {
            let state = accounts.entry(member).or_default();
            if state.contributed.insert(ring.pattern) {
                state.score += points;
                state.patterns.push(ring.pattern.label().to_string());
            }
            if state.ring_id.is_none() {
                state.ring_id = Some(ring_id.clone());
            }
        }

        fraud_rings.push(FraudRing {
            ring_id,
            pattern_type: ring.pattern,
            member_accounts: ring
                .members
                .iter()
                .map(|&m| graph.account_id(m).to_string())
                .collect(),
            risk_score: ring.risk_score,
        });
    }

    // High velocity never flags on its own: the boost applies only to
    // accounts some other detector already scored.
    for &node in high_velocity {
        if let Some(state) = accounts.get_mut(&node) {
            if state.score > 0 {
                state.score += cfg.score_high_velocity;
                state.patterns.push(HIGH_VELOCITY_LABEL.to_string());
            }
        }
    }

    let mut suspicious_accounts: Vec<SuspiciousAccount> = accounts
        .into_iter()
        .filter(|(_, state)| state.score > 0)
        .map(|(node, state)| SuspiciousAccount {
            account_id: graph.account_id(node).to_string(),
            suspicion_score: state.score.min(cfg.score_cap) as u8,
            detected_patterns: state.patterns,
            ring_id: state.ring_id.unwrap_or_default(),
        })
        .collect();
    suspicious_accounts
        .sort_by(|a, b| {
            (Reverse(a.suspicion_score), &a.account_id)
                .cmp(&(Reverse(b.suspicion_score), &b.account_id))
        });

    info!(
        accounts = graph.node_count(),
        suspicious = suspicious_accounts.len(),
        rings = fraud_rings.len(),
        "aggregation finished"
    );

    Ok(AnalysisResult {
        summary: Summary {
            total_accounts_analyzed: graph.node_count(),
            suspicious_accounts_flagged: suspicious_accounts.len(),
            fraud_rings_detected: fraud_rings.len(),
            processing_time_seconds: 0.0, // the engine stamps the wall clock
        },
        suspicious_accounts,
        fraud_rings,
    })
}

/// Flattens detector outputs into ID-assignment order: detector family
/// first, then ascending minimum member account ID, ties broken by the
/// full sorted member sequence.
fn order_rings(
    graph: &TransactionGraph,
    cycles: Vec<CycleRing>,
    smurfs: Vec<SmurfRing>,
    shells: Vec<ShellRing>,
) -> Vec<PendingRing> {
    let mut fan_in = Vec::new();
    let mut fan_out = Vec::new();
    for ring in smurfs {
        let mut members = Vec::with_capacity(ring.counterparties.len() + 1);
        members.push(ring.focal);
        members.extend(ring.counterparties);
        let pending = PendingRing {
            pattern: match ring.direction {
                SmurfDirection::FanIn => PatternType::SmurfFanIn,
                SmurfDirection::FanOut => PatternType::SmurfFanOut,
            },
            members,
            risk_score: ring.risk_score,
        };
        match ring.direction {
            SmurfDirection::FanIn => fan_in.push(pending),
            SmurfDirection::FanOut => fan_out.push(pending),
        }
    }

    let mut groups = [
        cycles
            .into_iter()
            .map(|r| PendingRing {
                pattern: PatternType::Cycle,
                members: r.members,
                risk_score: r.risk_score,
            })
            .collect::<Vec<_>>(),
        fan_in,
        fan_out,
        shells
            .into_iter()
            .map(|r| PendingRing {
                pattern: PatternType::Shell,
                members: r.path,
                risk_score: r.risk_score,
            })
            .collect(),
    ];

    for group in groups.iter_mut() {
        group.sort_by_cached_key(|ring| {
            let mut ids: Vec<String> = ring
                .members
                .iter()
                .map(|&m| graph.account_id(m).to_string())
                .collect();
            ids.sort();
            ids
        });
    }

    groups.into_iter().flatten().collect()
}

fn validate_ring(graph: &TransactionGraph, ring: &PendingRing) -> Result<(), EngineError> {
    if ring.members.is_empty() {
        return Err(EngineError::InvariantViolation(format!(
            "{} ring has no members",
            ring.pattern.label()
        )));
    }
    let mut seen = HashSet::new();
    for &member in &ring.members {
        if !graph.contains(member) {
            return Err(EngineError::InvariantViolation(format!(
                "{} ring references a node missing from the graph",
                ring.pattern.label()
            )));
        }
        if !seen.insert(member) {
            return Err(EngineError::InvariantViolation(format!(
                "{} ring lists account {} twice",
                ring.pattern.label(),
                graph.account_id(member)
            )));
        }
    }
    if ring.risk_score > 100 {
        return Err(EngineError::InvariantViolation(format!(
            "{} ring risk score {} exceeds 100",
            ring.pattern.label(),
            ring.risk_score
        )));
    }
    Ok(())
}
