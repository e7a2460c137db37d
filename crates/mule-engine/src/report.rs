//! Serialized output model: the analysis result consumed by callers and
//! the node/edge payload consumed by the visualization layer.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Ring pattern families, in detector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Cycle,
    SmurfFanIn,
    SmurfFanOut,
    Shell,
}

impl PatternType {
    pub fn label(self) -> &'static str {
        match self {
            PatternType::Cycle => "cycle",
            PatternType::SmurfFanIn => "smurf_fan_in",
            PatternType::SmurfFanOut => "smurf_fan_out",
            PatternType::Shell => "shell",
        }
    }
}

/// Label used on accounts flagged by the high-velocity detector; it never
/// names a ring.
pub const HIGH_VELOCITY_LABEL: &str = "high_velocity";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudRing {
    pub ring_id: String,
    pub pattern_type: PatternType,
    pub member_accounts: Vec<String>,
    pub risk_score: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspiciousAccount {
    pub account_id: String,
    pub suspicion_score: u8,
    /// Deduplicated, in first-detection order.
    pub detected_patterns: Vec<String>,
    /// First ring this account was assigned to; empty only if the account
    /// was flagged by high-velocity alone (which the gate never emits).
    pub ring_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub total_accounts_analyzed: usize,
    pub suspicious_accounts_flagged: usize,
    pub fraud_rings_detected: usize,
    pub processing_time_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub suspicious_accounts: Vec<SuspiciousAccount>,
    pub fraud_rings: Vec<FraudRing>,
    pub summary: Summary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub suspicion_score: Option<u8>,
    pub detected_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub amount: f64,
    #[serde(with = "civil_timestamp")]
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphPayload {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Full engine output: the result document plus the visualization payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub result: AnalysisResult,
    pub graph: GraphPayload,
}

/// Timestamps cross the wire in the same civil format the CSV uses.
pub mod civil_timestamp {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    use crate::ingest::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
