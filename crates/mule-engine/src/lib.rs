//! Money-muling detection over a directed, time-stamped transaction
//! multigraph.
//!
//! One invocation ingests a transaction batch, builds a frozen graph with
//! per-account indices, runs four pattern detectors (cycle, smurf, shell,
//! high-velocity) behind a merchant/payroll counter-heuristic layer, and
//! aggregates everything into per-account suspicion scores, fraud rings and
//! a summary. No state survives the call.

pub mod config;
pub mod cycle;
pub mod engine;
pub mod error;
pub mod heuristics;
pub mod ingest;
pub mod report;
pub mod score;
pub mod shell;
pub mod smurf;
pub mod tx_graph;
pub mod velocity;

#[cfg(test)]
pub(crate) mod test_util;

pub use config::DetectionConfig;
pub use engine::MulingDetector;
pub use error::EngineError;
pub use ingest::{parse_csv, Transaction};
pub use report::{
    AnalysisReport, AnalysisResult, FraudRing, GraphPayload, PatternType, Summary,
    SuspiciousAccount,
};
pub use tx_graph::TransactionGraph;
