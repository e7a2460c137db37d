//! CSV ingestion boundary: raw upload bytes in, validated transaction
//! records out. The detection core never sees a malformed record.

use std::io::Read;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::error::EngineError;

/// Civil timestamp format used by the CSV input and the graph payload.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const REQUIRED_COLUMNS: [&str; 5] =
    ["transaction_id", "sender_id", "receiver_id", "amount", "timestamp"];

/// A single validated transfer. Self-loops (`sender_id == receiver_id`) are
/// legal input and kept as graph edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub transaction_id: String,
    pub sender_id: String,
    pub receiver_id: String,
    /// Finite and strictly positive.
    pub amount: f64,
    /// Naive civil time, second resolution.
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    transaction_id: String,
    sender_id: String,
    receiver_id: String,
    amount: String,
    timestamp: String,
}

/// Parses a CSV document into a transaction batch.
///
/// The header row must contain the five required columns; extra columns are
/// ignored. Any malformed record rejects the whole batch with its 1-based
/// line number (the header is line 1). A header-only document yields an
/// empty batch: empty input is the caller's concern, not an error here.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<Transaction>, EngineError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| EngineError::rejected(1, e.to_string()))?
        .clone();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(EngineError::rejected(
            1,
            format!("missing required columns: {}", missing.join(", ")),
        ));
    }

    let mut transactions = Vec::new();
    for (idx, row) in rdr.deserialize::<RawRecord>().enumerate() {
        let line = idx + 2;
        let raw = row.map_err(|e| EngineError::rejected(line, e.to_string()))?;
        transactions.push(validate_record(raw, line)?);
    }
    Ok(transactions)
}

fn validate_record(raw: RawRecord, line: usize) -> Result<Transaction, EngineError> {
    if raw.transaction_id.is_empty()
        || raw.sender_id.is_empty()
        || raw.receiver_id.is_empty()
        || raw.amount.is_empty()
        || raw.timestamp.is_empty()
    {
        return Err(EngineError::rejected(line, "empty required field"));
    }

    let amount: f64 = raw
        .amount
        .parse()
        .map_err(|_| EngineError::rejected(line, format!("non-numeric amount '{}'", raw.amount)))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(EngineError::rejected(
            line,
            format!("amount must be a finite positive number, got '{}'", raw.amount),
        ));
    }

    let timestamp = NaiveDateTime::parse_from_str(&raw.timestamp, TIMESTAMP_FORMAT)
        .map_err(|_| {
            EngineError::rejected(line, format!("invalid timestamp '{}'", raw.timestamp))
        })?;

    Ok(Transaction {
        transaction_id: raw.transaction_id,
        sender_id: raw.sender_id,
        receiver_id: raw.receiver_id,
        amount,
        timestamp,
    })
}
