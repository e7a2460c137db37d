use chrono::NaiveDateTime;

use crate::ingest::{Transaction, TIMESTAMP_FORMAT};

pub(crate) fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).unwrap()
}

pub(crate) fn tx(id: &str, from: &str, to: &str, amount: f64, when: &str) -> Transaction {
    Transaction {
        transaction_id: id.to_string(),
        sender_id: from.to_string(),
        receiver_id: to.to_string(),
        amount,
        timestamp: ts(when),
    }
}
