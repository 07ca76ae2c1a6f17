use std::collections::HashSet;
use std::fmt::Display;

use chrono::{DateTime, Utc};
use rand::distributions::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::model::identity::Identifier;
use crate::model::store::StoreError;

const SUFFIX_LEN: usize = 6;
const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A vote receipt ID: `RCP-<unix millis>-<6 random alphanumerics>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptId(String);

impl ReceiptId {
    /// Generate a receipt ID for a vote cast at `now`.
    pub fn generate(now: DateTime<Utc>) -> Self {
        let dist = Uniform::from(0..SUFFIX_CHARSET.len());
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| SUFFIX_CHARSET[dist.sample(&mut rng)] as char)
            .collect();
        Self(format!("RCP-{}-{}", now.timestamp_millis(), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ReceiptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One cast vote. Append-only; the identifier is unique across all records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub receipt: ReceiptId,
    pub identifier: Identifier,
    pub candidate_id: String,
    pub constituency: String,
    pub timestamp: DateTime<Utc>,
}

/// The append-only ledger of cast votes, with its derived unique index on
/// identifier (the voted set).
///
/// An identifier enters the voted set exactly once, at the moment a record is
/// appended, and is never removed. The check-and-append is a single call so
/// that a caller holding the ledger lock gets an atomic critical section.
#[derive(Debug, Default)]
pub struct VoteLedger {
    records: Vec<VoteRecord>,
    voted: HashSet<Identifier>,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay one journal record at load time.
    ///
    /// A duplicate identifier here means the persisted ledger violates the
    /// uniqueness invariant; that is corruption and must halt startup rather
    /// than be silently repaired.
    pub fn replay(&mut self, record: VoteRecord) -> Result<(), StoreError> {
        if !self.voted.insert(record.identifier.clone()) {
            return Err(StoreError::Corrupt(format!(
                "votes journal contains more than one record for identifier {}",
                record.identifier
            )));
        }
        self.records.push(record);
        Ok(())
    }

    /// Whether the identifier has already cast a vote.
    pub fn has_voted(&self, identifier: &Identifier) -> bool {
        self.voted.contains(identifier)
    }

    /// Append a record iff its identifier has not voted yet. Returns the
    /// record back to the caller on rejection so nothing is lost.
    pub fn try_append(&mut self, record: VoteRecord) -> Result<&VoteRecord, VoteRecord> {
        if self.voted.contains(&record.identifier) {
            return Err(record);
        }
        self.voted.insert(record.identifier.clone());
        self.records.push(record);
        Ok(self.records.last().expect("just pushed"))
    }

    pub fn votes_cast(&self) -> u64 {
        self.records.len() as u64
    }

    pub fn records(&self) -> &[VoteRecord] {
        &self.records
    }
}

/// Turnout statistics derived from the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turnout {
    pub votes_cast: u64,
    pub eligible_voters: u64,
    pub percentage: f64,
}

impl Turnout {
    /// Compute turnout, with the percentage rounded to one decimal place.
    pub fn new(votes_cast: u64, eligible_voters: u64) -> Self {
        let percentage = if eligible_voters == 0 {
            0.0
        } else {
            let raw = votes_cast as f64 / eligible_voters as f64 * 100.0;
            (raw * 10.0).round() / 10.0
        };
        Self {
            votes_cast,
            eligible_voters,
            percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(identifier: &str) -> VoteRecord {
        let now = Utc::now();
        VoteRecord {
            receipt: ReceiptId::generate(now),
            identifier: identifier.parse().unwrap(),
            candidate_id: "INC".to_string(),
            constituency: "Delhi-Central".to_string(),
            timestamp: now,
        }
    }

    #[test]
    fn receipt_id_format() {
        let receipt = ReceiptId::generate(Utc::now());
        let parts: Vec<&str> = receipt.as_str().split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "RCP");
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn append_once_then_reject() {
        let mut ledger = VoteLedger::new();
        assert!(!ledger.has_voted(&"123456789012".parse().unwrap()));
        assert!(ledger.try_append(record("123456789012")).is_ok());
        assert!(ledger.has_voted(&"123456789012".parse().unwrap()));

        // Idempotent rejection: every further attempt fails.
        for _ in 0..3 {
            assert!(ledger.try_append(record("123456789012")).is_err());
        }
        assert_eq!(ledger.votes_cast(), 1);
        assert_eq!(ledger.records().len(), 1);
        assert_eq!(ledger.records()[0].candidate_id, "INC");
    }

    #[test]
    fn replay_rejects_duplicate_identifiers() {
        let mut ledger = VoteLedger::new();
        ledger.replay(record("123456789012")).unwrap();
        let err = ledger.replay(record("123456789012")).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[test]
    fn turnout_rounds_to_one_decimal() {
        let turnout = Turnout::new(87_501, 150_000);
        assert_eq!(turnout.percentage, 58.3);
        assert_eq!(turnout.votes_cast, 87_501);
        assert_eq!(turnout.eligible_voters, 150_000);
    }

    #[test]
    fn turnout_with_no_electorate() {
        assert_eq!(Turnout::new(0, 0).percentage, 0.0);
    }
}
