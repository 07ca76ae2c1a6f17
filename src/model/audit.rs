use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kinds of security-relevant decisions the engine records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    VoteCast,
    VoterVerified,
    DuplicateIdBlocked,
    DuplicateBiometricBlocked,
    PhaseChange,
    ReportSubmitted,
    CaptureDeleted,
}

/// One audit log entry. Strictly append-only, ordered by insertion;
/// most-recent-first display is a presentation concern for the API layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub detail: String,
    pub constituency: String,
}

/// The append-only audit log.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Vec<AuditLogEntry>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay one journal entry at load time.
    pub fn replay(&mut self, entry: AuditLogEntry) {
        self.entries.push(entry);
    }

    /// Append a new entry, assigning the next sequential ID.
    pub fn append(
        &mut self,
        action: AuditAction,
        detail: String,
        constituency: String,
        now: DateTime<Utc>,
    ) -> &AuditLogEntry {
        let id = self.entries.last().map(|e| e.id + 1).unwrap_or(1);
        self.entries.push(AuditLogEntry {
            id,
            timestamp: now,
            action,
            detail,
            constituency,
        });
        self.entries.last().expect("just pushed")
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[AuditLogEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_and_survive_replay() {
        let mut log = AuditLog::new();
        let now = Utc::now();
        let first = log
            .append(AuditAction::VoteCast, "x".into(), "Delhi-Central".into(), now)
            .id;
        assert_eq!(first, 1);

        let mut reloaded = AuditLog::new();
        for entry in log.entries() {
            reloaded.replay(entry.clone());
        }
        let next = reloaded
            .append(AuditAction::PhaseChange, "y".into(), "ALL".into(), now)
            .id;
        assert_eq!(next, 2);
    }

    #[test]
    fn action_serialises_screaming_snake() {
        let json = serde_json::to_string(&AuditAction::DuplicateBiometricBlocked).unwrap();
        assert_eq!(json, "\"DUPLICATE_BIOMETRIC_BLOCKED\"");
    }
}
