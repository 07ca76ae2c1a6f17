use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::identity::Identifier;

/// Default lockout duration imposed after a duplicate-biometric detection.
pub const DEFAULT_LOCKOUT_MS: i64 = 15_000;

/// One line of the lockout journal. Replay is last-write-wins per identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockoutEvent {
    pub identifier: Identifier,
    pub unblock_at: DateTime<Utc>,
}

/// Time-bounded suspension of identifiers, keyed by identifier.
///
/// Expiry is a pure TTL check evaluated on read, not a scheduled callback:
/// any read that observes `now >= unblock_at` treats the entry as absent and
/// evicts it. All operations take an explicit `now` so that expiry is exact
/// and testable without sleeping; callers pass `Utc::now()`.
#[derive(Debug, Default)]
pub struct LockoutTable {
    entries: HashMap<Identifier, DateTime<Utc>>,
}

impl LockoutTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the lockout for an identifier. A new block
    /// overwrites the previous unblock time; blocks do not stack.
    pub fn block_at(
        &mut self,
        identifier: Identifier,
        duration: Duration,
        now: DateTime<Utc>,
    ) -> DateTime<Utc> {
        let unblock_at = now + duration;
        self.entries.insert(identifier, unblock_at);
        unblock_at
    }

    /// Restore an entry during journal replay (last write wins).
    pub fn restore(&mut self, event: LockoutEvent) {
        self.entries.insert(event.identifier, event.unblock_at);
    }

    /// True iff an entry exists and `now < unblock_at`. Lazily evicts the
    /// entry when it has expired.
    pub fn is_blocked_at(&mut self, identifier: &Identifier, now: DateTime<Utc>) -> bool {
        match self.entries.get(identifier) {
            Some(&unblock_at) if now < unblock_at => true,
            Some(_) => {
                self.entries.remove(identifier);
                false
            }
            None => false,
        }
    }

    /// Remaining lockout in whole seconds, rounded up, clamped to zero.
    pub fn remaining_at(&self, identifier: &Identifier, now: DateTime<Utc>) -> i64 {
        match self.entries.get(identifier) {
            Some(&unblock_at) => {
                let ms = (unblock_at - now).num_milliseconds();
                ((ms + 999).div_euclid(1000)).max(0)
            }
            None => 0,
        }
    }

    /// Drop every entry that has already expired.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) {
        self.entries.retain(|_, &mut unblock_at| now < unblock_at);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
