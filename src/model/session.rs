use chrono::{DateTime, Utc};

use crate::model::registry::VoterIdentity;

/// Ephemeral per-voter verification state.
///
/// A session exists only between a successful identity check and the
/// capture/dedup step:
///
/// ```text
/// submit identifier --> session opened
/// capture sample    --> session consumed (admitted or rejected)
/// ```
///
/// The absence of a session means no verification is in progress, and every
/// terminal outcome (admission, rejection, abandonment) destroys the session.
/// Failure states are final for a session: the voter must start over,
/// subject to any lockout just imposed. Never persisted.
#[derive(Debug, Clone)]
pub struct VerificationSession {
    pub identity: VoterIdentity,
    pub started_at: DateTime<Utc>,
}

impl VerificationSession {
    /// Open a session for a voter whose identity check just succeeded.
    pub fn new(identity: VoterIdentity) -> Self {
        Self {
            identity,
            started_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_the_resolved_identity() {
        let identity = VoterIdentity {
            identifier: "123456789012".parse().unwrap(),
            name: "Rahul Kumar".to_string(),
            dob: "1998-05-15".parse().unwrap(),
            constituency: "Delhi-Central".to_string(),
        };
        let session = VerificationSession::new(identity);
        assert_eq!(session.identity.name, "Rahul Kumar");
        assert!(session.started_at <= Utc::now());
    }
}
