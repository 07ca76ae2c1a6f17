//! The engine: one explicitly-owned store object holding every mutable
//! collection behind async locks, plus the append-only journals that make
//! them durable.
//!
//! All operations exposed to the API layer live here, so every critical
//! section (notably the check-then-append on the vote ledger) is guarded in
//! exactly one place rather than by ad hoc shared state.

mod journal;

pub use journal::{Journal, JournalRecord, StoreError};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use data_encoding::HEXLOWER;
use rocket::http::Status;
use rocket::tokio::sync::{Mutex, RwLock};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{Error, Rejection, Result};
use crate::model::audit::{AuditAction, AuditLog, AuditLogEntry};
use crate::model::biometric::{self, Fingerprint, Gallery, GalleryEvent, Metric};
use crate::model::identity::{IdDigest, Identifier};
use crate::model::ledger::{ReceiptId, Turnout, VoteLedger, VoteRecord};
use crate::model::lockout::{LockoutEvent, LockoutTable};
use crate::model::phase::ElectionPhase;
use crate::model::registry::{IdentityRegistry, VoterIdentity};
use crate::model::report::{Report, ReportLog, ReportSpec};
use crate::model::session::VerificationSession;
use crate::Config;

// Journal file names, one per durable store.
impl JournalRecord for VoteRecord {
    const NAME: &'static str = "votes";
}
impl JournalRecord for GalleryEvent {
    const NAME: &'static str = "gallery";
}
impl JournalRecord for LockoutEvent {
    const NAME: &'static str = "lockouts";
}
impl JournalRecord for AuditLogEntry {
    const NAME: &'static str = "audit";
}
impl JournalRecord for Report {
    const NAME: &'static str = "reports";
}

struct LedgerStore {
    ledger: VoteLedger,
    journal: Journal<VoteRecord>,
}

struct GalleryStore {
    gallery: Gallery,
    journal: Journal<GalleryEvent>,
}

struct LockoutStore {
    table: LockoutTable,
    journal: Journal<LockoutEvent>,
}

struct AuditStore {
    log: AuditLog,
    journal: Journal<AuditLogEntry>,
}

struct ReportStore {
    log: ReportLog,
    journal: Journal<Report>,
}

/// The result of a successful biometric admission.
#[derive(Debug, Clone, Serialize)]
pub struct Admission {
    pub identifier: Identifier,
    pub capture_id: u64,
    pub gallery_size: usize,
}

/// Aggregate integrity statistics.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub votes_cast: u64,
    pub eligible_voters: u64,
    pub turnout_percentage: f64,
    pub duplicate_id_blocked: u64,
    pub duplicate_biometric_blocked: u64,
}

/// The verification and duplicate-prevention engine.
///
/// Loaded once at ignition and placed in managed state; every handler goes
/// through its methods. The registry is immutable; each mutable store sits
/// behind its own lock and is journaled before the in-memory commit, so a
/// write that reaches memory has already reached disk.
pub struct Engine {
    registry: IdentityRegistry,
    metric: Metric,
    threshold: f64,
    fingerprint_dim: usize,
    lockout_ttl: chrono::Duration,
    hmac_key: Vec<u8>,
    eligible_override: Option<u64>,

    ledger: Mutex<LedgerStore>,
    gallery: Mutex<GalleryStore>,
    lockouts: Mutex<LockoutStore>,
    audit: Mutex<AuditStore>,
    reports: Mutex<ReportStore>,
    sessions: Mutex<HashMap<Identifier, VerificationSession>>,
    phase: RwLock<ElectionPhase>,

    duplicate_id_blocked: AtomicU64,
    duplicate_biometric_blocked: AtomicU64,
}

impl Engine {
    /// Load the registry dataset and replay every journal under the data
    /// directory. Corruption of any append-only store (e.g. duplicate
    /// identifiers in the votes journal) fails the load and must abort
    /// ignition.
    pub fn load(config: &Config) -> std::result::Result<Self, StoreError> {
        let registry = IdentityRegistry::from_file(config.registry_path())?;
        let dir = config.data_dir();

        let (votes_journal, votes) = Journal::<VoteRecord>::open(dir)?;
        let mut ledger = VoteLedger::new();
        for record in votes {
            ledger.replay(record)?;
        }

        let (gallery_journal, events) = Journal::<GalleryEvent>::open(dir)?;
        let mut gallery = Gallery::new();
        for event in events {
            gallery.apply(event);
        }

        let (lockout_journal, lockout_events) = Journal::<LockoutEvent>::open(dir)?;
        let mut lockouts = LockoutTable::new();
        for event in lockout_events {
            lockouts.restore(event);
        }
        lockouts.purge_expired(Utc::now());

        let (audit_journal, audit_entries) = Journal::<AuditLogEntry>::open(dir)?;
        let mut audit = AuditLog::new();
        for entry in audit_entries {
            audit.replay(entry);
        }

        let (report_journal, reports) = Journal::<Report>::open(dir)?;
        let mut report_log = ReportLog::new();
        for report in reports {
            report_log.replay(report);
        }

        info!(
            "Stores loaded: {} eligible voters, {} votes, {} gallery captures, {} active lockouts",
            registry.len(),
            ledger.votes_cast(),
            gallery.len(),
            lockouts.len(),
        );

        Ok(Self {
            registry,
            metric: config.dedup_metric(),
            threshold: config.dedup_threshold(),
            fingerprint_dim: config.fingerprint_dim(),
            lockout_ttl: config.lockout_ttl(),
            hmac_key: config.hmac_secret().to_vec(),
            eligible_override: config.eligible_voters(),
            ledger: Mutex::new(LedgerStore {
                ledger,
                journal: votes_journal,
            }),
            gallery: Mutex::new(GalleryStore {
                gallery,
                journal: gallery_journal,
            }),
            lockouts: Mutex::new(LockoutStore {
                table: lockouts,
                journal: lockout_journal,
            }),
            audit: Mutex::new(AuditStore {
                log: audit,
                journal: audit_journal,
            }),
            reports: Mutex::new(ReportStore {
                log: report_log,
                journal: report_journal,
            }),
            sessions: Mutex::new(HashMap::new()),
            phase: RwLock::new(ElectionPhase::default()),
            duplicate_id_blocked: AtomicU64::new(0),
            duplicate_biometric_blocked: AtomicU64::new(0),
        })
    }

    /// Number of eligible voters for turnout purposes: the configured
    /// override when present, otherwise the registry size.
    pub fn eligible_voters(&self) -> u64 {
        self.eligible_override
            .unwrap_or(self.registry.len() as u64)
    }

    /// Identity check: the first transition of a verification session.
    ///
    /// Checked in order: not found, already voted, locked out. On success a
    /// session is opened (replacing any stale one for this identifier).
    /// Verification is deliberately not phase-gated, so voters can be
    /// screened ahead of the voting window.
    pub async fn verify_identity(&self, identifier: &Identifier) -> Result<VoterIdentity> {
        let identity = match self.registry.lookup(identifier) {
            Some(identity) => identity.clone(),
            None => return Err(Rejection::NotFound.into()),
        };

        if self.ledger.lock().await.ledger.has_voted(identifier) {
            self.duplicate_id_blocked.fetch_add(1, Ordering::Relaxed);
            self.audit(
                AuditAction::DuplicateIdBlocked,
                format!("Repeat vote attempt blocked for {identifier}"),
                &identity.constituency,
            )
            .await;
            return Err(Rejection::AlreadyVoted.into());
        }

        {
            let mut lockouts = self.lockouts.lock().await;
            let now = Utc::now();
            if lockouts.table.is_blocked_at(identifier, now) {
                let remaining_seconds = lockouts.table.remaining_at(identifier, now);
                return Err(Rejection::Blocked { remaining_seconds }.into());
            }
        }

        self.sessions
            .lock()
            .await
            .insert(identifier.clone(), VerificationSession::new(identity.clone()));
        Ok(identity)
    }

    /// Fingerprint the captured sample and scan the gallery for duplicates.
    ///
    /// The session is consumed up front: whatever the outcome, failure
    /// states are final for a session and a rejected voter must start over.
    /// A duplicate match locks the identifier out and is audited; an
    /// admission appends the fingerprint to the gallery exactly once.
    pub async fn capture_and_dedup(
        &self,
        identifier: &Identifier,
        sample: &[u8],
    ) -> Result<Admission> {
        let session = self
            .sessions
            .lock()
            .await
            .remove(identifier)
            .ok_or_else(|| {
                Error::Status(
                    Status::UnprocessableEntity,
                    format!("no verified session for {identifier}"),
                )
            })?;
        let constituency = session.identity.constituency.clone();

        let vector = biometric::extract(sample, self.fingerprint_dim)?;

        let now = Utc::now();
        let mut gallery = self.gallery.lock().await;
        let hit = gallery
            .gallery
            .find_match(&vector, self.metric, self.threshold)
            .map(|entry| entry.capture_id);

        if let Some(capture_id) = hit {
            drop(gallery);
            let remaining_seconds = {
                let mut lockouts = self.lockouts.lock().await;
                let unblock_at =
                    lockouts
                        .table
                        .block_at(identifier.clone(), self.lockout_ttl, now);
                if let Err(err) = lockouts.journal.append(&LockoutEvent {
                    identifier: identifier.clone(),
                    unblock_at,
                }) {
                    error!("failed to journal lockout for {identifier}: {err}");
                }
                lockouts.table.remaining_at(identifier, now)
            };
            self.duplicate_biometric_blocked
                .fetch_add(1, Ordering::Relaxed);
            self.audit(
                AuditAction::DuplicateBiometricBlocked,
                format!(
                    "Biometric sample for {identifier} matches gallery capture {capture_id}"
                ),
                &constituency,
            )
            .await;
            return Err(Rejection::DuplicateBiometric { remaining_seconds }.into());
        }

        // Admission: journal first, then commit to the in-memory gallery.
        let capture_id = gallery.gallery.next_capture_id();
        let fingerprint = Fingerprint {
            capture_id,
            owner: IdDigest::new(identifier, &self.hmac_key),
            vector,
            captured_at: now,
            sample_digest: Some(HEXLOWER.encode(&Sha256::digest(sample))),
        };
        gallery
            .journal
            .append(&GalleryEvent::Captured(fingerprint.clone()))?;
        gallery.gallery.insert(fingerprint);
        let gallery_size = gallery.gallery.len();
        drop(gallery);

        self.audit(
            AuditAction::VoterVerified,
            format!("Voter {identifier} admitted; biometric capture {capture_id} stored"),
            &constituency,
        )
        .await;

        Ok(Admission {
            identifier: identifier.clone(),
            capture_id,
            gallery_size,
        })
    }

    /// Discard an in-flight session. No side effects beyond the in-memory
    /// session itself; returns whether one existed.
    pub async fn abandon_session(&self, identifier: &Identifier) -> bool {
        match self.sessions.lock().await.remove(identifier) {
            Some(session) => {
                debug!(
                    "session for {identifier} abandoned after {}s",
                    (Utc::now() - session.started_at).num_seconds()
                );
                true
            }
            None => false,
        }
    }

    /// Cast a vote: the check-then-append runs under the ledger lock as one
    /// indivisible unit, so of N concurrent calls for the same identifier
    /// exactly one succeeds and the rest observe `AlreadyVoted`.
    pub async fn cast_vote(
        &self,
        identifier: &Identifier,
        candidate_id: &str,
        constituency: &str,
    ) -> Result<VoteRecord> {
        let phase = *self.phase.read().await;
        if phase != ElectionPhase::Voting {
            return Err(Rejection::PhaseNotOpen { phase }.into());
        }

        let record = {
            let mut store = self.ledger.lock().await;
            if store.ledger.has_voted(identifier) {
                return Err(Rejection::AlreadyVoted.into());
            }
            let now = Utc::now();
            let record = VoteRecord {
                receipt: ReceiptId::generate(now),
                identifier: identifier.clone(),
                candidate_id: candidate_id.to_string(),
                constituency: constituency.to_string(),
                timestamp: now,
            };
            store.journal.append(&record)?;
            store
                .ledger
                .try_append(record)
                .expect("has_voted checked under the same lock")
                .clone()
        };

        self.audit(
            AuditAction::VoteCast,
            format!("Vote cast for candidate {candidate_id}"),
            constituency,
        )
        .await;
        Ok(record)
    }

    /// Whether the identifier already has a vote on the ledger.
    pub async fn has_voted(&self, identifier: &Identifier) -> bool {
        self.ledger.lock().await.ledger.has_voted(identifier)
    }

    /// Whether the identifier is currently locked out.
    pub async fn is_blocked(&self, identifier: &Identifier) -> bool {
        self.lockouts
            .lock()
            .await
            .table
            .is_blocked_at(identifier, Utc::now())
    }

    /// Remaining lockout in whole seconds (zero when not locked out).
    pub async fn lockout_remaining(&self, identifier: &Identifier) -> i64 {
        self.lockouts
            .lock()
            .await
            .table
            .remaining_at(identifier, Utc::now())
    }

    pub async fn turnout(&self) -> Turnout {
        let votes_cast = self.ledger.lock().await.ledger.votes_cast();
        Turnout::new(votes_cast, self.eligible_voters())
    }

    pub async fn stats(&self) -> Stats {
        let turnout = self.turnout().await;
        Stats {
            votes_cast: turnout.votes_cast,
            eligible_voters: turnout.eligible_voters,
            turnout_percentage: turnout.percentage,
            duplicate_id_blocked: self.duplicate_id_blocked.load(Ordering::Relaxed),
            duplicate_biometric_blocked: self
                .duplicate_biometric_blocked
                .load(Ordering::Relaxed),
        }
    }

    /// Audit log entries, most recent first.
    pub async fn audit_entries(&self) -> Vec<AuditLogEntry> {
        let audit = self.audit.lock().await;
        let mut entries = audit.log.entries().to_vec();
        entries.reverse();
        entries
    }

    pub async fn phase(&self) -> ElectionPhase {
        *self.phase.read().await
    }

    /// Set the election phase. Unguarded by design; always audited.
    pub async fn set_phase(&self, new_phase: ElectionPhase) -> ElectionPhase {
        {
            let mut phase = self.phase.write().await;
            *phase = new_phase;
        }
        self.audit(
            AuditAction::PhaseChange,
            format!("Election phase changed to {new_phase}"),
            "ALL",
        )
        .await;
        new_phase
    }

    /// Observer reports in submission order.
    pub async fn reports(&self) -> Vec<Report> {
        self.reports.lock().await.log.reports().to_vec()
    }

    /// Record an observer report.
    pub async fn submit_report(&self, spec: ReportSpec) -> Result<Report> {
        let report = {
            let mut store = self.reports.lock().await;
            let report = store.log.append(spec, Utc::now()).clone();
            store.journal.append(&report)?;
            report
        };
        self.audit(
            AuditAction::ReportSubmitted,
            format!("Observer report {} submitted", report.id),
            &report.constituency,
        )
        .await;
        Ok(report)
    }

    /// Administrative override: remove a capture from the gallery. Not part
    /// of the verification flow; always audited.
    pub async fn delete_capture(&self, capture_id: u64) -> Result<()> {
        {
            let mut store = self.gallery.lock().await;
            if store.gallery.remove(capture_id).is_none() {
                return Err(Error::not_found(format!("Gallery capture {capture_id}")));
            }
            store.journal.append(&GalleryEvent::Deleted { capture_id })?;
        }
        self.audit(
            AuditAction::CaptureDeleted,
            format!("Gallery capture {capture_id} deleted by administrative override"),
            "ALL",
        )
        .await;
        Ok(())
    }

    pub async fn gallery_size(&self) -> usize {
        self.gallery.lock().await.gallery.len()
    }

    /// Append an audit entry. Audit failures after a committed operation are
    /// logged, not propagated: the operation itself already succeeded.
    async fn audit(&self, action: AuditAction, detail: String, constituency: &str) {
        let mut store = self.audit.lock().await;
        let entry = store
            .log
            .append(action, detail, constituency.to_string(), Utc::now())
            .clone();
        if let Err(err) = store.journal.append(&entry) {
            error!("failed to journal audit entry {}: {err}", entry.id);
        }
    }
}
