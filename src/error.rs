use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::response::Responder;
use rocket::serde::json::Json;
use serde::Serialize;
use thiserror::Error;

use crate::model::phase::ElectionPhase;
use crate::model::store::StoreError;

pub type Result<T> = std::result::Result<T, Error>;

/// The expected, recoverable outcomes of the verification and voting flows.
///
/// Every variant is a typed result returned to the caller, never a fatal
/// abort; each maps to a distinct user-visible message, and the lockout
/// variants carry the remaining countdown so the caller can retry only after
/// expiry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("identifier is not present in the voter registry")]
    NotFound,
    #[error("identifier has already cast a vote")]
    AlreadyVoted,
    #[error("identifier is temporarily locked out; retry in {remaining_seconds}s")]
    Blocked { remaining_seconds: i64 },
    #[error("biometric sample matches an already-admitted voter; locked out for {remaining_seconds}s")]
    DuplicateBiometric { remaining_seconds: i64 },
    #[error("votes may only be cast during the voting phase (current phase: {phase})")]
    PhaseNotOpen { phase: ElectionPhase },
    #[error("biometric sample is malformed: {0}")]
    MalformedSample(String),
}

impl Rejection {
    /// Stable machine-readable kind, for response bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::NotFound => "NOT_FOUND",
            Rejection::AlreadyVoted => "ALREADY_VOTED",
            Rejection::Blocked { .. } => "BLOCKED",
            Rejection::DuplicateBiometric { .. } => "DUPLICATE_BIOMETRIC",
            Rejection::PhaseNotOpen { .. } => "PHASE_NOT_OPEN",
            Rejection::MalformedSample(_) => "MALFORMED_SAMPLE",
        }
    }

    fn status(&self) -> Status {
        match self {
            Rejection::NotFound => Status::NotFound,
            Rejection::AlreadyVoted => Status::Conflict,
            Rejection::Blocked { .. } => Status::Locked,
            Rejection::DuplicateBiometric { .. } => Status::Conflict,
            Rejection::PhaseNotOpen { .. } => Status::Forbidden,
            Rejection::MalformedSample(_) => Status::UnprocessableEntity,
        }
    }

    fn remaining_seconds(&self) -> Option<i64> {
        match self {
            Rejection::Blocked { remaining_seconds }
            | Rejection::DuplicateBiometric { remaining_seconds } => Some(*remaining_seconds),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Rejection(#[from] Rejection),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::Status(Status::NotFound, format!("{what} not found"))
    }
}

/// JSON body for every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining_seconds: Option<i64>,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let (status, body) = match self {
            Error::Rejection(rejection) => {
                warn!("rejected: {rejection}");
                (
                    rejection.status(),
                    ErrorBody {
                        error: rejection.kind(),
                        message: rejection.to_string(),
                        remaining_seconds: rejection.remaining_seconds(),
                    },
                )
            }
            Error::Store(err) => {
                error!("store failure: {err}");
                (
                    Status::InternalServerError,
                    ErrorBody {
                        error: "STORE_FAILURE",
                        message: "internal storage failure".to_string(),
                        remaining_seconds: None,
                    },
                )
            }
            Error::Status(status, message) => {
                warn!("request failed ({status}): {message}");
                (
                    status,
                    ErrorBody {
                        error: "REQUEST_FAILED",
                        message,
                        remaining_seconds: None,
                    },
                )
            }
        };
        Custom(status, Json(body)).respond_to(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_kinds_are_distinct() {
        let rejections = [
            Rejection::NotFound,
            Rejection::AlreadyVoted,
            Rejection::Blocked {
                remaining_seconds: 15,
            },
            Rejection::DuplicateBiometric {
                remaining_seconds: 15,
            },
            Rejection::PhaseNotOpen {
                phase: ElectionPhase::Counting,
            },
            Rejection::MalformedSample("too short".to_string()),
        ];
        let mut kinds: Vec<&str> = rejections.iter().map(Rejection::kind).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), rejections.len());

        // Messages are specific, never a generic failure.
        let mut messages: Vec<String> = rejections.iter().map(|r| r.to_string()).collect();
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), rejections.len());
    }

    #[test]
    fn lockout_rejections_carry_the_countdown() {
        assert_eq!(
            Rejection::Blocked {
                remaining_seconds: 7
            }
            .remaining_seconds(),
            Some(7)
        );
        assert_eq!(
            Rejection::DuplicateBiometric {
                remaining_seconds: 15
            }
            .remaining_seconds(),
            Some(15)
        );
        assert_eq!(Rejection::NotFound.remaining_seconds(), None);
    }
}
