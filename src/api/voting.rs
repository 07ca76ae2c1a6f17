use chrono::{DateTime, Utc};
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::identity::Identifier;
use crate::model::ledger::ReceiptId;
use crate::model::store::Engine;

pub fn routes() -> Vec<Route> {
    routes![cast_vote]
}

/// A vote as submitted by the polling station.
#[derive(Debug, Clone, Deserialize)]
pub struct VoteSpec {
    pub identifier: Identifier,
    pub candidate_id: String,
    pub constituency: String,
}

/// What the caster gets back: the receipt, never the ballot contents.
#[derive(Debug, Clone, Serialize)]
struct CastVoteResponse {
    receipt: ReceiptId,
    timestamp: DateTime<Utc>,
}

#[post("/votes", data = "<spec>", format = "json")]
async fn cast_vote(spec: Json<VoteSpec>, engine: &State<Engine>) -> Result<Json<CastVoteResponse>> {
    let spec = spec.into_inner();
    let record = engine
        .cast_vote(&spec.identifier, &spec.candidate_id, &spec.constituency)
        .await?;
    Ok(Json(CastVoteResponse {
        receipt: record.receipt,
        timestamp: record.timestamp,
    }))
}

#[cfg(test)]
mod tests {
    use rocket::http::{ContentType, Status};

    use crate::harness;

    const VOTE: &str = r#"{
        "identifier": "123456789012",
        "candidate_id": "INC",
        "constituency": "Delhi-Central"
    }"#;

    #[rocket::async_test]
    async fn cast_during_voting_phase_returns_a_receipt() {
        let harness = harness().await;
        harness.open_voting().await;

        let response = harness
            .client
            .post("/votes")
            .header(ContentType::JSON)
            .body(VOTE)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        assert!(body.contains("RCP-"));
    }

    #[rocket::async_test]
    async fn second_cast_for_the_same_identifier_conflicts() {
        let harness = harness().await;
        harness.open_voting().await;

        let first = harness
            .client
            .post("/votes")
            .header(ContentType::JSON)
            .body(VOTE)
            .dispatch()
            .await;
        assert_eq!(first.status(), Status::Ok);

        let second = harness
            .client
            .post("/votes")
            .header(ContentType::JSON)
            .body(VOTE)
            .dispatch()
            .await;
        assert_eq!(second.status(), Status::Conflict);
        let body = second.into_string().await.unwrap();
        assert!(body.contains("ALREADY_VOTED"));
    }

    #[rocket::async_test]
    async fn cast_outside_voting_phase_is_forbidden() {
        let harness = harness().await;

        let response = harness
            .client
            .post("/votes")
            .header(ContentType::JSON)
            .body(VOTE)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);
        let body = response.into_string().await.unwrap();
        assert!(body.contains("PHASE_NOT_OPEN"));
    }

    #[rocket::async_test]
    async fn invalid_identifier_in_body_is_rejected() {
        let harness = harness().await;
        harness.open_voting().await;

        let response = harness
            .client
            .post("/votes")
            .header(ContentType::JSON)
            .body(r#"{"identifier": "12AB", "candidate_id": "INC", "constituency": "X"}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);
    }
}
