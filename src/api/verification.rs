use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Route, State};

use crate::error::Result;
use crate::model::identity::Identifier;
use crate::model::registry::VoterIdentity;
use crate::model::store::{Admission, Engine};

pub fn routes() -> Vec<Route> {
    routes![verify_identity, capture_biometric, abandon_session]
}

/// Step one: check the identifier against the registry, the ledger, and the
/// lockout table. Success opens a verification session and echoes the
/// registry entry for the polling officer to confirm.
#[post("/voters/<identifier>/verify")]
async fn verify_identity(
    identifier: Identifier,
    engine: &State<Engine>,
) -> Result<Json<VoterIdentity>> {
    let identity = engine.verify_identity(&identifier).await?;
    Ok(Json(identity))
}

/// Step two: submit the raw biometric capture for fingerprinting and gallery
/// deduplication. The body is the sample bytes, not JSON.
#[post("/voters/<identifier>/biometric", data = "<sample>")]
async fn capture_biometric(
    identifier: Identifier,
    sample: Vec<u8>,
    engine: &State<Engine>,
) -> Result<Json<Admission>> {
    let admission = engine.capture_and_dedup(&identifier, &sample).await?;
    Ok(Json(admission))
}

/// Abandon an in-flight verification session.
#[delete("/voters/<identifier>/session")]
async fn abandon_session(identifier: Identifier, engine: &State<Engine>) -> Status {
    if engine.abandon_session(&identifier).await {
        Status::NoContent
    } else {
        Status::NotFound
    }
}

#[cfg(test)]
mod tests {
    use rocket::http::Status;

    use crate::harness;

    fn sample() -> Vec<u8> {
        (0..64).collect()
    }

    #[rocket::async_test]
    async fn verify_then_capture_admits_a_fresh_voter() {
        let harness = harness().await;

        let response = harness
            .client
            .post("/voters/123456789012/verify")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        assert!(body.contains("Rahul Kumar"));
        assert!(body.contains("Delhi-Central"));

        let response = harness
            .client
            .post("/voters/123456789012/biometric")
            .body(sample())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.unwrap();
        assert!(body.contains("\"capture_id\":1"));
    }

    #[rocket::async_test]
    async fn unknown_identifier_is_404() {
        let harness = harness().await;
        let response = harness
            .client
            .post("/voters/000000000000/verify")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
        let body = response.into_string().await.unwrap();
        assert!(body.contains("NOT_FOUND"));
    }

    #[rocket::async_test]
    async fn malformed_identifier_never_reaches_a_handler() {
        let harness = harness().await;
        let response = harness.client.post("/voters/12345/verify").dispatch().await;
        // FromParam rejection: no route matches.
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn duplicate_biometric_returns_conflict_with_countdown() {
        let harness = harness().await;

        harness
            .client
            .post("/voters/123456789012/verify")
            .dispatch()
            .await;
        harness
            .client
            .post("/voters/123456789012/biometric")
            .body(sample())
            .dispatch()
            .await;

        harness
            .client
            .post("/voters/234567890123/verify")
            .dispatch()
            .await;
        let response = harness
            .client
            .post("/voters/234567890123/biometric")
            .body(sample())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Conflict);
        let body = response.into_string().await.unwrap();
        assert!(body.contains("DUPLICATE_BIOMETRIC"));
        assert!(body.contains("remaining_seconds"));

        // The lockout now blocks a fresh verification attempt.
        let response = harness
            .client
            .post("/voters/234567890123/verify")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Locked);
    }

    #[rocket::async_test]
    async fn capture_without_a_session_is_unprocessable() {
        let harness = harness().await;
        let response = harness
            .client
            .post("/voters/123456789012/biometric")
            .body(sample())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);
    }

    #[rocket::async_test]
    async fn short_sample_is_unprocessable() {
        let harness = harness().await;
        harness
            .client
            .post("/voters/123456789012/verify")
            .dispatch()
            .await;
        let response = harness
            .client
            .post("/voters/123456789012/biometric")
            .body(vec![1, 2, 3])
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);
        let body = response.into_string().await.unwrap();
        assert!(body.contains("MALFORMED_SAMPLE"));
    }

    #[rocket::async_test]
    async fn session_can_be_abandoned_once() {
        let harness = harness().await;
        harness
            .client
            .post("/voters/123456789012/verify")
            .dispatch()
            .await;

        let response = harness
            .client
            .delete("/voters/123456789012/session")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NoContent);

        let response = harness
            .client
            .delete("/voters/123456789012/session")
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
    }
}
