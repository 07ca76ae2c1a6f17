use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Route, State};

use crate::error::Result;
use crate::model::audit::AuditLogEntry;
use crate::model::phase::ElectionPhase;
use crate::model::report::{Report, ReportSpec};
use crate::model::store::Engine;

pub fn routes() -> Vec<Route> {
    routes![
        set_phase,
        get_audit_log,
        delete_capture,
        submit_report,
        get_reports,
    ]
}

/// Move the election to a new phase. Transitions are unrestricted so a
/// mis-click can be reversed; every change is audited.
#[put("/phase", data = "<phase>", format = "json")]
async fn set_phase(phase: Json<ElectionPhase>, engine: &State<Engine>) -> Json<ElectionPhase> {
    Json(engine.set_phase(phase.into_inner()).await)
}

/// The audit trail, most recent first.
#[get("/audit-log")]
async fn get_audit_log(engine: &State<Engine>) -> Json<Vec<AuditLogEntry>> {
    Json(engine.audit_entries().await)
}

/// Administrative override: remove a capture from the dedup gallery.
#[delete("/gallery/<capture_id>")]
async fn delete_capture(capture_id: u64, engine: &State<Engine>) -> Result<Status> {
    engine.delete_capture(capture_id).await?;
    Ok(Status::NoContent)
}

#[post("/reports", data = "<spec>", format = "json")]
async fn submit_report(spec: Json<ReportSpec>, engine: &State<Engine>) -> Result<Json<Report>> {
    let report = engine.submit_report(spec.into_inner()).await?;
    Ok(Json(report))
}

/// Observer reports in submission order.
#[get("/reports")]
async fn get_reports(engine: &State<Engine>) -> Json<Vec<Report>> {
    Json(engine.reports().await)
}
