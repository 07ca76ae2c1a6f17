use rocket::serde::json::Json;
use rocket::{Route, State};

use crate::model::ledger::Turnout;
use crate::model::phase::ElectionPhase;
use crate::model::store::{Engine, Stats};

pub fn routes() -> Vec<Route> {
    routes![get_turnout, get_stats, get_phase]
}

#[get("/turnout")]
async fn get_turnout(engine: &State<Engine>) -> Json<Turnout> {
    Json(engine.turnout().await)
}

#[get("/stats")]
async fn get_stats(engine: &State<Engine>) -> Json<Stats> {
    Json(engine.stats().await)
}

#[get("/phase")]
async fn get_phase(engine: &State<Engine>) -> Json<ElectionPhase> {
    Json(engine.phase().await)
}
