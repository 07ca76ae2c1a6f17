#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

use rocket::fairing::AdHoc;
use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use config::Config;

use config::StoreFairing;
use logging::LoggerFairing;

/// Assemble the server on a default Rocket instance.
pub fn build() -> Rocket<Build> {
    assemble(rocket::build())
}

/// Mount the routes and attach the fairings onto the given Rocket instance,
/// which carries the figment the configuration is extracted from.
pub fn assemble(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket
        .mount("/", api::routes())
        .attach(AdHoc::config::<Config>())
        .attach(StoreFairing)
        .attach(LoggerFairing)
}

#[cfg(test)]
pub(crate) use test_harness::harness;
