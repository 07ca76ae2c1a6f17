use rocket::Route;

mod admin;
mod public;
mod verification;
mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(verification::routes());
    routes.extend(voting::routes());
    routes.extend(public::routes());
    routes.extend(admin::routes());
    routes
}
