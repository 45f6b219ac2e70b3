#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod results;
pub mod state;
pub mod storage;

pub use config::Config;

use config::{ConfigFairing, StateFairing};
use logging::LoggerFairing;

/// Build the server from `Rocket.toml` and `ROCKET_*` environment variables.
pub fn build() -> Rocket<Build> {
    assemble(rocket::build(), StateFairing::default())
}

fn assemble(rocket: Rocket<Build>, state: StateFairing) -> Rocket<Build> {
    rocket
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(state)
        .attach(LoggerFairing)
}

/// A server backed by `store`, with training finishing immediately.
#[cfg(test)]
pub(crate) fn rocket_for_store(store: std::sync::Arc<storage::MemoryStore>) -> Rocket<Build> {
    log4rs_test_utils::test_logging::init_logging_once_for(["voto_backend"], None, None);

    let figment = rocket::Config::figment().merge(("training_ms", 0));
    assemble(rocket::custom(figment), StateFairing::with_store(store))
}
