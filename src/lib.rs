#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod tally;

pub use config::Config;

/// Build the full server, ready to ignite and launch.
pub async fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(logging::LoggerFairing)
        .attach(config::ConfigFairing)
        .attach(config::DatabaseFairing)
}

/// Get a database client for tests, using the configured `db_uri`.
#[cfg(test)]
pub(crate) async fn db_client() -> mongodb::Client {
    let figment = rocket::Config::figment();
    let db_uri = figment
        .extract_inner::<String>("db_uri")
        .expect("`db_uri` not set");
    mongodb::Client::with_uri_str(&db_uri)
        .await
        .expect("Could not connect to database")
}

/// Get a random database name for tests, to avoid collisions.
#[cfg(test)]
pub(crate) fn database() -> String {
    let random: u32 = rand::random();
    format!("test{random}")
}

/// Build a server for tests against the given database, skipping the
/// database fairing so each test gets its own isolated database.
#[cfg(test)]
pub(crate) async fn rocket_for_db(db_client: mongodb::Client, db_name: &str) -> Rocket<Build> {
    use crate::model::mongodb::{ensure_election_id_counter_exists, ensure_indexes_exist, Coll};

    let db = db_client.database(db_name);
    ensure_indexes_exist(&db).await.unwrap();
    ensure_election_id_counter_exists(&Coll::from_db(&db))
        .await
        .unwrap();

    rocket::build()
        .mount("/", api::routes())
        .attach(config::ConfigFairing)
        .manage(db_client)
        .manage(db)
}
