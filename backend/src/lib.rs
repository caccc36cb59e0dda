pub mod routes;
pub mod store;
pub mod file_store;
pub mod pg_store;
pub mod config;
pub mod cors;
pub mod error;
pub mod rate_limiter;
pub mod catchers;
pub use shared::user_info;
pub use shared::{models::*, error::*, user_info::*};

use std::sync::Arc;
use rocket::{Build, Rocket, catchers, routes};
use crate::{
    catchers::{bad_request, internal_error, not_found, too_many_requests, unprocessable_entity},
    config::{Settings, StoreBackend},
    cors::CORS,
    file_store::JsonFileStore,
    routes::{
        all_options, results_wrong_method, status_wrong_method, submit_vote, submit_wrong_method,
        vote_status, voting_results, AppState,
    },
    store::{MemoryStore, VoteStore},
};

/// Store for the non-database backends; `None` means Postgres is wanted.
pub fn local_store(settings: &Settings) -> Option<Arc<dyn VoteStore>> {
    match &settings.store {
        StoreBackend::Postgres => None,
        StoreBackend::File(path) => Some(Arc::new(JsonFileStore::new(path.clone()))),
        StoreBackend::Memory => Some(Arc::new(MemoryStore::new())),
    }
}

pub fn build_rocket(state: AppState) -> Rocket<Build> {
    rocket::build()
        .attach(CORS)
        .manage(state)
        .mount(
            "/",
            routes![
                submit_vote,
                vote_status,
                voting_results,
                all_options,
                submit_wrong_method,
                status_wrong_method,
                results_wrong_method
            ],
        )
        .register(
            "/",
            catchers![
                bad_request,
                not_found,
                unprocessable_entity,
                too_many_requests,
                internal_error
            ],
        )
}
