use std::sync::Arc;
use backend::{
    build_rocket, local_store,
    config::{Settings, StoreBackend},
    pg_store::PgVoteStore,
    routes::AppState,
    store::VoteStore,
};
use shuttle_runtime::CustomError;
use sqlx::PgPool;
use tracing::{info, warn};

#[shuttle_runtime::main]
async fn rocket(
    #[shuttle_shared_db::Postgres] pool: PgPool,
    #[shuttle_runtime::Secrets] secret_store: shuttle_runtime::SecretStore,
) -> shuttle_rocket::ShuttleRocket {
    info!("🚀 Starting product vote server");

    let settings = Settings::from_lookup(|key| secret_store.get(key)).map_err(CustomError::new)?;

    let store: Arc<dyn VoteStore> = match local_store(&settings) {
        Some(store) => {
            match &settings.store {
                StoreBackend::File(path) => warn!(
                    "Using JSON file store at {} - writers in other processes are not coordinated",
                    path.display()
                ),
                _ => warn!("Using in-memory vote store - votes are lost on restart"),
            }
            store
        }
        None => {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(CustomError::new)?;
            info!("📋 Migrations complete");
            Arc::new(PgVoteStore::new(pool))
        }
    };

    let state = AppState::new(store, &settings);
    Ok(build_rocket(state).into())
}
