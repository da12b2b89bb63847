use sea_orm::Database;
use tracing::info;

use citywatch_api::config::ApiConfig;
use citywatch_api::infra::mail::SmtpMailer;
use citywatch_api::infra::storage::LocalPhotoStorage;
use citywatch_api::router::build_router;
use citywatch_api::state::{AppState, CacheTtl};
use citywatch_api_migration::{Migrator, MigratorTrait};
use citywatch_core::tracing::init_tracing;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = ApiConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");
    Migrator::up(&db, None)
        .await
        .expect("failed to apply migrations");

    let redis_cfg = deadpool_redis::Config::from_url(&config.redis_url);
    let redis = redis_cfg
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .expect("failed to create Redis pool");

    let mailer = SmtpMailer::new(&config.mail, &config.public_base_url)
        .expect("invalid mail configuration");

    let state = AppState {
        db,
        redis,
        mailer,
        storage: LocalPhotoStorage::new(config.static_root.clone()),
        cache_ttl: CacheTtl {
            list: config.cache_list_ttl_secs,
            stats: config.cache_stats_ttl_secs,
        },
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.api_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("citywatch api listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .expect("server error");
}
