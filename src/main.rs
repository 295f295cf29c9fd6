mod common;
mod config;
mod routes;

mod actor_types;
mod actors;
mod communities;
mod dashboard;
mod districts;
mod localities;
mod provinces;
mod reports;
mod spray_configurations;
mod spray_totals;
mod users;

use crate::config::Config;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

#[tokio::main]
async fn main() {
    // Set up tracing/logging
    tracing_subscriber::fmt::init();
    tracing::info!("Starting server...");

    // Load configuration and environment variables to pass to the application
    let config: Config = Config::from_env();

    let db: DatabaseConnection = Database::connect(
        config
            .db_url
            .as_ref()
            .expect("DB_URL or the DB_* parts must be set"),
    )
    .await
    .expect("Failed to connect to the database");

    if db.ping().await.is_ok() {
        tracing::info!("Connected to the database");
    } else {
        tracing::warn!("Could not connect to the database");
    }

    // Run migrations
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    tracing::info!("DB migrations complete");

    if let Err(e) = users::services::ensure_bootstrap_admin(&db, &config).await {
        tracing::error!("Could not create the bootstrap admin: {e}");
    }

    tracing::info!(
        "Starting server {} ({} deployment) ...",
        config.app_name,
        config.deployment.to_uppercase()
    );

    let addr: std::net::SocketAddr = "0.0.0.0:3000".parse().expect("Invalid listen address");
    tracing::info!("Listening on {addr}");

    let router = routes::build_router(&db, &config);

    axum::serve(
        tokio::net::TcpListener::bind(addr)
            .await
            .expect("Failed to bind the listen address"),
        router.into_make_service(),
    )
    .await
    .expect("Server error");
}
