use chrono::Utc;
use library_reservations::{
    adapters::postgres::{
        PostgresBookStore, PostgresLibCardStore, PostgresReaderStore, PostgresReservationStore,
        PostgresUnitOfWork,
    },
    application::reservation::{ServiceDependencies, detect_expired_reservations},
    config::AppConfig,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "library_reservations=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        max_connections = config.max_connections,
        policy = ?config.policy,
        "configuration loaded"
    );

    // Initialize database connection pool
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    // Initialize adapters
    let deps = ServiceDependencies {
        reservation_store: Arc::new(PostgresReservationStore::new(pool.clone())),
        book_store: Arc::new(PostgresBookStore::new(pool.clone())),
        reader_store: Arc::new(PostgresReaderStore::new(pool.clone())),
        lib_card_store: Arc::new(PostgresLibCardStore::new(pool.clone())),
        unit_of_work: Arc::new(PostgresUnitOfWork::new(pool.clone())),
        policy: config.policy,
    };

    let expired = detect_expired_reservations(&deps, Utc::now()).await?;
    tracing::info!(expired, "expired reservations marked");

    pool.close().await;
    Ok(())
}
