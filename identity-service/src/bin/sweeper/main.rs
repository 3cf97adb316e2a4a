use identity_service::config::Config;
use identity_service::domain::session::ports::RefreshTokenStore;
use identity_service::outbound::repositories::PostgresRefreshTokenStore;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Expired refresh-token cleanup.
///
/// Deletes records past their expiry horizon and exits. Idempotent; run it
/// from an external scheduler rather than an in-process timer.
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=info,token_sweeper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        job = "token-sweeper",
        version = env!("CARGO_PKG_VERSION"),
        "Sweep starting"
    );

    let config = Config::load()?;

    let pg_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database.url)
        .await?;
    tracing::info!(database = "postgresql", "Database connection pool created");

    let refresh_tokens = PostgresRefreshTokenStore::new(pg_pool);
    let deleted = refresh_tokens.delete_expired().await?;

    tracing::info!(deleted, "Expired refresh tokens removed");

    Ok(())
}
