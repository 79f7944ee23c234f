use anyhow::Context;
use std::sync::Arc;
use tapround::{
    clock::SystemClock,
    config::AppConfig,
    round::{InMemoryRoundRepository, PostgresRoundRepository, RoundRepository},
    routes::build_router,
    score::{InMemoryScoreRepository, PostgresScoreRepository, ScoreRepository},
    shared::AppState,
    user::{InMemoryUserDirectory, PostgresUserDirectory, UserDirectory},
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tapround=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tap round server");

    let config = AppConfig::from_env();

    let (rounds, scores, users): (
        Arc<dyn RoundRepository>,
        Arc<dyn ScoreRepository>,
        Arc<dyn UserDirectory>,
    ) = match &config.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url)
                .await
                .context("connecting to postgres")?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("running migrations")?;
            info!("Using PostgreSQL storage");
            (
                Arc::new(PostgresRoundRepository::new(pool.clone())),
                Arc::new(PostgresScoreRepository::new(pool.clone())),
                Arc::new(PostgresUserDirectory::new(pool)),
            )
        }
        None => {
            info!("DATABASE_URL not set, using in-memory storage");
            (
                Arc::new(InMemoryRoundRepository::new()),
                Arc::new(InMemoryScoreRepository::new()),
                Arc::new(InMemoryUserDirectory::new()),
            )
        }
    };

    let app_state = AppState::new(rounds, scores, users, Arc::new(SystemClock), &config);
    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr.as_str())
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "Server listening");
    axum::serve(listener, app).await.context("serving axum")?;

    Ok(())
}
