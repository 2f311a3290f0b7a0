use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use common::database::{DatabaseConfig, health_check, init_pool};
use journal::media::{MediaConfig, MediaStore};
use journal::rate_limiter::{RateLimiter, RateLimiterConfig};
use journal::repositories::{TripRepository, UserRepository};
use journal::routes;
use journal::state::AppState;
use journal::token::{SessionConfig, SessionService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting journal service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    journal::MIGRATOR.run(&pool).await?;
    info!("Database migrations applied");

    // Session tokens and media storage
    let session_config = SessionConfig::from_env()?;
    let sessions = SessionService::new(&session_config);

    let media_config = MediaConfig::from_env()?;
    tokio::fs::create_dir_all(&media_config.root).await?;
    let media = MediaStore::new(&media_config);

    let users = UserRepository::new(pool.clone());
    let trips = TripRepository::new(pool.clone());
    let signin_limiter = RateLimiter::new(RateLimiterConfig::default());

    let app_state = AppState {
        db_pool: pool,
        sessions,
        media,
        users,
        trips,
        signin_limiter,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Journal service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
