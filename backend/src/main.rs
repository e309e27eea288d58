use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use travelmate_backend::bootstrap::{self, BootstrapOutcome};
use travelmate_backend::{build_router, AppState, Config, Database};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| config.logging.level.clone().into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting TravelMate API");

    if config.auth.uses_dev_secret() {
        tracing::warn!(
            "Using the built-in development JWT secret. Tokens can be forged by anyone; set JWT_SECRET before deploying."
        );
    }

    let db = Database::open(&config.database.url)?;
    let state = AppState::new(config.clone(), db)?;

    match bootstrap::ensure_default_admin(&state.db, &state.passwords, &config.bootstrap).await? {
        BootstrapOutcome::Created { user_id } => {
            tracing::info!(user_id, "Created default admin {}", config.bootstrap.admin_email);
        }
        BootstrapOutcome::AlreadyPresent => {
            tracing::debug!("Default admin already present");
        }
    }

    let app = build_router(Arc::new(state));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
