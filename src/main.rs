use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use salonbook::clock::SystemClock;
use salonbook::config::AppConfig;
use salonbook::db;
use salonbook::handlers;
use salonbook::services::notify::resend::ResendEmailNotifier;
use salonbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    if config.resend_api_key.is_empty() {
        tracing::warn!("RESEND_API_KEY not set, booking notifications will be logged and skipped");
    }
    let notifier = ResendEmailNotifier::new(
        config.resend_api_key.clone(),
        config.email_from.clone(),
    );

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        notifier: Box::new(notifier),
        clock: Box::new(SystemClock),
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
