use std::net::SocketAddr;

use careerdoc_auth::middleware::{
    AuthState, MemoryResumeStore, MemorySessionStore, WebAuthConfig, auth_routes, resume_routes,
};
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();

    // --- Tracing ---
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("careerdoc_auth=debug,careerdoc_web=debug,info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .try_init()?;

    // --- Config from environment ---
    let config = WebAuthConfig::from_env()?;
    let addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
        .parse()?;

    let auth = AuthState::new(config, MemorySessionStore::new());
    let app = axum::Router::new()
        .merge(auth_routes(auth.clone()))
        .merge(resume_routes(auth, MemoryResumeStore::new()));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to install CTRL+C handler");
            }
            tracing::info!("Received CTRL+C, shutting down");
        })
        .await?;

    Ok(())
}
