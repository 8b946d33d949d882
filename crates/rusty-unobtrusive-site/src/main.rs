// File: src/main.rs
// Purpose: Serve the client validation test site

use anyhow::{Context, Result};
use rusty_unobtrusive_site::{app, SiteConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = SiteConfig::load_default().unwrap_or_else(|e| {
        eprintln!("Failed to load config: {}, using defaults", e);
        SiteConfig::default()
    });

    let addr = format!("{}:{}", config.server.host, config.port());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app()).await.context("Server error")?;
    Ok(())
}
