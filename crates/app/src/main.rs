//! Roundtable - shared room server
//!
//! Loads config and themes, then serves a single room over TCP until
//! Ctrl-C.

use std::path::Path;

use roundtable_core::{Room, ThemeCatalog};
use roundtable_net::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod config;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Starting Roundtable");

    let config = match config::Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let themes = load_themes(config.themes_path.as_deref());
    let room = Room::new(config.room.clone(), themes);

    let server = match Server::start(config.listen_addr(), room).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(addr = %config.listen_addr(), "Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(addr = %server.addr(), "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to wait for Ctrl-C: {}", e);
    }
    server.shutdown();
}

/// Load the theme catalog; the room still runs without one
fn load_themes(path: Option<&Path>) -> ThemeCatalog {
    let Some(path) = path else {
        tracing::warn!("No themes_path configured; games cannot be started");
        return ThemeCatalog::default();
    };

    match ThemeCatalog::load_from_path(path) {
        Ok(catalog) => {
            if catalog.is_empty() {
                tracing::warn!(path = %path.display(), "Theme file holds no themes");
            }
            catalog
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to load themes");
            ThemeCatalog::default()
        }
    }
}
