// ABOUTME: Entry point for the screenshot destination menubar app
// ABOUTME: Sets up logging and configuration, loads favorites, then hands control to the tray loop

mod app;
mod config;
mod destination;
mod favorites;
mod menu;
mod platform;
mod screencapture;
mod tray;

use anyhow::Result;
use app::AppState;
use config::Config;
use destination::Destination;
use favorites::{Favorites, TomlFavoritesStorage};
use screencapture::{DefaultsBridge, ExternalSetting};

const DEBUG_ENV: &str = "SHOTDEST_DEBUG";

fn init_logging() {
    let level = if std::env::var_os(DEBUG_ENV).is_some() {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();
}

fn load_config() -> Config {
    let mut config = Config::default_config_path()
        .and_then(|path| Config::load_or_create(&path))
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {e:#}. Using defaults.");
            Config::default()
        });

    // Expand tilde paths
    if let Err(e) = config.expand_path() {
        tracing::warn!("Failed to expand config paths: {e:#}. Using defaults.");
        config = Config::default();
    }

    if let Err(e) = config.validate() {
        tracing::warn!("Invalid configuration: {e:#}. Using defaults.");
        config = Config::default();
    }

    config
}

fn main() -> Result<()> {
    init_logging();
    tracing::info!("Starting Screenshot Destination...");

    let config = load_config();

    let storage = TomlFavoritesStorage::new(config.state_path()?);
    tracing::info!("Favorites stored at: {}", storage.path().display());
    let favorites = Favorites::load(Box::new(storage), &config.default_destinations());

    let setting = ExternalSetting::new(
        Box::new(DefaultsBridge::new(config.screencapture.clone())),
        Destination::desktop(),
    );

    let app = AppState::new(favorites, setting);
    tray::run(app)
}
