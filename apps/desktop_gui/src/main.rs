mod backend_bridge;
mod controller;
mod ui;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use backend_bridge::commands::BackendCommand;
use clap::Parser;
use client_core::{settings::DEFAULT_SETTINGS_FILE, ClientSettings};
use controller::events::UiEvent;
use crossbeam_channel::bounded;
use tracing_subscriber::EnvFilter;
use ui::{OrderBoardApp, PersistedGuiSettings, SETTINGS_STORAGE_KEY};

#[derive(Debug, Parser)]
#[command(name = "order-board-gui", about = "Order board window for the canteen store")]
struct Args {
    /// Settings file; falls back to ./order_board.toml, then the user config dir.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    base_url: Option<String>,
}

fn user_settings_file() -> Option<PathBuf> {
    let candidate = dirs::config_dir()?
        .join("order_board")
        .join(DEFAULT_SETTINGS_FILE);
    candidate.exists().then_some(candidate)
}

fn resolve_settings_file(explicit: Option<PathBuf>, local_exists: bool) -> Option<PathBuf> {
    if explicit.is_some() || local_exists {
        return explicit;
    }
    user_settings_file()
}

/// `RUST_LOG` when set and valid, `info` otherwise.
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(log_filter()).init();

    let args = Args::parse();
    let settings_file =
        resolve_settings_file(args.config, Path::new(DEFAULT_SETTINGS_FILE).exists());
    let mut settings =
        ClientSettings::load(settings_file.as_deref()).context("failed to load settings")?;
    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
        settings.validate()?;
    }
    tracing::info!(base_url = %settings.base_url, "starting order board window");

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(settings, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Order Board")
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Order Board",
        options,
        Box::new(|cc| {
            let persisted = cc.storage.and_then(|storage| {
                storage
                    .get_string(SETTINGS_STORAGE_KEY)
                    .and_then(|text| serde_json::from_str::<PersistedGuiSettings>(&text).ok())
            });
            Ok(Box::new(OrderBoardApp::new(cmd_tx, ui_rx, persisted)))
        }),
    )
    .map_err(|err| anyhow::anyhow!("order board window failed: {err}"))
}
