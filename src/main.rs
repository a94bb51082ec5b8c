mod analysis;
mod app;
mod color;
mod config;
mod controller;
mod data;
mod dispatch;
mod download;
mod error;
mod figures;
mod log_relay;
mod logging;
mod session;
mod state;
mod svg_export;
mod ui;
mod workspace;

use std::sync::Arc;

use anyhow::Context;
use app::DashboardApp;
use config::{AppConfig, Paths};
use eframe::egui;

fn main() -> anyhow::Result<()> {
    let paths = Paths::from_env();
    let config = AppConfig::load(&paths.root)?;

    let failures = workspace::bootstrap(&paths)?;
    logging::init(&paths.log_file)?;
    for failure in failures {
        log::error!("OSError: PathError: {failure}");
    }
    log::info!(
        "Starting DMD Dashboard v{} in {}",
        env!("CARGO_PKG_VERSION"),
        paths.root.display()
    );

    let library = Arc::new(analysis::dmd::NativeDmd::default());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_min_inner_size([900.0, 600.0])
            .with_maximized(true)
            .with_title("DMD Dashboard")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "DMD Dashboard",
        options,
        Box::new(move |cc| Ok(Box::new(DashboardApp::new(cc, config, &paths, library)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
    .context("running the dashboard window")
}
