mod app;
mod color;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use app::SoilLensApp;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    // Optional dataset to open at startup: `soil-lens muestras.csv`
    let mut state = AppState::default();
    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        ui::panels::load_into(&mut state, &path);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([700.0, 450.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Soil Lens – Soil Sample Explorer",
        options,
        Box::new(|_cc| Ok(Box::new(SoilLensApp::new(state)))),
    )
}
