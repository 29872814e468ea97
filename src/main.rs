mod app;

use clap::Parser;
use eframe::egui;
use hotspot_edit::Args;

use crate::app::HotspotApp;

// ── Main ────────────────────────────────────────────────────────────────────

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let title = match &args.image {
        Some(path) => format!(
            "hotspot-edit — {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        ),
        None => "hotspot-edit".to_owned(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(HotspotApp::new(&args)?))),
    )
    .expect("Failed to run eframe");
}
