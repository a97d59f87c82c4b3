mod annotation;
mod app;
mod editor;
mod export;
mod hit;
mod layout;
mod render;
mod store;

use std::path::PathBuf;

use eframe::egui;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // optional: a directory of images to open right away
    let initial_dir = std::env::args().nth(1).map(PathBuf::from);
    if let Some(dir) = &initial_dir {
        if !dir.is_dir() {
            eprintln!("Not a directory: {}", dir.display());
            std::process::exit(1);
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("annotate-boxes"),
        ..Default::default()
    };

    eframe::run_native(
        "annotate-boxes",
        options,
        Box::new(move |_cc| Ok(Box::new(app::BoxesApp::new(initial_dir)))),
    )
    .expect("Failed to run eframe");
}
