mod app;
mod event;
mod gemini;
mod keystore;
mod panel;
mod prompt;
mod router;
mod theme;

use app::CasedeskApp;
use eframe::egui;
use gemini::GeminiClient;
use keystore::KeyStore;
use std::sync::mpsc;
use theme::Theme;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("casedesk=info")),
        )
        .init();

    let (tx, rx) = mpsc::channel();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("casedesk-runtime")
        .build()?;

    let gemini = GeminiClient::new(runtime.handle().clone(), tx)?;
    let keystore = KeyStore::open_default();
    let app = CasedeskApp::new(rx, gemini, keystore);
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([1024.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Casedesk",
        native_options,
        Box::new(move |creation_context| {
            Theme::default().apply_visuals(&creation_context.egui_ctx);
            egui_extras::install_image_loaders(&creation_context.egui_ctx);
            Ok(Box::new(app))
        }),
    )?;

    Ok(())
}
