mod app;

use std::sync::Arc;

use eframe::{egui, NativeOptions};
use shelf_core::{build_client, ShelfConfig, ShelfLoader, SourcePlan, WarnOnce};
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::app::{AppInit, ShelfApp};

const DEFAULT_LIMIT: usize = 12;

fn main() -> eframe::Result<()> {
    init_tracing();

    let config = ShelfConfig::load();
    let runtime = Arc::new(Runtime::new().expect("failed to initialise Tokio runtime"));
    let client = build_client(&config.sources).expect("failed to build HTTP client");
    let plan = SourcePlan::from_config(&config, client).expect("invalid Goodreads base URL");
    let loader = Arc::new(ShelfLoader::new(plan, WarnOnce::new()));
    info!(sources = ?loader.plan().source_names(), "shelf sources ready");

    let init = AppInit {
        runtime,
        loader,
        profile_url: config.goodreads.profile_url.clone(),
        limit: DEFAULT_LIMIT,
    };

    eframe::run_native(
        "Goodreads Shelf",
        NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([960.0, 520.0])
                .with_min_inner_size([600.0, 420.0]),
            ..Default::default()
        },
        Box::new(move |cc| {
            app::setup_dark_theme(&cc.egui_ctx);
            Box::new(ShelfApp::new(init))
        }),
    )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
