use std::path::PathBuf;

use shelf_core::ShelfConfig;
use tracing::error;

#[tokio::main]
async fn main() {
    shelf_server::init_tracing();

    let config = match std::env::var_os("SHELF_CONFIG").map(PathBuf::from) {
        Some(path) => ShelfConfig::load_from(&path).unwrap_or_else(|e| {
            error!(error = %e, path = %path.display(), "invalid SHELF_CONFIG, using defaults");
            ShelfConfig::default()
        }),
        None => ShelfConfig::load(),
    };

    if let Err(e) = shelf_server::start_server(config).await {
        error!(error = %e, "server stopped with an error");
        std::process::exit(1);
    }
}
