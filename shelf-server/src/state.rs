use std::sync::Arc;

use shelf_core::{build_client, FeedClient, ShelfConfig, ShelfError};

pub struct AppState {
    pub config: ShelfConfig,
    pub feed: FeedClient,
}

impl AppState {
    pub fn new(config: ShelfConfig) -> Result<Arc<Self>, ShelfError> {
        let client = build_client(&config.sources)?;
        let feed = FeedClient::new(client, &config.goodreads)?;
        Ok(Arc::new(Self { config, feed }))
    }
}
