use reqwest::header::ACCEPT;
use reqwest::{Client, ClientBuilder, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::book::{Book, Shelf};
use crate::config::{GoodreadsConfig, SourceConfig};
use crate::error::ShelfError;
use crate::parse::parse_feed;

pub const FEED_ACCEPT: &str = "application/rss+xml, text/xml;q=0.9, */*;q=0.8";

const MIN_PAGE_SIZE: usize = 20;

/// Number of items to ask the feed for: twice what will be shown, at least
/// twenty, and no more than `ceiling` when one is given.
pub fn page_size(limit: usize, ceiling: Option<usize>) -> usize {
    let wanted = limit.saturating_mul(2).max(MIN_PAGE_SIZE);
    match ceiling {
        Some(ceiling) => wanted.min(ceiling),
        None => wanted,
    }
}

/// Builds an HTTP client with the configured request timeout.
pub fn build_client(config: &SourceConfig) -> Result<Client, ShelfError> {
    let client = ClientBuilder::new()
        .timeout(config.request_timeout())
        .user_agent(concat!("goodreads-shelf/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

#[derive(Debug, Clone)]
pub struct RawFeed {
    pub status: StatusCode,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    base_url: Url,
    user_id: String,
}

impl FeedClient {
    pub fn new(client: Client, config: &GoodreadsConfig) -> Result<Self, ShelfError> {
        Ok(Self {
            client,
            base_url: Url::parse(&config.base_url)?,
            user_id: config.user_id.clone(),
        })
    }

    /// Path plus query of the shelf feed, e.g. for a proxy mirroring the upstream.
    pub fn feed_path(&self, shelf: Shelf, per_page: usize) -> String {
        let url = self.feed_url(shelf, per_page);
        match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_owned(),
        }
    }

    pub fn feed_url(&self, shelf: Shelf, per_page: usize) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(&format!("/review/list_rss/{}", self.user_id));
        url.query_pairs_mut()
            .clear()
            .append_pair("per_page", &per_page.to_string())
            .append_pair("shelf", shelf.slug())
            .append_pair("order", "d");
        url
    }

    /// GETs `url` asking for RSS. Non-2xx answers become `UpstreamStatus`.
    pub async fn fetch_xml(&self, url: Url) -> Result<RawFeed, ShelfError> {
        debug!(%url, "requesting feed");
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, FEED_ACCEPT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "feed request rejected");
            return Err(ShelfError::UpstreamStatus(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(RawFeed { status, body })
    }

    /// Fetches and normalizes a shelf straight from the upstream feed.
    pub async fn fetch_shelf(
        &self,
        shelf: Shelf,
        limit: usize,
        ceiling: Option<usize>,
    ) -> Result<Vec<Book>, ShelfError> {
        let url = self.feed_url(shelf, page_size(limit, ceiling));
        let raw = self.fetch_xml(url).await?;
        parse_feed(&raw.body)
    }
}
