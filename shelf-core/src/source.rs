use chrono::Utc;
use futures_util::future::BoxFuture;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::book::{Book, ErrorPayload, Shelf};
use crate::config::{ShelfConfig, SourceConfig};
use crate::error::ShelfError;
use crate::feed::{page_size, FeedClient};
use crate::parse::parse_feed;

const BACKEND_FALLBACK_MESSAGE: &str = "Goodreads returned an unexpected response.";

/// Anything able to produce a shelf's books.
pub trait ShelfSource: Send + Sync {
    fn name(&self) -> &str;

    fn fetch(&self, shelf: Shelf, limit: usize) -> BoxFuture<'_, Result<Vec<Book>, ShelfError>>;
}

/// The managed backend serving already-normalized JSON on `/goodreads`.
#[derive(Debug, Clone)]
pub struct BackendSource {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct BackendBooks {
    #[serde(default)]
    books: Vec<Book>,
}

impl BackendSource {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn endpoint(&self, shelf: Shelf, limit: usize) -> Result<Url, ShelfError> {
        let base = format!("{}/goodreads", self.base_url.trim_end_matches('/'));
        let limit = limit.to_string();
        let url = Url::parse_with_params(&base, [("shelf", shelf.slug()), ("limit", limit.as_str())])?;
        Ok(url)
    }

    async fn fetch_books(&self, shelf: Shelf, limit: usize) -> Result<Vec<Book>, ShelfError> {
        let url = self.endpoint(shelf, limit)?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let message = response
                .json::<ErrorPayload>()
                .await
                .ok()
                .map(|payload| payload.message)
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| BACKEND_FALLBACK_MESSAGE.to_owned());
            return Err(ShelfError::Backend(message));
        }

        let payload: BackendBooks = response.json().await?;
        if payload.books.is_empty() {
            return Err(ShelfError::EmptyList);
        }
        Ok(payload.books)
    }
}

impl ShelfSource for BackendSource {
    fn name(&self) -> &str {
        "backend"
    }

    fn fetch(&self, shelf: Shelf, limit: usize) -> BoxFuture<'_, Result<Vec<Book>, ShelfError>> {
        Box::pin(self.fetch_books(shelf, limit))
    }
}

/// Alternative path to the raw upstream feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mirror {
    /// Local proxy that mirrors the upstream path under `base`.
    DevProxy { base: String },
    /// Generic relay taking the upstream URL as its `url` parameter.
    CorsRelay { endpoint: String },
    Direct,
}

impl Mirror {
    pub fn name(&self) -> &'static str {
        match self {
            Mirror::DevProxy { .. } => "dev-proxy",
            Mirror::CorsRelay { .. } => "cors-relay",
            Mirror::Direct => "direct",
        }
    }

    pub fn target(&self, feed: &FeedClient, shelf: Shelf, per_page: usize) -> Result<Url, ShelfError> {
        match self {
            Mirror::DevProxy { base } => {
                let path = feed.feed_path(shelf, per_page);
                Ok(Url::parse(&format!("{}{}", base.trim_end_matches('/'), path))?)
            }
            Mirror::CorsRelay { endpoint } => {
                let upstream = feed.feed_url(shelf, per_page);
                let timestamp = Utc::now().timestamp_millis().to_string();
                Ok(Url::parse_with_params(
                    endpoint,
                    [("url", upstream.as_str()), ("timestamp", timestamp.as_str())],
                )?)
            }
            Mirror::Direct => Ok(feed.feed_url(shelf, per_page)),
        }
    }

    /// Mirrors in the order they should be tried.
    pub fn ordered(config: &SourceConfig) -> Vec<Mirror> {
        let mut mirrors = Vec::new();
        if config.is_development {
            mirrors.push(Mirror::DevProxy {
                base: config.dev_proxy_base.clone(),
            });
        }
        if let Some(endpoint) = &config.cors_relay_url {
            mirrors.push(Mirror::CorsRelay {
                endpoint: endpoint.clone(),
            });
        }
        mirrors.push(Mirror::Direct);
        mirrors
    }
}

/// Fetches the RSS feed through a [`Mirror`] and parses it locally.
#[derive(Debug, Clone)]
pub struct MirrorSource {
    feed: FeedClient,
    mirror: Mirror,
}

impl MirrorSource {
    pub fn new(feed: FeedClient, mirror: Mirror) -> Self {
        Self { feed, mirror }
    }

    async fn fetch_books(&self, shelf: Shelf, limit: usize) -> Result<Vec<Book>, ShelfError> {
        let url = self.mirror.target(&self.feed, shelf, page_size(limit, None))?;
        let raw = self.feed.fetch_xml(url).await?;
        if raw.body.trim().is_empty() {
            return Err(ShelfError::EmptyFeed);
        }
        let books = parse_feed(&raw.body)?;
        debug!(mirror = self.mirror.name(), books = books.len(), "mirror answered");
        Ok(books)
    }
}

impl ShelfSource for MirrorSource {
    fn name(&self) -> &str {
        self.mirror.name()
    }

    fn fetch(&self, shelf: Shelf, limit: usize) -> BoxFuture<'_, Result<Vec<Book>, ShelfError>> {
        Box::pin(self.fetch_books(shelf, limit))
    }
}

/// Ordered candidate sources, built once at startup.
pub struct SourcePlan {
    pub primary: Option<Box<dyn ShelfSource>>,
    pub fallbacks: Vec<Box<dyn ShelfSource>>,
}

impl SourcePlan {
    pub fn new(primary: Option<Box<dyn ShelfSource>>, fallbacks: Vec<Box<dyn ShelfSource>>) -> Self {
        Self { primary, fallbacks }
    }

    pub fn from_config(config: &ShelfConfig, client: Client) -> Result<Self, ShelfError> {
        let feed = FeedClient::new(client.clone(), &config.goodreads)?;

        let primary = config
            .sources
            .backend_url
            .as_ref()
            .filter(|url| !url.trim().is_empty())
            .map(|url| Box::new(BackendSource::new(client, url.clone())) as Box<dyn ShelfSource>);

        let fallbacks = Mirror::ordered(&config.sources)
            .into_iter()
            .map(|mirror| Box::new(MirrorSource::new(feed.clone(), mirror)) as Box<dyn ShelfSource>)
            .collect();

        Ok(Self { primary, fallbacks })
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.primary
            .iter()
            .chain(self.fallbacks.iter())
            .map(|source| source.name())
            .collect()
    }
}
