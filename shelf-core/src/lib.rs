pub mod book;
pub mod config;
pub mod error;
pub mod feed;
pub mod loader;
pub mod normalize;
pub mod parse;
pub mod source;
pub mod view;

pub use book::{Book, ErrorPayload, Shelf, ShelfPayload};
pub use config::{GoodreadsConfig, ServerConfig, ShelfConfig, SourceConfig};
pub use error::ShelfError;
pub use feed::{build_client, page_size, FeedClient, RawFeed, FEED_ACCEPT};
pub use loader::{ShelfLoader, WarnOnce};
pub use parse::{parse_feed, parse_items, RawItem};
pub use source::{BackendSource, Mirror, MirrorSource, ShelfSource, SourcePlan};
pub use view::{CancelToken, LoadState, ShelfView};
