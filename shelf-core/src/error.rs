use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShelfError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Proxy responded with {0}")]
    UpstreamStatus(u16),
    #[error("Unable to parse Goodreads feed: {0}")]
    MalformedFeed(String),
    #[error("Proxy returned an empty feed")]
    EmptyFeed,
    #[error("Goodreads returned an empty list.")]
    EmptyList,
    #[error("{0}")]
    Backend(String),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("unknown shelf `{0}`")]
    UnknownShelf(String),
    #[error("Unable to reach Goodreads right now.")]
    NoSources,
}

impl From<quick_xml::Error> for ShelfError {
    fn from(err: quick_xml::Error) -> Self {
        ShelfError::MalformedFeed(err.to_string())
    }
}

impl ShelfError {
    /// True when the upstream itself answered with a non-2xx status.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ShelfError::UpstreamStatus(code) => Some(*code),
            _ => None,
        }
    }
}
