use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::book::{Book, Shelf};
use crate::error::ShelfError;
use crate::loader::ShelfLoader;

/// Marks a pending request as stale. The request itself keeps running; its
/// result is dropped at commit time.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready(Vec<Book>),
    Error(String),
}

/// State of one shelf display. Only the most recently started request may
/// change it.
#[derive(Debug)]
pub struct ShelfView {
    shelf: Shelf,
    limit: usize,
    state: LoadState,
    pending: Option<CancelToken>,
}

impl ShelfView {
    pub fn new(shelf: Shelf, limit: usize) -> Self {
        Self {
            shelf,
            limit,
            state: LoadState::Idle,
            pending: None,
        }
    }

    pub fn shelf(&self) -> Shelf {
        self.shelf
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn books(&self) -> &[Book] {
        match &self.state {
            LoadState::Ready(books) => books,
            _ => &[],
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            LoadState::Error(message) => Some(message),
            _ => None,
        }
    }

    /// "Nothing here yet": loaded fine, no books. Never true in the error state.
    pub fn is_empty_state(&self) -> bool {
        matches!(&self.state, LoadState::Ready(books) if books.is_empty())
    }

    /// True when nothing was loaded yet or the inputs differ from the last load.
    pub fn needs_load(&self, shelf: Shelf, limit: usize) -> bool {
        self.state == LoadState::Idle || self.shelf != shelf || self.limit != limit
    }

    /// Starts a new load, invalidating whatever was in flight.
    pub fn begin(&mut self, shelf: Shelf, limit: usize) -> CancelToken {
        self.cancel();
        self.shelf = shelf;
        self.limit = limit;
        self.state = LoadState::Loading;
        let token = CancelToken::new();
        self.pending = Some(token.clone());
        token
    }

    /// Invalidates the in-flight request, if any. The state is left as is.
    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }

    /// Applies a finished load. Returns false when the result was stale.
    pub fn commit(&mut self, token: &CancelToken, result: Result<Vec<Book>, ShelfError>) -> bool {
        if token.is_cancelled() {
            debug!(shelf = %self.shelf, "discarding stale shelf response");
            return false;
        }
        self.pending = None;
        self.state = match result {
            Ok(mut books) => {
                books.truncate(self.limit);
                LoadState::Ready(books)
            }
            Err(err) => LoadState::Error(err.to_string()),
        };
        true
    }

    pub async fn refresh(&mut self, loader: &ShelfLoader, shelf: Shelf, limit: usize) -> &LoadState {
        let token = self.begin(shelf, limit);
        let result = loader.load(shelf, limit).await;
        self.commit(&token, result);
        &self.state
    }
}
