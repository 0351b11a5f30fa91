use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::book::{Book, Shelf};
use crate::error::ShelfError;
use crate::source::SourcePlan;

/// Process-wide "say it once" flag. Clones share the same state, and
/// [`WarnOnce::reset`] re-arms it.
#[derive(Debug, Clone, Default)]
pub struct WarnOnce {
    fired: Arc<AtomicBool>,
}

impl WarnOnce {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time it is called after creation or reset.
    pub fn fire(&self) -> bool {
        !self.fired.swap(true, Ordering::SeqCst)
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.fired.store(false, Ordering::SeqCst);
    }
}

/// Resolves a shelf by walking the [`SourcePlan`]: primary first, then each
/// fallback, one attempt per source.
pub struct ShelfLoader {
    plan: SourcePlan,
    backend_warning: WarnOnce,
}

impl ShelfLoader {
    pub fn new(plan: SourcePlan, backend_warning: WarnOnce) -> Self {
        Self {
            plan,
            backend_warning,
        }
    }

    pub fn plan(&self) -> &SourcePlan {
        &self.plan
    }

    /// First non-empty list wins and is cut down to `limit`. A source that
    /// answers with no books does not stop the walk, but if nothing better
    /// turns up the result is an empty list. When every source fails the
    /// last error is returned.
    pub async fn load(&self, shelf: Shelf, limit: usize) -> Result<Vec<Book>, ShelfError> {
        if self.plan.primary.is_none() && self.backend_warning.fire() {
            warn!("no managed backend configured, reading Goodreads through mirrors");
        }

        let mut last_error = None;
        let mut answered_empty = false;

        for source in self.plan.primary.iter().chain(self.plan.fallbacks.iter()) {
            match source.fetch(shelf, limit).await {
                Ok(mut books) if !books.is_empty() => {
                    books.truncate(limit);
                    info!(source = source.name(), %shelf, books = books.len(), "shelf loaded");
                    return Ok(books);
                }
                Ok(_) => {
                    debug!(source = source.name(), %shelf, "source returned no books");
                    answered_empty = true;
                }
                Err(err) => {
                    warn!(source = source.name(), %shelf, error = %err, "shelf source failed");
                    last_error = Some(err);
                }
            }
        }

        if answered_empty {
            return Ok(Vec::new());
        }
        Err(last_error.unwrap_or(ShelfError::NoSources))
    }
}
