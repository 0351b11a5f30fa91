//! Field-level cleanup applied to raw feed values before they become a [`Book`].
//!
//! Every function here is pure and total: bad input degrades to an empty
//! string or `None`, never an error.
//!
//! [`Book`]: crate::book::Book

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;

static CDATA_MARKERS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<!\[CDATA\[|\]\]>").unwrap());
static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
// Goodreads embeds "author: ... review:" in the item description template.
static META_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)author:.*?review:").unwrap());

static FALLBACK_SEQ: AtomicU64 = AtomicU64::new(0);

/// Upgrades `http://` to `https://`, leaves everything else untouched.
pub fn ensure_https(value: &str) -> String {
    match value.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => value.to_owned(),
    }
}

pub fn strip_markup(value: &str) -> String {
    let without_cdata = CDATA_MARKERS.replace_all(value, "");
    let without_tags = TAGS.replace_all(&without_cdata, " ");
    WHITESPACE.replace_all(&without_tags, " ").trim().to_owned()
}

pub fn remove_meta_block(value: &str) -> String {
    META_BLOCK.replace_all(value, "").trim().to_owned()
}

/// Cleaned book description, or the cleaned item description when the
/// former ends up empty.
pub fn build_summary(book_description: &str, fallback_description: &str) -> String {
    let primary = remove_meta_block(&strip_markup(book_description));
    if !primary.is_empty() {
        return primary;
    }
    remove_meta_block(&strip_markup(fallback_description))
}

/// Parses a numeric field, keeping it only when finite and strictly positive.
/// Zero means "not provided" in this feed.
pub fn positive_number(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite() && *parsed > 0.0)
}

pub fn positive_count(value: &str) -> Option<u32> {
    positive_number(value)
        .filter(|parsed| parsed.fract() == 0.0 && *parsed <= f64::from(u32::MAX))
        .map(|parsed| parsed as u32)
}

pub fn split_shelves(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|shelf| !shelf.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// First candidate that is non-empty after https upgrade.
pub fn first_image<'a>(candidates: impl IntoIterator<Item = &'a str>) -> String {
    candidates
        .into_iter()
        .map(ensure_https)
        .find(|url| !url.is_empty())
        .unwrap_or_default()
}

/// Identifier for items that carry no guid, book id or link.
pub fn fallback_id() -> String {
    let seq = FALLBACK_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("goodreads-{}-{:x}", Utc::now().timestamp_millis(), seq)
}
