use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ShelfError;
use crate::normalize::{
    build_summary, fallback_id, first_image, positive_count, positive_number, split_shelves,
};
use crate::parse::RawItem;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Shelf {
    #[default]
    CurrentlyReading,
    Read,
    ToRead,
}

impl Shelf {
    pub const ALL: [Shelf; 3] = [Shelf::CurrentlyReading, Shelf::Read, Shelf::ToRead];

    /// Slug used by Goodreads in the `shelf` query parameter.
    pub fn slug(self) -> &'static str {
        match self {
            Shelf::CurrentlyReading => "currently-reading",
            Shelf::Read => "read",
            Shelf::ToRead => "to-read",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Shelf::CurrentlyReading => "Currently reading",
            Shelf::Read => "Recently finished",
            Shelf::ToRead => "On deck",
        }
    }
}

impl fmt::Display for Shelf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Shelf {
    type Err = ShelfError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Shelf::ALL
            .into_iter()
            .find(|shelf| shelf.slug() == value.trim())
            .ok_or_else(|| ShelfError::UnknownShelf(value.to_owned()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub author: String,
    pub image_url: String,
    pub link: String,
    pub user_rating: Option<f64>,
    pub average_rating: Option<f64>,
    pub pages: Option<u32>,
    pub shelves: Vec<String>,
    pub summary: String,
    pub date_read: String,
    pub date_added: String,
    pub published: String,
}

impl Book {
    pub fn from_raw_item(item: &RawItem) -> Self {
        let id = match item.first_of(&["guid", "book_id", "link"]) {
            "" => fallback_id(),
            found => found.to_owned(),
        };

        Self {
            id,
            title: item.get("title").to_owned(),
            author: item.get("author_name").to_owned(),
            image_url: first_image([
                item.get("book_large_image_url"),
                item.get("book_medium_image_url"),
                item.get("book_small_image_url"),
            ]),
            link: item.first_of(&["link", "book_url", "book_link"]).to_owned(),
            user_rating: positive_number(item.get("user_rating")),
            average_rating: positive_number(item.get("average_rating")),
            pages: positive_count(item.get("book_num_pages")),
            shelves: split_shelves(item.get("user_shelves")),
            summary: build_summary(item.get("book_description"), item.get("description")),
            date_read: item.get("user_read_at").to_owned(),
            date_added: item.get("user_date_added").to_owned(),
            published: item.get("book_published").to_owned(),
        }
    }

    /// Badge shown on the cover, derived from the shelves the book sits on.
    pub fn status(&self) -> &'static str {
        let on = |name: &str| self.shelves.iter().any(|s| s == name);
        if on("currently-reading") {
            "In progress"
        } else if on("read") {
            "Finished"
        } else if on("to-read") {
            "Queued"
        } else {
            "On shelf"
        }
    }

    pub fn display_rating(&self) -> Option<f64> {
        self.user_rating.or(self.average_rating)
    }

    pub fn summary_excerpt(&self, max_chars: usize) -> String {
        let mut chars = self.summary.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{head}…")
        } else {
            head
        }
    }
}

/// Body served by `GET /goodreads` and read back by the backend source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShelfPayload {
    pub shelf: Shelf,
    pub fetched_at: i64,
    #[serde(default)]
    pub books: Vec<Book>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorPayload {
    pub error: String,
    pub message: String,
}
