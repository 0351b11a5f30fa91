use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::book::Book;
use crate::error::ShelfError;

/// Text content of every element found inside one `<item>`, keyed by local
/// name. Only the first occurrence of a name is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawItem {
    fields: HashMap<String, String>,
}

impl RawItem {
    pub fn get(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or_default()
    }

    /// First non-empty value among `names`, in order.
    pub fn first_of(&self, names: &[&str]) -> &str {
        names
            .iter()
            .map(|name| self.get(name))
            .find(|value| !value.is_empty())
            .unwrap_or_default()
    }

    fn record(&mut self, name: String, text: &str) {
        self.fields
            .entry(name)
            .or_insert_with(|| text.trim().to_owned());
    }
}

struct OpenElement {
    name: String,
    text: String,
}

/// Parses an RSS document into its items. Fails on any malformed input
/// rather than returning the items read so far.
pub fn parse_items(xml: &str) -> Result<Vec<RawItem>, ShelfError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut item_depth: Option<usize> = None;
    let mut current = RawItem::default();
    let mut items = Vec::new();
    let mut saw_element = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                saw_element = true;
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if item_depth.is_none() && name == "item" {
                    item_depth = Some(stack.len());
                    current = RawItem::default();
                }
                stack.push(OpenElement {
                    name,
                    text: String::new(),
                });
            }
            Event::Empty(e) => {
                saw_element = true;
                if let Some(depth) = item_depth {
                    if stack.len() > depth {
                        let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                        current.record(name, "");
                    }
                }
            }
            Event::Text(e) => {
                let text = match e.unescape() {
                    Ok(text) => text.into_owned(),
                    Err(_) => String::from_utf8_lossy(&e).into_owned(),
                };
                append_text(&mut stack, item_depth, &text);
            }
            Event::CData(e) => {
                let bytes = e.into_inner();
                append_text(&mut stack, item_depth, &String::from_utf8_lossy(&bytes));
            }
            Event::End(_) => {
                let closed = stack
                    .pop()
                    .ok_or_else(|| ShelfError::MalformedFeed("unexpected closing tag".into()))?;
                match item_depth {
                    Some(depth) if stack.len() == depth => {
                        items.push(std::mem::take(&mut current));
                        item_depth = None;
                    }
                    Some(depth) if stack.len() > depth => current.record(closed.name, &closed.text),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ShelfError::MalformedFeed(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }
    if !saw_element {
        return Err(ShelfError::MalformedFeed("document has no root element".into()));
    }

    debug!(items = items.len(), "parsed feed items");
    Ok(items)
}

// Text belongs to every open element below the item, like DOM textContent.
fn append_text(stack: &mut [OpenElement], item_depth: Option<usize>, text: &str) {
    let Some(depth) = item_depth else {
        return;
    };
    for open in stack.iter_mut().skip(depth + 1) {
        open.text.push_str(text);
    }
}

/// Parses and normalizes a Goodreads shelf feed, dropping untitled items.
pub fn parse_feed(xml: &str) -> Result<Vec<Book>, ShelfError> {
    let books: Vec<Book> = parse_items(xml)?
        .iter()
        .map(Book::from_raw_item)
        .filter(|book| !book.title.is_empty())
        .collect();
    Ok(books)
}
