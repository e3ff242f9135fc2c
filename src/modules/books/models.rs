use catalog_db::{Document, DocumentId, Record};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::utils::form::{required, sanitize};

/// A catalogued book. References its author and genres by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub author: DocumentId,
    pub summary: String,
    pub isbn: String,
    #[serde(default)]
    pub genre: Vec<DocumentId>,
}

impl Document for Book {
    const COLLECTION: &'static str = "book";
}

pub fn book_url(id: &DocumentId) -> String {
    format!("/catalog/book/{id}")
}

/// Presentation projection of a book.
#[derive(Debug, Clone, Serialize)]
pub struct BookView {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub url: String,
    /// Filled in by pages that join the author.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
}

impl From<&Record<Book>> for BookView {
    fn from(record: &Record<Book>) -> Self {
        Self {
            id: record.id.to_string(),
            title: record.doc.title.clone(),
            summary: record.doc.summary.clone(),
            isbn: record.doc.isbn.clone(),
            url: book_url(&record.id),
            author_name: None,
        }
    }
}

fn title_rule(value: &str, _: &()) -> garde::Result {
    required(value, 200, "Title must not be empty.", "Title must not exceed 200 characters.")
}

fn author_rule(value: &str, _: &()) -> garde::Result {
    if value.is_empty() {
        return Err(garde::Error::new("Author must not be empty."));
    }
    if value.parse::<DocumentId>().is_err() {
        return Err(garde::Error::new("Author must be selected from the list."));
    }
    Ok(())
}

fn summary_rule(value: &str, _: &()) -> garde::Result {
    required(value, 2000, "Summary must not be empty.", "Summary must not exceed 2000 characters.")
}

fn isbn_rule(value: &str, _: &()) -> garde::Result {
    required(value, 20, "ISBN must not be empty.", "ISBN must not exceed 20 characters.")
}

/// Submitted book form. Built from raw pairs because `genre` repeats.
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct BookForm {
    #[garde(custom(title_rule))]
    pub title: String,
    #[garde(custom(author_rule))]
    pub author: String,
    #[garde(custom(summary_rule))]
    pub summary: String,
    #[garde(custom(isbn_rule))]
    pub isbn: String,
    #[garde(skip)]
    pub genre: Vec<String>,
}

impl BookForm {
    /// Collect url-encoded pairs, sanitizing every value.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self::default();
        for (key, value) in pairs {
            let value = sanitize(&value);
            match key.as_str() {
                "title" => form.title = value,
                "author" => form.author = value,
                "summary" => form.summary = value,
                "isbn" => form.isbn = value,
                "genre" if !value.is_empty() => form.genre.push(value),
                _ => {}
            }
        }
        form
    }

    /// Genre ids that parse; unknown strings are dropped.
    pub fn genre_ids(&self) -> Vec<DocumentId> {
        self.genre.iter().filter_map(|g| g.parse().ok()).collect()
    }

    /// Convert a validated form. `None` if the author id does not parse.
    pub fn into_book(self) -> Option<Book> {
        let genre = self.genre_ids();
        Some(Book {
            author: self.author.parse().ok()?,
            title: self.title,
            summary: self.summary,
            isbn: self.isbn,
            genre,
        })
    }
}
