use catalog_db::{Document, DocumentId, Record};
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::utils::form::sanitize;

pub const NAME_REQUIRED: &str = "Genre name required";

/// A book genre. Names are kept unique by checking before insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub name: String,
}

impl Document for Genre {
    const COLLECTION: &'static str = "genre";
}

pub fn genre_url(id: &DocumentId) -> String {
    format!("/catalog/genre/{id}")
}

#[derive(Debug, Clone, Serialize)]
pub struct GenreView {
    pub id: String,
    pub name: String,
    pub url: String,
}

impl From<&Record<Genre>> for GenreView {
    fn from(record: &Record<Genre>) -> Self {
        Self {
            id: record.id.to_string(),
            name: record.doc.name.clone(),
            url: genre_url(&record.id),
        }
    }
}

fn genre_name(value: &str, _: &()) -> garde::Result {
    let len = value.chars().count();
    if !(3..=100).contains(&len) {
        return Err(garde::Error::new(NAME_REQUIRED));
    }
    Ok(())
}

/// Submitted genre form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct GenreForm {
    #[serde(default)]
    #[garde(custom(genre_name))]
    pub name: String,
}

impl GenreForm {
    pub fn sanitized(self) -> Self {
        Self {
            name: sanitize(&self.name),
        }
    }

    pub fn into_genre(self) -> Genre {
        Genre { name: self.name }
    }
}
