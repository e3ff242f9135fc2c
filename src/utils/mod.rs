//! Helpers shared by the feature modules.

pub mod form;
pub mod openapi;

use catalog_db::DocumentId;

/// Parse an id taken from a URL path. Malformed ids behave like unknown ones.
pub fn parse_id(raw: &str) -> Option<DocumentId> {
    raw.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_generated_ids_only() {
        let id = DocumentId::generate();
        assert_eq!(parse_id(&id.to_string()), Some(id));
        assert_eq!(parse_id("create"), None);
    }
}
