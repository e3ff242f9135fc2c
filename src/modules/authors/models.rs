use catalog_db::{Document, DocumentId, Record};
use chrono::NaiveDate;
use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::utils::form::{required, sanitize};

const INPUT_DATE: &str = "%Y-%m-%d";
const DISPLAY_DATE: &str = "%b %-d, %Y";

/// A book author. Dates are optional calendar dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub first_name: String,
    pub family_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub date_of_death: Option<NaiveDate>,
}

impl Document for Author {
    const COLLECTION: &'static str = "author";
}

impl Author {
    pub fn name(&self) -> String {
        format!("{} {}", self.first_name, self.family_name)
    }

    /// `"Jan 5, 1920 - Mar 2, 1990"`, `"Jan 5, 1920"`, `" - Mar 2, 1990"` or `""`.
    pub fn lifespan(&self) -> String {
        let display = |date: &NaiveDate| date.format(DISPLAY_DATE).to_string();
        match (&self.date_of_birth, &self.date_of_death) {
            (Some(birth), Some(death)) => format!("{} - {}", display(birth), display(death)),
            (Some(birth), None) => display(birth),
            (None, Some(death)) => format!(" - {}", display(death)),
            (None, None) => String::new(),
        }
    }
}

pub fn author_url(id: &DocumentId) -> String {
    format!("/catalog/author/{id}")
}

fn input_date(date: Option<&NaiveDate>) -> String {
    date.map(|d| d.format(INPUT_DATE).to_string())
        .unwrap_or_default()
}

/// Author with its virtual fields computed for templates.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorView {
    pub id: String,
    pub first_name: String,
    pub family_name: String,
    pub name: String,
    pub lifespan: String,
    pub url: String,
    pub date_of_birth_input: String,
    pub date_of_death_input: String,
}

impl From<&Record<Author>> for AuthorView {
    fn from(record: &Record<Author>) -> Self {
        let author = &record.doc;
        Self {
            id: record.id.to_string(),
            first_name: author.first_name.clone(),
            family_name: author.family_name.clone(),
            name: author.name(),
            lifespan: author.lifespan(),
            url: author_url(&record.id),
            date_of_birth_input: input_date(author.date_of_birth.as_ref()),
            date_of_death_input: input_date(author.date_of_death.as_ref()),
        }
    }
}

fn name_rule(
    value: &str,
    missing: &'static str,
    too_long: &'static str,
    not_alphanumeric: &'static str,
) -> garde::Result {
    required(value, 100, missing, too_long)?;
    if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(garde::Error::new(not_alphanumeric));
    }
    Ok(())
}

fn first_name_rule(value: &str, _: &()) -> garde::Result {
    name_rule(
        value,
        "First name must be specified.",
        "First name must not exceed 100 characters.",
        "First name has non-alphanumeric characters.",
    )
}

fn family_name_rule(value: &str, _: &()) -> garde::Result {
    name_rule(
        value,
        "Family name must be specified.",
        "Family name must not exceed 100 characters.",
        "Family name has non-alphanumeric characters.",
    )
}

fn parse_input_date(value: &str) -> Result<Option<NaiveDate>, chrono::ParseError> {
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, INPUT_DATE).map(Some)
}

fn birth_rule(value: &str, _: &()) -> garde::Result {
    parse_input_date(value)
        .map(|_| ())
        .map_err(|_| garde::Error::new("Invalid date of birth"))
}

fn death_rule(value: &str, _: &()) -> garde::Result {
    parse_input_date(value)
        .map(|_| ())
        .map_err(|_| garde::Error::new("Invalid date of death"))
}

/// Submitted author form. Serializes with the `_input` names the form
/// template reads, so a rejected submission is echoed back as typed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AuthorForm {
    #[serde(default)]
    #[garde(custom(first_name_rule))]
    pub first_name: String,
    #[serde(default)]
    #[garde(custom(family_name_rule))]
    pub family_name: String,
    #[serde(default, rename(serialize = "date_of_birth_input"))]
    #[garde(custom(birth_rule))]
    pub date_of_birth: String,
    #[serde(default, rename(serialize = "date_of_death_input"))]
    #[garde(custom(death_rule))]
    pub date_of_death: String,
}

impl AuthorForm {
    pub fn sanitized(self) -> Self {
        Self {
            first_name: sanitize(&self.first_name),
            family_name: sanitize(&self.family_name),
            date_of_birth: sanitize(&self.date_of_birth),
            date_of_death: sanitize(&self.date_of_death),
        }
    }

    /// Convert a validated form. `None` if a date fails to parse.
    pub fn into_author(self) -> Option<Author> {
        Some(Author {
            date_of_birth: parse_input_date(&self.date_of_birth).ok()?,
            date_of_death: parse_input_date(&self.date_of_death).ok()?,
            first_name: self.first_name,
            family_name: self.family_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::form::field_errors;

    fn author(birth: Option<(i32, u32, u32)>, death: Option<(i32, u32, u32)>) -> Author {
        let date = |(y, m, d): (i32, u32, u32)| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        Author {
            first_name: "Ursula".to_string(),
            family_name: "LeGuin".to_string(),
            date_of_birth: birth.map(date),
            date_of_death: death.map(date),
        }
    }

    #[test]
    fn name_joins_first_and_family() {
        assert_eq!(author(None, None).name(), "Ursula LeGuin");
    }

    #[test]
    fn lifespan_covers_every_date_combination() {
        assert_eq!(
            author(Some((1929, 10, 21)), Some((2018, 1, 22))).lifespan(),
            "Oct 21, 1929 - Jan 22, 2018"
        );
        assert_eq!(author(Some((1929, 10, 21)), None).lifespan(), "Oct 21, 1929");
        assert_eq!(author(None, Some((2018, 1, 22))).lifespan(), " - Jan 22, 2018");
        assert_eq!(author(None, None).lifespan(), "");
    }

    #[test]
    fn view_exposes_url_and_input_dates() {
        let record = Record {
            id: DocumentId::generate(),
            doc: author(Some((1929, 10, 21)), None),
        };
        let view = AuthorView::from(&record);

        assert_eq!(view.url, format!("/catalog/author/{}", record.id));
        assert_eq!(view.date_of_birth_input, "1929-10-21");
        assert_eq!(view.date_of_death_input, "");
        assert_eq!(view.name, "Ursula LeGuin");
    }

    #[test]
    fn dates_round_trip_through_the_store_format() {
        let original = author(Some((1929, 10, 21)), Some((2018, 1, 22)));
        let json = serde_json::to_value(&original).unwrap();
        assert_eq!(json["date_of_birth"], "1929-10-21");

        let back: Author = serde_json::from_value(json).unwrap();
        assert_eq!(back, original);
    }

    fn form(first: &str, family: &str, birth: &str, death: &str) -> AuthorForm {
        AuthorForm {
            first_name: first.to_string(),
            family_name: family.to_string(),
            date_of_birth: birth.to_string(),
            date_of_death: death.to_string(),
        }
        .sanitized()
    }

    fn messages(form: &AuthorForm) -> Vec<String> {
        match form.validate() {
            Ok(()) => Vec::new(),
            Err(report) => field_errors(&report).into_iter().map(|e| e.msg).collect(),
        }
    }

    #[test]
    fn names_are_required_and_alphanumeric() {
        let msgs = messages(&form("  ", "", "", ""));
        assert!(msgs.contains(&"First name must be specified.".to_string()));
        assert!(msgs.contains(&"Family name must be specified.".to_string()));

        let msgs = messages(&form("Ursula K.", "Le Guin", "", ""));
        assert!(msgs.contains(&"First name has non-alphanumeric characters.".to_string()));
        assert!(msgs.contains(&"Family name has non-alphanumeric characters.".to_string()));
    }

    #[test]
    fn malformed_dates_are_reported() {
        let msgs = messages(&form("Ursula", "LeGuin", "1929-13-01", "yesterday"));
        assert_eq!(msgs.len(), 2);
        assert!(msgs.contains(&"Invalid date of birth".to_string()));
        assert!(msgs.contains(&"Invalid date of death".to_string()));
    }

    #[test]
    fn valid_form_converts_with_optional_dates() {
        let valid = form(" Ursula ", "LeGuin", "1929-10-21", "");
        assert!(valid.validate().is_ok());

        let author = valid.into_author().unwrap();
        assert_eq!(author.first_name, "Ursula");
        assert_eq!(author.date_of_birth, NaiveDate::from_ymd_opt(1929, 10, 21));
        assert_eq!(author.date_of_death, None);
    }

    #[test]
    fn form_echo_uses_input_field_names() {
        let json = serde_json::to_value(form("Ursula", "LeGuin", "1929-10-21", "")).unwrap();
        assert_eq!(json["date_of_birth_input"], "1929-10-21");
        assert_eq!(json["first_name"], "Ursula");
    }
}
