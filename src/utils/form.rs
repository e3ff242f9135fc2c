//! Form sanitizing and validation error plumbing.

use serde::Serialize;

/// A single validation failure shown next to the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub param: String,
    pub msg: String,
}

impl FieldError {
    pub fn new(param: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            msg: msg.into(),
        }
    }
}

/// Flatten a garde report into the list the templates render.
pub fn field_errors(report: &garde::Report) -> Vec<FieldError> {
    report
        .iter()
        .map(|(path, error)| FieldError::new(path.to_string(), error.message()))
        .collect()
}

/// Trim surrounding whitespace and drop control characters.
///
/// HTML escaping is left to the template engine, which escapes on output.
pub fn sanitize(raw: &str) -> String {
    raw.trim().chars().filter(|c| !c.is_control()).collect()
}

/// Shared rule: non-empty after sanitizing and at most `max` characters.
pub fn required(
    value: &str,
    max: usize,
    missing: &'static str,
    too_long: &'static str,
) -> garde::Result {
    if value.is_empty() {
        return Err(garde::Error::new(missing));
    }
    if value.chars().count() > max {
        return Err(garde::Error::new(too_long));
    }
    Ok(())
}
