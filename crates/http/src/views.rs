//! Server-side template rendering.
//!
//! Templates are compiled into the binary and named after their file stem:
//! `render("genre_list", ...)` renders `templates/genre_list.html`.

use axum::response::Html;
use minijinja::Environment;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::error::AppError;

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/layout.html")),
    ("error.html", include_str!("../templates/error.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("genre_list.html", include_str!("../templates/genre_list.html")),
    ("genre_detail.html", include_str!("../templates/genre_detail.html")),
    ("genre_form.html", include_str!("../templates/genre_form.html")),
    ("genre_delete.html", include_str!("../templates/genre_delete.html")),
    ("author_list.html", include_str!("../templates/author_list.html")),
    ("author_detail.html", include_str!("../templates/author_detail.html")),
    ("author_form.html", include_str!("../templates/author_form.html")),
    ("author_delete.html", include_str!("../templates/author_delete.html")),
    ("book_list.html", include_str!("../templates/book_list.html")),
    ("book_detail.html", include_str!("../templates/book_detail.html")),
    ("book_form.html", include_str!("../templates/book_form.html")),
];

static ENV: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    for (name, source) in TEMPLATES {
        if let Err(err) = env.add_template(name, source) {
            tracing::error!(template = name, error = %err, "failed to compile template");
        }
    }
    env
});

/// Render a named template to a string. HTML in the context is escaped.
pub fn render_to_string<S: Serialize>(name: &str, context: S) -> Result<String, minijinja::Error> {
    ENV.get_template(&format!("{name}.html"))?.render(context)
}

/// Render a named template as an HTML response body.
pub fn render<S: Serialize>(name: &str, context: S) -> Result<Html<String>, AppError> {
    render_to_string(name, context).map(Html).map_err(|err| {
        AppError::Internal(
            anyhow::Error::new(err).context(format!("rendering template '{name}'")),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn every_template_compiles() {
        for (name, _) in TEMPLATES {
            assert!(ENV.get_template(name).is_ok(), "template {name} failed to compile");
        }
    }

    #[test]
    fn context_values_are_escaped() {
        let html = render_to_string(
            "genre_list",
            context! {
                title => "Genre List",
                genre_list => vec![context! { name => "<b>Noir</b>", url => "/catalog/genre/1" }],
            },
        )
        .unwrap();

        // autoescape also encodes `/`
        assert!(html.contains("&lt;b&gt;Noir&lt;&#x2f;b&gt;"));
        assert!(!html.contains("<b>Noir</b>"));
    }

    #[test]
    fn unknown_template_is_an_internal_error() {
        let err = render("missing", context! {}).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
