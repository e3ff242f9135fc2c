//! Builders for the OpenAPI fragments modules contribute.

use serde_json::{json, Value};

fn id_parameter() -> Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string", "format": "uuid" }
    })
}

fn html_content(description: &str) -> Value {
    json!({
        "description": description,
        "content": { "text/html": { "schema": { "type": "string" } } }
    })
}

/// A GET operation that renders a page.
pub fn page(summary: &str, tag: &str, with_id: bool) -> Value {
    let mut op = json!({
        "summary": summary,
        "tags": [tag],
        "responses": {
            "200": html_content("Rendered page"),
            "404": html_content("Record not found")
        }
    });
    if with_id {
        op["parameters"] = json!([id_parameter()]);
    }
    op
}

/// A POST operation that takes a url-encoded form and redirects on success.
pub fn form_submit(summary: &str, tag: &str, with_id: bool) -> Value {
    let mut op = json!({
        "summary": summary,
        "tags": [tag],
        "requestBody": {
            "required": true,
            "content": {
                "application/x-www-form-urlencoded": { "schema": { "type": "object" } }
            }
        },
        "responses": {
            "200": html_content("Form re-rendered with validation errors"),
            "303": { "description": "Redirect to the affected record or list" },
            "404": html_content("Record not found")
        }
    });
    if with_id {
        op["parameters"] = json!([id_parameter()]);
    }
    op
}
