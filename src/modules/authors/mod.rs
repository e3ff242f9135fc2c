pub mod handlers;
pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::get, Router};
use catalog_db::{Query, Records};
use catalog_kernel::{AppState, InitCtx, Migration, Module};
use serde_json::json;

use crate::utils::openapi::{form_submit, page};
use models::Author;

/// Author pages, mirroring the genre set
pub struct AuthorsModule;

impl AuthorsModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for AuthorsModule {
    fn name(&self) -> &'static str {
        "authors"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let authors = Records::<Author>::new(ctx.store).count(&Query::new()).await?;
        tracing::info!(module = self.name(), authors, "authors module initialized");
        Ok(())
    }

    fn routes(&self) -> Router<AppState> {
        Router::new()
            .route("/authors", get(handlers::author_list))
            .route(
                "/author/create",
                get(handlers::author_create_get).post(handlers::author_create_post),
            )
            .route("/author/{id}", get(handlers::author_detail))
            .route(
                "/author/{id}/update",
                get(handlers::author_update_get).post(handlers::author_update_post),
            )
            .route(
                "/author/{id}/delete",
                get(handlers::author_delete_get).post(handlers::author_delete_post),
            )
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/authors": { "get": page("List authors", "Authors", false) },
                "/author/create": {
                    "get": page("Author create form", "Authors", false),
                    "post": form_submit("Create author", "Authors", false)
                },
                "/author/{id}": { "get": page("Author detail", "Authors", true) },
                "/author/{id}/update": {
                    "get": page("Author update form", "Authors", true),
                    "post": form_submit("Update author", "Authors", true)
                },
                "/author/{id}/delete": {
                    "get": page("Author delete confirmation", "Authors", true),
                    "post": form_submit("Delete author", "Authors", true)
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_author_name_index",
            up: r#"
                CREATE INDEX IF NOT EXISTS author_name
                    ON documents (
                        json_extract(body, '$."family_name"'),
                        json_extract(body, '$."first_name"')
                    )
                    WHERE collection = 'author';
                "#,
        }]
    }
}

/// Create a new instance of the authors module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(AuthorsModule::new())
}
