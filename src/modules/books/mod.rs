pub mod handlers;
pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::get, Router};
use catalog_db::{Query, Records};
use catalog_kernel::{AppState, InitCtx, Migration, Module};
use serde_json::json;

use crate::utils::openapi::{form_submit, page};
use models::Book;

/// Book pages: list, detail and the create form
pub struct BooksModule;

impl BooksModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let books = Records::<Book>::new(ctx.store).count(&Query::new()).await?;
        tracing::info!(module = self.name(), books, "books module initialized");
        Ok(())
    }

    fn routes(&self) -> Router<AppState> {
        Router::new()
            .route("/books", get(handlers::book_list))
            .route(
                "/book/create",
                get(handlers::book_create_get).post(handlers::book_create_post),
            )
            .route("/book/{id}", get(handlers::book_detail))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/books": { "get": page("List books", "Books", false) },
                "/book/create": {
                    "get": page("Book create form", "Books", false),
                    "post": form_submit("Create book", "Books", false)
                },
                "/book/{id}": { "get": page("Book detail", "Books", true) }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_book_indexes",
            up: r#"
                CREATE INDEX IF NOT EXISTS book_title
                    ON documents (json_extract(body, '$."title"'))
                    WHERE collection = 'book';
                CREATE INDEX IF NOT EXISTS book_author
                    ON documents (json_extract(body, '$."author"'))
                    WHERE collection = 'book';
                "#,
        }]
    }
}

/// Create a new instance of the books module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(BooksModule::new())
}
