pub mod handlers;
pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{routing::get, Router};
use catalog_db::{Query, Records};
use catalog_kernel::{AppState, InitCtx, Migration, Module};
use serde_json::json;

use crate::utils::openapi::{form_submit, page};
use models::Genre;

/// Genre pages: list, detail and the create/update/delete forms
pub struct GenresModule;

impl GenresModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for GenresModule {
    fn name(&self) -> &'static str {
        "genres"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let genres = Records::<Genre>::new(ctx.store).count(&Query::new()).await?;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            genres,
            "genres module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router<AppState> {
        Router::new()
            .route("/genres", get(handlers::genre_list))
            .route(
                "/genre/create",
                get(handlers::genre_create_get).post(handlers::genre_create_post),
            )
            .route("/genre/{id}", get(handlers::genre_detail))
            .route(
                "/genre/{id}/update",
                get(handlers::genre_update_get).post(handlers::genre_update_post),
            )
            .route(
                "/genre/{id}/delete",
                get(handlers::genre_delete_get).post(handlers::genre_delete_post),
            )
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/genres": { "get": page("List genres", "Genres", false) },
                "/genre/create": {
                    "get": page("Genre create form", "Genres", false),
                    "post": form_submit("Create genre", "Genres", false)
                },
                "/genre/{id}": { "get": page("Genre detail", "Genres", true) },
                "/genre/{id}/update": {
                    "get": page("Genre update form", "Genres", true),
                    "post": form_submit("Update genre", "Genres", true)
                },
                "/genre/{id}/delete": {
                    "get": page("Genre delete confirmation", "Genres", true),
                    "post": form_submit("Delete genre", "Genres", true)
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_genre_name_index",
            up: r#"
                CREATE INDEX IF NOT EXISTS genre_name
                    ON documents (json_extract(body, '$."name"'))
                    WHERE collection = 'genre';
                "#,
        }]
    }
}

/// Create a new instance of the genres module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(GenresModule::new())
}
