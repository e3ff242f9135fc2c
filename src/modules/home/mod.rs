use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use catalog_db::{Query, Records};
use catalog_http::{error::AppError, views};
use catalog_kernel::{AppState, Module};
use minijinja::context;
use serde_json::json;

use super::{authors::models::Author, books::models::Book, genres::models::Genre};
use crate::utils::openapi::page;

/// Landing page with record counts
pub struct HomeModule;

impl HomeModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for HomeModule {
    fn name(&self) -> &'static str {
        "home"
    }

    fn routes(&self) -> Router<AppState> {
        Router::new().route("/", get(index))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "": { "get": page("Catalog home with record counts", "Home", false) }
            }
        }))
    }
}

async fn index(State(state): State<AppState>) -> Result<Response, AppError> {
    let all = Query::new();
    let books = Records::<Book>::new(state.store());
    let authors = Records::<Author>::new(state.store());
    let genres = Records::<Genre>::new(state.store());

    let (book_count, author_count, genre_count) =
        tokio::try_join!(books.count(&all), authors.count(&all), genres.count(&all))?;

    Ok(views::render(
        "index",
        context! {
            title => "Local Library Home",
            book_count,
            author_count,
            genre_count,
        },
    )?
    .into_response())
}

/// Create a new instance of the home module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(HomeModule::new())
}
