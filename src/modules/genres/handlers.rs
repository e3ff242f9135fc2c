//! Genre list, detail, create, update and delete handlers.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use catalog_db::{DocumentId, DocumentStore, Filter, Query, Record, Records, StoreResult};
use catalog_http::{error::AppError, views};
use catalog_kernel::AppState;
use garde::Validate;
use minijinja::context;

use super::models::{genre_url, Genre, GenreForm, GenreView};
use crate::modules::books::models::{Book, BookView};
use crate::utils::{form::field_errors, parse_id};

const GENRE_LIST_URL: &str = "/catalog/genres";

/// Fetch a genre and the books filed under it together.
async fn genre_with_books(
    store: &dyn DocumentStore,
    id: &DocumentId,
) -> StoreResult<(Option<Record<Genre>>, Vec<Record<Book>>)> {
    let genres = Records::<Genre>::new(store);
    let books = Records::<Book>::new(store);
    let books_query = Query::new()
        .filter(Filter::contains("genre", id.to_string()))
        .sort_asc("title");

    tokio::try_join!(genres.get(id), books.find(&books_query))
}

fn book_views(books: &[Record<Book>]) -> Vec<BookView> {
    books.iter().map(BookView::from).collect()
}

/// Display list of all genres.
pub async fn genre_list(State(state): State<AppState>) -> Result<Response, AppError> {
    let genres = Records::<Genre>::new(state.store())
        .find(&Query::new().sort_asc("name"))
        .await?;
    let genre_list: Vec<GenreView> = genres.iter().map(GenreView::from).collect();

    Ok(views::render(
        "genre_list",
        context! { title => "Genre List", genre_list },
    )?
    .into_response())
}

/// Display detail page for a specific genre.
pub async fn genre_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id).ok_or_else(|| AppError::not_found("Genre not found"))?;
    let (genre, genre_books) = genre_with_books(state.store(), &id).await?;
    let genre = genre.ok_or_else(|| AppError::not_found("Genre not found"))?;

    Ok(views::render(
        "genre_detail",
        context! {
            title => "Genre Detail",
            genre => GenreView::from(&genre),
            genre_books => book_views(&genre_books),
        },
    )?
    .into_response())
}

/// Display the genre create form.
pub async fn genre_create_get() -> Result<Response, AppError> {
    Ok(views::render("genre_form", context! { title => "Create Genre" })?.into_response())
}

/// Handle genre create. An existing genre with the same name is reused.
pub async fn genre_create_post(
    State(state): State<AppState>,
    Form(form): Form<GenreForm>,
) -> Result<Response, AppError> {
    let form = form.sanitized();

    if let Err(report) = form.validate() {
        return Ok(views::render(
            "genre_form",
            context! {
                title => "Create Genre",
                genre => &form,
                errors => field_errors(&report),
            },
        )?
        .into_response());
    }

    let genres = Records::<Genre>::new(state.store());
    let same_name = Query::new().filter(Filter::eq("name", &form.name));
    if let Some(found) = genres.find_one(&same_name).await? {
        tracing::debug!(genre = %found.id, "genre already exists");
        return Ok(Redirect::to(&genre_url(&found.id)).into_response());
    }

    let created = genres.insert(form.into_genre()).await?;
    tracing::info!(genre = %created.id, name = %created.doc.name, "genre created");
    Ok(Redirect::to(&genre_url(&created.id)).into_response())
}

/// Display the genre update form.
pub async fn genre_update_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id).ok_or_else(|| AppError::not_found("Genre not found"))?;
    let genre = Records::<Genre>::new(state.store())
        .get(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Genre not found"))?;

    Ok(views::render(
        "genre_form",
        context! { title => "Update Genre", genre => GenreView::from(&genre) },
    )?
    .into_response())
}

/// Handle genre update.
pub async fn genre_update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<GenreForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&id).ok_or_else(|| AppError::not_found("Genre not found"))?;
    let form = form.sanitized();

    if let Err(report) = form.validate() {
        return Ok(views::render(
            "genre_form",
            context! {
                title => "Update Genre",
                genre => &form,
                errors => field_errors(&report),
            },
        )?
        .into_response());
    }

    let updated = Records::<Genre>::new(state.store())
        .replace(&id, form.into_genre())
        .await?
        .ok_or_else(|| AppError::not_found("Genre not found"))?;

    tracing::info!(genre = %updated.id, name = %updated.doc.name, "genre updated");
    Ok(Redirect::to(&genre_url(&updated.id)).into_response())
}

/// Display the delete confirmation page.
pub async fn genre_delete_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let Some(id) = parse_id(&id) else {
        return Ok(Redirect::to(GENRE_LIST_URL).into_response());
    };
    let (genre, genre_books) = genre_with_books(state.store(), &id).await?;
    let Some(genre) = genre else {
        return Ok(Redirect::to(GENRE_LIST_URL).into_response());
    };

    Ok(views::render(
        "genre_delete",
        context! {
            title => "Delete Genre",
            genre => GenreView::from(&genre),
            genre_books => book_views(&genre_books),
        },
    )?
    .into_response())
}

/// Handle genre delete. Refused while any book still references the genre.
pub async fn genre_delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let Some(id) = parse_id(&id) else {
        return Ok(Redirect::to(GENRE_LIST_URL).into_response());
    };
    let (genre, genre_books) = genre_with_books(state.store(), &id).await?;
    let Some(genre) = genre else {
        return Ok(Redirect::to(GENRE_LIST_URL).into_response());
    };

    if !genre_books.is_empty() {
        tracing::info!(genre = %id, books = genre_books.len(), "genre delete refused");
        return Ok(views::render(
            "genre_delete",
            context! {
                title => "Delete Genre",
                genre => GenreView::from(&genre),
                genre_books => book_views(&genre_books),
            },
        )?
        .into_response());
    }

    Records::<Genre>::new(state.store()).delete(&id).await?;
    tracing::info!(genre = %id, "genre deleted");
    Ok(Redirect::to(GENRE_LIST_URL).into_response())
}
