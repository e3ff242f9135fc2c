use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use catalog_db::{DocumentId, Query, Record, Records};
use catalog_http::{error::AppError, views};
use catalog_kernel::AppState;
use garde::Validate;
use minijinja::context;
use serde::Serialize;

use super::models::{book_url, Book, BookForm, BookView};
use crate::modules::authors::models::{Author, AuthorView};
use crate::modules::genres::models::{Genre, GenreView};
use crate::utils::{
    form::{field_errors, FieldError},
    parse_id,
};

#[derive(Debug, Serialize)]
struct GenreOption {
    id: String,
    name: String,
    checked: bool,
}

fn genre_options(genres: &[Record<Genre>], selected: &[DocumentId]) -> Vec<GenreOption> {
    genres
        .iter()
        .map(|genre| GenreOption {
            id: genre.id.to_string(),
            name: genre.doc.name.clone(),
            checked: selected.contains(&genre.id),
        })
        .collect()
}

/// Authors and genres for the select list and checkboxes, fetched together.
async fn form_choices(
    state: &AppState,
) -> Result<(Vec<Record<Author>>, Vec<Record<Genre>>), AppError> {
    let authors = Records::<Author>::new(state.store());
    let genres = Records::<Genre>::new(state.store());
    let authors_query = Query::new().sort_asc("family_name").sort_asc("first_name");
    let genres_query = Query::new().sort_asc("name");

    Ok(tokio::try_join!(
        authors.find(&authors_query),
        genres.find(&genres_query)
    )?)
}

fn render_form(
    authors: &[Record<Author>],
    genres: &[Record<Genre>],
    form: Option<&BookForm>,
    errors: Vec<FieldError>,
) -> Result<Response, AppError> {
    let selected = form.map(BookForm::genre_ids).unwrap_or_default();
    let authors: Vec<AuthorView> = authors.iter().map(AuthorView::from).collect();

    Ok(views::render(
        "book_form",
        context! {
            title => "Create Book",
            authors,
            genres => genre_options(genres, &selected),
            book => form,
            errors,
        },
    )?
    .into_response())
}

/// Books in title order, each with its author's name.
pub async fn book_list(State(state): State<AppState>) -> Result<Response, AppError> {
    let books = Records::<Book>::new(state.store());
    let authors = Records::<Author>::new(state.store());
    let books_query = Query::new().sort_asc("title");
    let authors_query = Query::new();

    let (books, authors) = tokio::try_join!(
        books.find(&books_query),
        authors.find(&authors_query)
    )?;
    let names: HashMap<DocumentId, String> = authors
        .iter()
        .map(|author| (author.id, author.doc.name()))
        .collect();

    let book_list: Vec<BookView> = books
        .iter()
        .map(|book| BookView {
            author_name: names.get(&book.doc.author).cloned(),
            ..BookView::from(book)
        })
        .collect();

    Ok(views::render(
        "book_list",
        context! { title => "Book List", book_list },
    )?
    .into_response())
}

pub async fn book_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id).ok_or_else(|| AppError::not_found("Book not found"))?;
    let book = Records::<Book>::new(state.store())
        .get(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Book not found"))?;

    let authors = Records::<Author>::new(state.store());
    let genres = Records::<Genre>::new(state.store());
    let (author, genres) = tokio::try_join!(
        authors.get(&book.doc.author),
        genres.get_many(&book.doc.genre)
    )?;
    let genres: Vec<GenreView> = genres.iter().map(GenreView::from).collect();

    Ok(views::render(
        "book_detail",
        context! {
            title => "Book Detail",
            book => BookView::from(&book),
            author => author.as_ref().map(AuthorView::from),
            genres,
        },
    )?
    .into_response())
}

pub async fn book_create_get(State(state): State<AppState>) -> Result<Response, AppError> {
    let (authors, genres) = form_choices(&state).await?;
    render_form(&authors, &genres, None, Vec::new())
}

/// Create a book. `genre` may repeat, so the body is read as raw pairs.
pub async fn book_create_post(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let form = BookForm::from_pairs(pairs);
    let mut errors = match form.validate() {
        Ok(()) => Vec::new(),
        Err(report) => field_errors(&report),
    };

    let (authors, genres) = form_choices(&state).await?;

    let author_known = form
        .author
        .parse::<DocumentId>()
        .is_ok_and(|id| authors.iter().any(|author| author.id == id));
    if errors.is_empty() && !author_known {
        errors.push(FieldError::new("author", "Author not found."));
    }

    if !errors.is_empty() {
        return render_form(&authors, &genres, Some(&form), errors);
    }

    let book = form
        .into_book()
        .ok_or_else(|| AppError::bad_request("Invalid author id"))?;
    let created = Records::<Book>::new(state.store()).insert(book).await?;

    tracing::info!(book = %created.id, title = %created.doc.title, "book created");
    Ok(Redirect::to(&book_url(&created.id)).into_response())
}
