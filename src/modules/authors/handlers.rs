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

use super::models::{author_url, Author, AuthorForm, AuthorView};
use crate::modules::books::models::{Book, BookView};
use crate::utils::{
    form::{field_errors, FieldError},
    parse_id,
};

const AUTHOR_LIST_URL: &str = "/catalog/authors";

async fn author_with_books(
    store: &dyn DocumentStore,
    id: &DocumentId,
) -> StoreResult<(Option<Record<Author>>, Vec<Record<Book>>)> {
    let authors = Records::<Author>::new(store);
    let books = Records::<Book>::new(store);
    let books_query = Query::new()
        .filter(Filter::eq("author", id.to_string()))
        .sort_asc("title");

    tokio::try_join!(authors.get(id), books.find(&books_query))
}

fn render_form(
    title: &str,
    form: &AuthorForm,
    errors: Vec<FieldError>,
) -> Result<Response, AppError> {
    Ok(views::render(
        "author_form",
        context! { title, author => form, errors },
    )?
    .into_response())
}

fn render_delete(author: &Record<Author>, books: &[Record<Book>]) -> Result<Response, AppError> {
    let author_books: Vec<BookView> = books.iter().map(BookView::from).collect();
    Ok(views::render(
        "author_delete",
        context! {
            title => "Delete Author",
            author => AuthorView::from(author),
            author_books,
        },
    )?
    .into_response())
}

pub async fn author_list(State(state): State<AppState>) -> Result<Response, AppError> {
    let query = Query::new().sort_asc("family_name").sort_asc("first_name");
    let authors = Records::<Author>::new(state.store()).find(&query).await?;
    let author_list: Vec<AuthorView> = authors.iter().map(AuthorView::from).collect();

    Ok(views::render(
        "author_list",
        context! { title => "Author List", author_list },
    )?
    .into_response())
}

pub async fn author_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id).ok_or_else(|| AppError::not_found("Author not found"))?;
    let (author, books) = author_with_books(state.store(), &id).await?;
    let author = author.ok_or_else(|| AppError::not_found("Author not found"))?;
    let author_books: Vec<BookView> = books.iter().map(BookView::from).collect();

    Ok(views::render(
        "author_detail",
        context! {
            title => "Author Detail",
            author => AuthorView::from(&author),
            author_books,
        },
    )?
    .into_response())
}

pub async fn author_create_get() -> Result<Response, AppError> {
    Ok(views::render("author_form", context! { title => "Create Author" })?.into_response())
}

pub async fn author_create_post(
    State(state): State<AppState>,
    Form(form): Form<AuthorForm>,
) -> Result<Response, AppError> {
    let form = form.sanitized();
    if let Err(report) = form.validate() {
        return render_form("Create Author", &form, field_errors(&report));
    }

    let author = form
        .into_author()
        .ok_or_else(|| AppError::bad_request("Invalid author dates"))?;
    let created = Records::<Author>::new(state.store()).insert(author).await?;

    tracing::info!(author = %created.id, name = %created.doc.name(), "author created");
    Ok(Redirect::to(&author_url(&created.id)).into_response())
}

pub async fn author_update_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&id).ok_or_else(|| AppError::not_found("Author not found"))?;
    let author = Records::<Author>::new(state.store())
        .get(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Author not found"))?;

    Ok(views::render(
        "author_form",
        context! { title => "Update Author", author => AuthorView::from(&author) },
    )?
    .into_response())
}

pub async fn author_update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<AuthorForm>,
) -> Result<Response, AppError> {
    let id = parse_id(&id).ok_or_else(|| AppError::not_found("Author not found"))?;
    let form = form.sanitized();
    if let Err(report) = form.validate() {
        return render_form("Update Author", &form, field_errors(&report));
    }

    let author = form
        .into_author()
        .ok_or_else(|| AppError::bad_request("Invalid author dates"))?;
    let updated = Records::<Author>::new(state.store())
        .replace(&id, author)
        .await?
        .ok_or_else(|| AppError::not_found("Author not found"))?;

    tracing::info!(author = %updated.id, "author updated");
    Ok(Redirect::to(&author_url(&updated.id)).into_response())
}

pub async fn author_delete_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let Some(id) = parse_id(&id) else {
        return Ok(Redirect::to(AUTHOR_LIST_URL).into_response());
    };
    match author_with_books(state.store(), &id).await? {
        (Some(author), books) => render_delete(&author, &books),
        (None, _) => Ok(Redirect::to(AUTHOR_LIST_URL).into_response()),
    }
}

/// Delete an author unless books still reference them.
pub async fn author_delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let Some(id) = parse_id(&id) else {
        return Ok(Redirect::to(AUTHOR_LIST_URL).into_response());
    };
    let (author, books) = author_with_books(state.store(), &id).await?;
    let Some(author) = author else {
        return Ok(Redirect::to(AUTHOR_LIST_URL).into_response());
    };

    if !books.is_empty() {
        tracing::info!(author = %id, books = books.len(), "author delete refused");
        return render_delete(&author, &books);
    }

    Records::<Author>::new(state.store()).delete(&id).await?;
    tracing::info!(author = %id, "author deleted");
    Ok(Redirect::to(AUTHOR_LIST_URL).into_response())
}

#[cfg(test)]
mod tests {
    use crate::modules::test_support::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn list_orders_by_family_name() {
        let (app, state) = app().await;
        seed_author(&state, "Terry", "Pratchett").await;
        seed_author(&state, "Iain", "Banks").await;

        let body = body_text(send(&app, get("/catalog/authors")).await).await;
        assert!(body.find("Banks").unwrap() < body.find("Pratchett").unwrap());
    }

    #[tokio::test]
    async fn detail_shows_name_and_books() {
        let (app, state) = app().await;
        let author = seed_author(&state, "Iain", "Banks").await;
        seed_book(&state, "Excession", &author, &[]).await;

        let response = send(&app, get(&format!("/catalog/author/{author}"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Author: Iain Banks"));
        assert!(body.contains("Excession"));

        let response = send(&app, get(&format!("/catalog/author/{}", new_id()))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_with_dates_shows_lifespan() {
        let (app, _) = app().await;
        let response = send(
            &app,
            post_form(
                "/catalog/author/create",
                &[
                    ("first_name", "Iain"),
                    ("family_name", "Banks"),
                    ("date_of_birth", "1954-02-16"),
                    ("date_of_death", "2013-06-09"),
                ],
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let body = body_text(send(&app, get(&location(&response))).await).await;
        assert!(body.contains("Feb 16, 1954 - Jun 9, 2013"));
    }

    #[tokio::test]
    async fn invalid_create_echoes_input() {
        let (app, state) = app().await;
        let response = send(
            &app,
            post_form(
                "/catalog/author/create",
                &[
                    ("first_name", "Iain M."),
                    ("family_name", "Banks"),
                    ("date_of_birth", "1954-02-16"),
                    ("date_of_death", "not a date"),
                ],
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.contains("First name has non-alphanumeric characters."));
        assert!(body.contains("Invalid date of death"));
        assert!(body.contains(r#"value="1954-02-16""#));
        assert_eq!(author_count(&state).await, 0);
    }

    #[tokio::test]
    async fn update_form_prefills_input_dates() {
        let (app, state) = app().await;
        let author = seed_author(&state, "Iain", "Banks").await;

        let response = send(&app, get(&format!("/catalog/author/{author}/update"))).await;
        let body = body_text(response).await;
        assert!(body.contains("Update Author"));
        assert!(body.contains(r#"value="Banks""#));
    }

    #[tokio::test]
    async fn update_replaces_fields() {
        let (app, state) = app().await;
        let author = seed_author(&state, "Ian", "Banks").await;

        let response = send(
            &app,
            post_form(
                &format!("/catalog/author/{author}/update"),
                &[("first_name", "Iain"), ("family_name", "Banks")],
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let body = body_text(send(&app, get(&format!("/catalog/author/{author}"))).await).await;
        assert!(body.contains("Author: Iain Banks"));
    }

    #[tokio::test]
    async fn delete_is_blocked_by_books() {
        let (app, state) = app().await;
        let author = seed_author(&state, "Iain", "Banks").await;
        seed_book(&state, "Excession", &author, &[]).await;

        let response = send(
            &app,
            post_form(
                &format!("/catalog/author/{author}/delete"),
                &[("authorid", &author.to_string())],
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Delete the following books"));
        assert_eq!(author_count(&state).await, 1);
    }

    #[tokio::test]
    async fn delete_removes_author_without_books() {
        let (app, state) = app().await;
        let author = seed_author(&state, "Iain", "Banks").await;

        let response = send(
            &app,
            post_form(
                &format!("/catalog/author/{author}/delete"),
                &[("authorid", &author.to_string())],
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/catalog/authors");
        assert_eq!(author_count(&state).await, 0);

        let response = send(&app, get(&format!("/catalog/author/{author}/delete"))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
